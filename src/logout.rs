use actix_session::Session;
use actix_web::{get, HttpResponse, Responder};

#[get("/auth/logout/")]
pub async fn view_logout(session: Session) -> impl Responder {
    session.purge();
    HttpResponse::Found()
        .append_header(("Location", "/"))
        .finish()
}
