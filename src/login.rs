use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::session::remember_client;
use crate::user::get_user_by_username;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
    pub next: Option<String>,
    pub error: Option<&'static str>,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginFormData {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Checks a password against the stored argon2 PHC string.
pub fn verify_password(stored: &str, given: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(given.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash did not parse: {}", e);
            false
        }
    }
}

/// Only same-site relative paths may be used as a post-login destination.
pub fn sanitize_next(next: &str) -> Option<&str> {
    if next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\") {
        Some(next)
    } else {
        None
    }
}

#[get("/auth/login/")]
pub async fn view_login(client: ClientCtx, query: web::Query<LoginQuery>) -> impl Responder {
    LoginTemplate {
        client,
        next: query.into_inner().next,
        error: None,
    }
    .to_response()
}

#[post("/auth/login/")]
pub async fn post_login(
    client: ClientCtx,
    session: Session,
    form: web::Form<LoginFormData>,
) -> Result<HttpResponse, Error> {
    let user = get_user_by_username(get_db_pool(), form.username.trim())
        .await
        .map_err(error::ErrorInternalServerError)?;

    let user = match user {
        Some(user) if verify_password(&user.password, &form.password) => user,
        _ => {
            return Ok(LoginTemplate {
                client,
                next: form.next.to_owned(),
                error: Some("Unknown username or bad password."),
            }
            .to_response())
        }
    };

    if !remember_client(&session, user.id) {
        return Err(error::ErrorInternalServerError("Could not start a session."));
    }

    let location = form
        .next
        .as_deref()
        .and_then(sanitize_next)
        .unwrap_or("/")
        .to_owned();
    Ok(HttpResponse::Found()
        .append_header(("Location", location))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::PasswordHasher;

    #[test]
    fn next_param_allows_only_relative_paths() {
        assert_eq!(sanitize_next("/create/"), Some("/create/"));
        assert_eq!(sanitize_next("/posts/3/edit/"), Some("/posts/3/edit/"));
        assert_eq!(sanitize_next("https://example.com/"), None);
        assert_eq!(sanitize_next("//example.com/"), None);
        assert_eq!(sanitize_next("/\\example.com/"), None);
        assert_eq!(sanitize_next(""), None);
    }

    #[test]
    fn password_verification_round_trips() {
        let hash = Argon2::default()
            .hash_password(b"hunter2", &SaltString::generate(&mut OsRng))
            .unwrap()
            .to_string();
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
        assert!(!verify_password("not-a-phc-string", "hunter2"));
    }
}
