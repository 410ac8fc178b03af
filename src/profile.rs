use crate::db::get_db_pool;
use crate::follow::is_following;
use crate::global::get_posts_per_page;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::pagination::{paginate, Page, PageQuery};
use crate::post::{get_posts_for_feed, PostFeed, PostForTemplate};
use crate::user::get_user_by_username;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub client: ClientCtx,
    pub author: users::Model,
    pub page: Page<PostForTemplate>,
    /// Whether the requesting client follows this author.
    pub following: bool,
}

#[get("/profile/{username}/")]
pub async fn view_profile(
    client: ClientCtx,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let db = get_db_pool();

    let author = get_user_by_username(db, &path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    let following = match client.get_id() {
        Some(user_id) if user_id != author.id => is_following(db, user_id, author.id)
            .await
            .map_err(error::ErrorInternalServerError)?,
        _ => false,
    };

    let posts = get_posts_for_feed(db, PostFeed::ByAuthor(author.id))
        .await
        .map_err(error::ErrorInternalServerError)?;
    let base_url = format!("/profile/{}/", author.username);
    let page = paginate(posts, get_posts_per_page(), query.page.as_deref(), &base_url);

    Ok(ProfileTemplate {
        client,
        author,
        page,
        following,
    }
    .to_response())
}
