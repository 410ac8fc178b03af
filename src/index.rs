use crate::db::get_db_pool;
use crate::global::get_posts_per_page;
use crate::middleware::ClientCtx;
use crate::pagination::{paginate, Page, PageQuery};
use crate::post::{get_posts_for_feed, PostFeed, PostForTemplate};
use actix_web::{error, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub page: Page<PostForTemplate>,
}

/// The all-posts home feed. Responses are recycled for a short window by
/// the PageCache wrapper in web::configure.
pub async fn view_index(
    client: ClientCtx,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let posts = get_posts_for_feed(get_db_pool(), PostFeed::All)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let page = paginate(posts, get_posts_per_page(), query.page.as_deref(), "/");

    Ok(IndexTemplate { client, page }.to_response())
}
