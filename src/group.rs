use crate::db::get_db_pool;
use crate::global::get_posts_per_page;
use crate::middleware::ClientCtx;
use crate::orm::groups;
use crate::pagination::{paginate, Page, PageQuery};
use crate::post::{get_posts_for_feed, PostFeed, PostForTemplate};
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupTemplate {
    pub client: ClientCtx,
    pub group: groups::Model,
    pub page: Page<PostForTemplate>,
}

pub async fn get_group_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<groups::Model>, DbErr> {
    groups::Entity::find()
        .filter(groups::Column::Slug.eq(slug))
        .one(db)
        .await
}

/// Every group, for the post form's choice list.
pub async fn get_all_groups(db: &DatabaseConnection) -> Result<Vec<groups::Model>, DbErr> {
    groups::Entity::find()
        .order_by_asc(groups::Column::Title)
        .all(db)
        .await
}

#[get("/group/{slug}/")]
pub async fn view_group(
    client: ClientCtx,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let db = get_db_pool();

    let group = get_group_by_slug(db, &path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Group not found."))?;

    let posts = get_posts_for_feed(db, PostFeed::ByGroup(group.id))
        .await
        .map_err(error::ErrorInternalServerError)?;
    let base_url = format!("/group/{}/", group.slug);
    let page = paginate(posts, get_posts_per_page(), query.page.as_deref(), &base_url);

    Ok(GroupTemplate {
        client,
        group,
        page,
    }
    .to_response())
}
