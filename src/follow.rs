use crate::db::get_db_pool;
use crate::global::get_posts_per_page;
use crate::middleware::ClientCtx;
use crate::orm::follows;
use crate::pagination::{paginate, Page, PageQuery};
use crate::post::{get_posts_for_feed, PostFeed, PostForTemplate};
use crate::user::get_user_by_username;
use actix_web::http::header;
use actix_web::{error, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use chrono::prelude::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowFeedTemplate {
    pub client: ClientCtx,
    pub page: Page<PostForTemplate>,
}

pub async fn get_followed_author_ids(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<i32>, DbErr> {
    Ok(follows::Entity::find()
        .filter(follows::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|edge| edge.author_id)
        .collect())
}

pub async fn is_following(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    Ok(follows::Entity::find()
        .filter(
            Condition::all()
                .add(follows::Column::UserId.eq(user_id))
                .add(follows::Column::AuthorId.eq(author_id)),
        )
        .one(db)
        .await?
        .is_some())
}

/// Creates the (user, author) edge if it does not exist yet.
/// Re-following and self-following are both no-ops.
pub async fn create_follow(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<(), DbErr> {
    if user_id == author_id {
        return Ok(());
    }
    if is_following(db, user_id, author_id).await? {
        return Ok(());
    }

    follows::Entity::insert(follows::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    })
    .exec(db)
    .await?;
    Ok(())
}

/// Removes the (user, author) edge. A missing edge is a no-op.
pub async fn delete_follow(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<(), DbErr> {
    follows::Entity::delete_many()
        .filter(
            Condition::all()
                .add(follows::Column::UserId.eq(user_id))
                .add(follows::Column::AuthorId.eq(author_id)),
        )
        .exec(db)
        .await?;
    Ok(())
}

fn redirect_back(request: &HttpRequest, fallback: &str) -> HttpResponse {
    let location = request
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback);
    HttpResponse::Found()
        .append_header((header::LOCATION, location.to_owned()))
        .finish()
}

/// Posts by every author the client follows.
pub async fn view_follow_feed(
    client: ClientCtx,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let user_id = client
        .get_id()
        .ok_or_else(|| error::ErrorUnauthorized("You must be logged in to do that."))?;

    let authors = get_followed_author_ids(db, user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let posts = get_posts_for_feed(db, PostFeed::ByAuthors(authors))
        .await
        .map_err(error::ErrorInternalServerError)?;
    let page = paginate(posts, get_posts_per_page(), query.page.as_deref(), "/follow/");

    Ok(FollowFeedTemplate { client, page }.to_response())
}

pub async fn follow_author(
    client: ClientCtx,
    path: web::Path<String>,
    request: HttpRequest,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let user_id = client
        .get_id()
        .ok_or_else(|| error::ErrorUnauthorized("You must be logged in to do that."))?;

    let author = get_user_by_username(db, &path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    let profile_url = format!("/profile/{}/", author.username);
    if user_id == author.id {
        // Following yourself changes nothing.
        return Ok(redirect_back(&request, &profile_url));
    }

    create_follow(db, user_id, author.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, profile_url))
        .finish())
}

pub async fn unfollow_author(
    client: ClientCtx,
    path: web::Path<String>,
    request: HttpRequest,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let user_id = client
        .get_id()
        .ok_or_else(|| error::ErrorUnauthorized("You must be logged in to do that."))?;

    let author = get_user_by_username(db, &path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    delete_follow(db, user_id, author.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(redirect_back(&request, &format!("/profile/{}/", author.username)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn edge() -> follows::Model {
        follows::Model {
            id: 1,
            user_id: 10,
            author_id: 20,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[actix_rt::test]
    async fn follow_is_idempotent_when_the_edge_exists() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![edge()]])
            .into_connection();

        create_follow(&db, 10, 20).await.unwrap();

        // Only the existence check ran; no insert was issued.
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[actix_rt::test]
    async fn follow_inserts_when_the_edge_is_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<follows::Model>::new(), vec![edge()]])
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .into_connection();

        create_follow(&db, 10, 20).await.unwrap();

        // Existence check plus the insert itself.
        assert_eq!(db.into_transaction_log().len(), 2);
    }

    #[actix_rt::test]
    async fn self_follow_never_touches_the_store() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        create_follow(&db, 10, 10).await.unwrap();

        assert!(db.into_transaction_log().is_empty());
    }

    #[actix_rt::test]
    async fn unfollow_without_an_edge_is_a_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        delete_follow(&db, 10, 20).await.unwrap();
    }
}
