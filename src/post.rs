use crate::db::get_db_pool;
use crate::filesystem::save_image_field;
use crate::group::get_all_groups;
use crate::middleware::ClientCtx;
use crate::orm::{comments, groups, posts, users};
use crate::url::UrlToken;
use actix_multipart::{Field, Multipart};
use actix_web::{error, get, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::prelude::Utc;
use futures::{StreamExt, TryStreamExt};
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, DbErr, FromQueryResult};
use serde::Deserialize;

/// A fully joined struct representing the post model and its relational data.
#[derive(Debug, FromQueryResult)]
pub struct PostForTemplate {
    pub id: i32,
    pub user_id: i32,
    pub group_id: Option<i32>,
    pub text: String,
    pub image: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    // join users
    pub username: String,
    // join groups
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

impl PostForTemplate {
    pub fn author_token(&self) -> UrlToken {
        UrlToken {
            slug: Some(&self.username),
            name: self.username.to_owned(),
            base_url: "profile",
            class: "author-link",
        }
    }

    pub fn group_token(&self) -> Option<UrlToken> {
        self.group_slug.as_deref().map(|slug| UrlToken {
            slug: Some(slug),
            name: self
                .group_title
                .to_owned()
                .unwrap_or_else(|| slug.to_owned()),
            base_url: "group",
            class: "group-link",
        })
    }
}

/// A comment row joined with its author's name.
#[derive(Debug, FromQueryResult)]
pub struct CommentForTemplate {
    pub id: i32,
    pub user_id: i32,
    pub text: String,
    pub created_at: chrono::NaiveDateTime,
    pub username: String,
}

/// Which posts a feed shows.
#[derive(Debug)]
pub enum PostFeed {
    All,
    ByGroup(i32),
    ByAuthor(i32),
    ByAuthors(Vec<i32>),
}

/// Returns the posts for a feed, newest first, with adjoined display data.
pub async fn get_posts_for_feed(
    db: &DatabaseConnection,
    feed: PostFeed,
) -> Result<Vec<PostForTemplate>, DbErr> {
    let query = posts::Entity::find()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "username")
        .left_join(groups::Entity)
        .column_as(groups::Column::Title, "group_title")
        .column_as(groups::Column::Slug, "group_slug")
        .order_by_desc(posts::Column::CreatedAt)
        .order_by_desc(posts::Column::Id);

    let query = match feed {
        PostFeed::All => query,
        PostFeed::ByGroup(group_id) => query.filter(posts::Column::GroupId.eq(group_id)),
        PostFeed::ByAuthor(user_id) => query.filter(posts::Column::UserId.eq(user_id)),
        PostFeed::ByAuthors(user_ids) => {
            if user_ids.is_empty() {
                return Ok(Vec::new());
            }
            query.filter(posts::Column::UserId.is_in(user_ids))
        }
    };

    query.into_model::<PostForTemplate>().all(db).await
}

/// Returns the result of a query selecting for a post by id with adjoined templating data.
pub async fn get_post_for_template(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<PostForTemplate>, DbErr> {
    posts::Entity::find_by_id(id)
        .left_join(users::Entity)
        .column_as(users::Column::Username, "username")
        .left_join(groups::Entity)
        .column_as(groups::Column::Title, "group_title")
        .column_as(groups::Column::Slug, "group_slug")
        .into_model::<PostForTemplate>()
        .one(db)
        .await
}

pub async fn get_comments_for_post(
    db: &DatabaseConnection,
    post_id: i32,
) -> Result<Vec<CommentForTemplate>, DbErr> {
    comments::Entity::find()
        .filter(comments::Column::PostId.eq(post_id))
        .left_join(users::Entity)
        .column_as(users::Column::Username, "username")
        .order_by_asc(comments::Column::CreatedAt)
        .order_by_asc(comments::Column::Id)
        .into_model::<CommentForTemplate>()
        .all(db)
        .await
}

/// Raw fields read from the multipart post form.
#[derive(Debug, Default)]
pub struct PostFormData {
    pub text: String,
    pub group: String,
    /// Media filename, already written to disk while the form was read.
    pub image: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Fields of PostFormData after validation.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i32>,
}

/// Checks submitted post fields against the store.
/// The outer Result is a store failure; the inner carries field errors.
pub async fn validate_post_form(
    db: &DatabaseConnection,
    form: &PostFormData,
) -> Result<Result<ValidPost, Vec<FieldError>>, DbErr> {
    let mut errors = Vec::new();

    let text = form.text.trim();
    if text.is_empty() {
        errors.push(FieldError {
            field: "text",
            message: "Post text cannot be empty.",
        });
    }

    let group_id = match form.group.trim() {
        "" => None,
        raw => match raw.parse::<i32>() {
            Ok(id) => match groups::Entity::find_by_id(id).one(db).await? {
                Some(group) => Some(group.id),
                None => {
                    errors.push(FieldError {
                        field: "group",
                        message: "Select a valid group.",
                    });
                    None
                }
            },
            Err(_) => {
                errors.push(FieldError {
                    field: "group",
                    message: "Select a valid group.",
                });
                None
            }
        },
    };

    if errors.is_empty() {
        Ok(Ok(ValidPost {
            text: text.to_owned(),
            group_id,
        }))
    } else {
        Ok(Err(errors))
    }
}

async fn read_text_field(field: &mut Field) -> Result<String, Error> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("read_text_field: multipart read error: {}", e);
            error::ErrorInternalServerError("error reading form data")
        })?;
        buf.extend(bytes);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Drains the multipart stream into PostFormData.
/// An attached image is stored as a side effect of reading its part.
pub async fn read_post_form(mut payload: Multipart) -> Result<PostFormData, Error> {
    let mut form = PostFormData::default();
    while let Ok(Some(mut field)) = payload.try_next().await {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or("")
            .to_owned();
        match name.as_str() {
            "text" => form.text = read_text_field(&mut field).await?,
            "group" => form.group = read_text_field(&mut field).await?,
            "image" => form.image = save_image_field(&mut field).await?,
            _ => {}
        }
    }
    Ok(form)
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub client: ClientCtx,
    pub post: PostForTemplate,
    pub comments: Vec<CommentForTemplate>,
    pub following: bool,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "create_post.html")]
pub struct PostFormTemplate {
    pub client: ClientCtx,
    pub groups: Vec<groups::Model>,
    pub action: String,
    pub text: String,
    pub group: String,
    pub errors: Vec<FieldError>,
    pub is_edit: bool,
}

#[derive(Deserialize)]
pub struct NewCommentFormData {
    pub text: String,
}

#[get("/posts/{post_id}/")]
pub async fn view_post(client: ClientCtx, path: web::Path<i32>) -> Result<impl Responder, Error> {
    let db = get_db_pool();

    let post = get_post_for_template(db, path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;

    let comments = get_comments_for_post(db, post.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let following = match client.get_id() {
        Some(user_id) if user_id != post.user_id => {
            crate::follow::is_following(db, user_id, post.user_id)
                .await
                .map_err(error::ErrorInternalServerError)?
        }
        _ => false,
    };

    let can_edit = client.can_update_post(&post);
    Ok(PostDetailTemplate {
        client,
        post,
        comments,
        following,
        can_edit,
    }
    .to_response())
}

pub async fn view_post_form(client: ClientCtx) -> Result<HttpResponse, Error> {
    let groups = get_all_groups(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PostFormTemplate {
        client,
        groups,
        action: "/create/".to_owned(),
        text: String::new(),
        group: String::new(),
        errors: Vec::new(),
        is_edit: false,
    }
    .to_response())
}

pub async fn create_post(client: ClientCtx, payload: Multipart) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let user_id = client
        .get_id()
        .ok_or_else(|| error::ErrorUnauthorized("You must be logged in to do that."))?;

    let form = read_post_form(payload).await?;
    match validate_post_form(db, &form)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        Ok(valid) => {
            posts::Entity::insert(posts::ActiveModel {
                user_id: Set(user_id),
                group_id: Set(valid.group_id),
                text: Set(valid.text),
                image: Set(form.image.to_owned()),
                created_at: Set(Utc::now().naive_utc()),
                ..Default::default()
            })
            .exec(db)
            .await
            .map_err(error::ErrorInternalServerError)?;

            Ok(HttpResponse::Found()
                .append_header(("Location", format!("/profile/{}/", client.get_name())))
                .finish())
        }
        Err(errors) => {
            let groups = get_all_groups(db)
                .await
                .map_err(error::ErrorInternalServerError)?;
            Ok(PostFormTemplate {
                client,
                groups,
                action: "/create/".to_owned(),
                text: form.text,
                group: form.group,
                errors,
                is_edit: false,
            }
            .to_response())
        }
    }
}

pub async fn edit_post(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let post = get_post_for_template(db, path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;

    // Only the author may edit; everyone else bounces to the post.
    if !client.can_update_post(&post) {
        return Ok(HttpResponse::Found()
            .append_header(("Location", format!("/posts/{}/", post.id)))
            .finish());
    }

    let groups = get_all_groups(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PostFormTemplate {
        client,
        groups,
        action: format!("/posts/{}/edit/", post.id),
        text: post.text.to_owned(),
        group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        errors: Vec::new(),
        is_edit: true,
    }
    .to_response())
}

pub async fn update_post(
    client: ClientCtx,
    path: web::Path<i32>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let post = get_post_for_template(db, path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;

    if !client.can_update_post(&post) {
        return Ok(HttpResponse::Found()
            .append_header(("Location", format!("/posts/{}/", post.id)))
            .finish());
    }

    let form = read_post_form(payload).await?;
    match validate_post_form(db, &form)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        Ok(valid) => {
            // Author, id and creation time are never touched here.
            let mut update = posts::Entity::update_many()
                .col_expr(posts::Column::Text, Expr::value(valid.text))
                .col_expr(posts::Column::GroupId, Expr::value(valid.group_id));
            if let Some(image) = form.image.to_owned() {
                update = update.col_expr(posts::Column::Image, Expr::value(image));
            }
            update
                .filter(posts::Column::Id.eq(post.id))
                .exec(db)
                .await
                .map_err(error::ErrorInternalServerError)?;

            Ok(HttpResponse::Found()
                .append_header(("Location", format!("/posts/{}/", post.id)))
                .finish())
        }
        Err(errors) => {
            let groups = get_all_groups(db)
                .await
                .map_err(error::ErrorInternalServerError)?;
            Ok(PostFormTemplate {
                client,
                groups,
                action: format!("/posts/{}/edit/", post.id),
                text: form.text,
                group: form.group,
                errors,
                is_edit: true,
            }
            .to_response())
        }
    }
}

pub async fn create_comment(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Form<NewCommentFormData>,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let user_id = client
        .get_id()
        .ok_or_else(|| error::ErrorUnauthorized("You must be logged in to do that."))?;

    let post = posts::Entity::find_by_id(path.into_inner())
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;

    // A blank comment creates nothing; either way we land back on the post.
    let text = form.text.trim();
    if !text.is_empty() {
        comments::Entity::insert(comments::ActiveModel {
            post_id: Set(post.id),
            user_id: Set(user_id),
            text: Set(text.to_owned()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        })
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;
    }

    Ok(HttpResponse::Found()
        .append_header(("Location", format!("/posts/{}/", post.id)))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_group() -> groups::Model {
        groups::Model {
            id: 3,
            title: "Test group".to_owned(),
            slug: "test-slug".to_owned(),
            description: "A group for tests".to_owned(),
        }
    }

    #[actix_rt::test]
    async fn blank_text_is_a_field_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let form = PostFormData {
            text: "   ".to_owned(),
            group: String::new(),
            image: None,
        };

        let outcome = validate_post_form(&db, &form).await.unwrap();
        let errors = outcome.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "text");
    }

    #[actix_rt::test]
    async fn unknown_group_is_a_field_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<groups::Model>::new()])
            .into_connection();
        let form = PostFormData {
            text: "hello".to_owned(),
            group: "44".to_owned(),
            image: None,
        };

        let outcome = validate_post_form(&db, &form).await.unwrap();
        let errors = outcome.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "group");
    }

    #[actix_rt::test]
    async fn garbage_group_id_is_a_field_error_without_a_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let form = PostFormData {
            text: "hello".to_owned(),
            group: "not-a-number".to_owned(),
            image: None,
        };

        let outcome = validate_post_form(&db, &form).await.unwrap();
        assert!(outcome.is_err());
        // No select was issued for an unparseable id.
        assert!(db.into_transaction_log().is_empty());
    }

    #[actix_rt::test]
    async fn valid_form_resolves_the_group_and_trims_text() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![test_group()]])
            .into_connection();
        let form = PostFormData {
            text: "  hello world  ".to_owned(),
            group: "3".to_owned(),
            image: None,
        };

        let valid = validate_post_form(&db, &form).await.unwrap().unwrap();
        assert_eq!(
            valid,
            ValidPost {
                text: "hello world".to_owned(),
                group_id: Some(3),
            }
        );
    }

    #[actix_rt::test]
    async fn empty_group_choice_is_no_group() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let form = PostFormData {
            text: "hello".to_owned(),
            group: "".to_owned(),
            image: None,
        };

        let valid = validate_post_form(&db, &form).await.unwrap().unwrap();
        assert_eq!(valid.group_id, None);
    }

    #[actix_rt::test]
    async fn empty_author_set_returns_no_posts_without_a_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let posts = get_posts_for_feed(&db, PostFeed::ByAuthors(Vec::new()))
            .await
            .unwrap();
        assert!(posts.is_empty());
        assert!(db.into_transaction_log().is_empty());
    }
}
