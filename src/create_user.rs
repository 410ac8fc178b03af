use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::post::FieldError;
use crate::session::remember_client;
use crate::user::get_user_by_username;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::{entity::*, DatabaseConnection, DbErr, InsertResult};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub client: ClientCtx,
    pub errors: Vec<FieldError>,
}

#[derive(Deserialize)]
pub struct SignupFormData {
    pub username: String,
    pub password: String,
}

async fn insert_new_user(
    db: &DatabaseConnection,
    username: &str,
    password_hash: &str,
) -> Result<InsertResult<users::ActiveModel>, DbErr> {
    users::Entity::insert(users::ActiveModel {
        username: Set(username.to_owned()),
        password: Set(password_hash.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    })
    .exec(db)
    .await
}

#[get("/auth/signup/")]
pub async fn view_signup(client: ClientCtx) -> impl Responder {
    SignupTemplate {
        client,
        errors: Vec::new(),
    }
    .to_response()
}

#[post("/auth/signup/")]
pub async fn post_signup(
    client: ClientCtx,
    session: Session,
    form: web::Form<SignupFormData>,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let username = form.username.trim().to_owned();

    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push(FieldError {
            field: "username",
            message: "Username cannot be empty.",
        });
    } else if get_user_by_username(db, &username)
        .await
        .map_err(error::ErrorInternalServerError)?
        .is_some()
    {
        errors.push(FieldError {
            field: "username",
            message: "That username is taken.",
        });
    }
    if form.password.is_empty() {
        errors.push(FieldError {
            field: "password",
            message: "Password cannot be empty.",
        });
    }
    if !errors.is_empty() {
        return Ok(SignupTemplate { client, errors }.to_response());
    }

    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map_err(|e| {
            log::error!("post_signup: hash_password: {}", e);
            error::ErrorInternalServerError("Could not create the account.")
        })?
        .to_string();

    let result = insert_new_user(db, &username, &password_hash)
        .await
        .map_err(error::ErrorInternalServerError)?;
    remember_client(&session, result.last_insert_id);

    Ok(HttpResponse::Found()
        .append_header(("Location", "/"))
        .finish())
}
