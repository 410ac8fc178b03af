use crate::orm::users;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult};

/// A mini struct for holding only what information we need about a client.
#[derive(Clone, Debug, FromQueryResult)]
pub struct ClientUser {
    pub id: i32,
    pub username: String,
}

pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await
}

pub async fn get_client_user_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<ClientUser>, DbErr> {
    users::Entity::find_by_id(id)
        .into_model::<ClientUser>()
        .one(db)
        .await
}
