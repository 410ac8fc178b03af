pub mod create_user;
pub mod db;
pub mod filesystem;
pub mod follow;
pub mod global;
pub mod group;
pub mod index;
pub mod login;
pub mod logout;
pub mod middleware;
pub mod orm;
pub mod pagination;
pub mod post;
pub mod profile;
pub mod session;
pub mod url;
pub mod user;
pub mod web;

pub use db::{get_db_pool, init_db};
