pub mod error;

use crate::global::get_feed_cache_time;
use crate::middleware::{PageCache, RequireUser};
use actix_web::web;

/// Configures the web app
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(
        web::resource("/")
            .wrap(PageCache::new(get_feed_cache_time()))
            .route(web::get().to(crate::index::view_index)),
    )
    .service(crate::group::view_group)
    .service(crate::post::view_post)
    .service(crate::profile::view_profile)
    .service(crate::login::view_login)
    .service(crate::login::post_login)
    .service(crate::logout::view_logout)
    .service(crate::create_user::view_signup)
    .service(crate::create_user::post_signup)
    .service(
        web::resource("/create/")
            .wrap(RequireUser)
            .route(web::get().to(crate::post::view_post_form))
            .route(web::post().to(crate::post::create_post)),
    )
    .service(
        web::resource("/posts/{post_id}/edit/")
            .wrap(RequireUser)
            .route(web::get().to(crate::post::edit_post))
            .route(web::post().to(crate::post::update_post)),
    )
    .service(
        web::resource("/posts/{post_id}/comment/")
            .wrap(RequireUser)
            .route(web::post().to(crate::post::create_comment)),
    )
    .service(
        web::resource("/follow/")
            .wrap(RequireUser)
            .route(web::get().to(crate::follow::view_follow_feed)),
    )
    .service(
        web::resource("/profile/{username}/follow/")
            .wrap(RequireUser)
            .route(web::get().to(crate::follow::follow_author)),
    )
    .service(
        web::resource("/profile/{username}/unfollow/")
            .wrap(RequireUser)
            .route(web::get().to(crate::follow::unfollow_author)),
    )
    .service(actix_files::Files::new("/media", crate::filesystem::get_media_dir()));
}
