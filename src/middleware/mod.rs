mod client_ctx;
mod page_cache;
mod require_user;

pub use client_ctx::ClientCtx;
pub use page_cache::PageCache;
pub use require_user::RequireUser;

// Documentation for middleware can be found here:
// https://github.com/actix/actix-web/blob/master/src/middleware/normalize.rs
