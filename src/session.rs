use crate::db::get_db_pool;
use crate::user::{get_client_user_by_id, ClientUser};
use actix_session::Session;

pub const SESSION_USER_KEY: &str = "uid";

/// Resolves the session cookie to a known user.
/// Anonymous and unreadable sessions both come back as None.
pub async fn authenticate_client_by_session(session: &Session) -> Option<ClientUser> {
    let uid = match session.get::<i32>(SESSION_USER_KEY) {
        Ok(Some(uid)) => uid,
        Ok(None) => return None,
        Err(e) => {
            log::error!("authenticate_client_by_session: session.get(): {}", e);
            return None;
        }
    };

    match get_client_user_by_id(get_db_pool(), uid).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}

/// Stores the user id in the session cookie.
pub fn remember_client(session: &Session, user_id: i32) -> bool {
    match session.insert(SESSION_USER_KEY, user_id) {
        Ok(()) => true,
        Err(e) => {
            log::error!("remember_client: session.insert(): {}", e);
            false
        }
    }
}
