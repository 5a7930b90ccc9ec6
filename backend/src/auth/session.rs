//! Session binding: which user a browser session belongs to, plus one-shot
//! flash messages and the pending Discord OAuth state.

use tower_sessions::Session;

use super::AuthError;
use crate::models::user::User;
use crate::store::UserStore;

/// Session key holding the authenticated user's id.
pub const USER_ID_KEY: &str = "user_id";
/// Session key holding pending flash messages.
pub const FLASH_KEY: &str = "flash";
/// Session key holding the CSRF state of an in-flight Discord login.
pub const OAUTH_STATE_KEY: &str = "oauth_state";

fn session_error(e: tower_sessions::session::Error) -> AuthError {
    AuthError::Session(e.to_string())
}

/// Bind the session to `user`, issuing a fresh session id.
pub async fn log_in(session: &Session, user: &User) -> Result<(), AuthError> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(USER_ID_KEY, &user.id)
        .await
        .map_err(session_error)?;
    tracing::debug!("Session bound to user {}", user.username);
    Ok(())
}

/// Destroy the session and everything in it.
pub async fn log_out(session: &Session) -> Result<(), AuthError> {
    session.flush().await.map_err(session_error)
}

/// Resolve the session to a user. Any failure, including a user id that no
/// longer exists, counts as unauthenticated.
pub async fn current_user(store: &UserStore, session: &Session) -> Option<User> {
    let user_id = match session.get::<String>(USER_ID_KEY).await {
        Ok(Some(id)) => id,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read session: {}", e);
            return None;
        }
    };

    match store.find_by_id(&user_id) {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            tracing::debug!("Session refers to unknown user {}", user_id);
            None
        }
        Err(e) => {
            tracing::error!("Failed to load session user {}: {}", user_id, e);
            None
        }
    }
}

/// Queue a message for the next rendered page.
pub async fn push_flash(session: &Session, message: &str) {
    let mut messages: Vec<String> = session
        .get(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    messages.push(message.to_string());

    if let Err(e) = session.insert(FLASH_KEY, messages).await {
        tracing::warn!("Failed to store flash message: {}", e);
    }
}

/// Drain pending flash messages.
pub async fn take_flash(session: &Session) -> Vec<String> {
    match session.remove::<Vec<String>>(FLASH_KEY).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read flash messages: {}", e);
            Vec::new()
        }
    }
}

/// Generate and remember a state value for a Discord authorization request.
pub async fn issue_oauth_state(session: &Session) -> Result<String, AuthError> {
    let state = uuid::Uuid::new_v4().simple().to_string();
    session
        .insert(OAUTH_STATE_KEY, &state)
        .await
        .map_err(session_error)?;
    Ok(state)
}

/// Consume the remembered state. It is valid for a single callback.
pub async fn take_oauth_state(session: &Session) -> Result<Option<String>, AuthError> {
    session
        .remove::<String>(OAUTH_STATE_KEY)
        .await
        .map_err(session_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn stored_user(store: &UserStore, username: &str) -> User {
        store
            .create_user(crate::models::user::NewUser {
                username: username.to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_then_resolve() {
        let store = UserStore::new(":memory:").unwrap();
        let user = stored_user(&store, "alice");
        let session = new_session();

        assert!(current_user(&store, &session).await.is_none());
        log_in(&session, &user).await.unwrap();
        let resolved = current_user(&store, &session).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_user_id_is_unauthenticated() {
        let store = UserStore::new(":memory:").unwrap();
        let session = new_session();
        session.insert(USER_ID_KEY, "ghost").await.unwrap();
        assert!(current_user(&store, &session).await.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_user() {
        let store = UserStore::new(":memory:").unwrap();
        let user = stored_user(&store, "alice");
        let session = new_session();
        log_in(&session, &user).await.unwrap();
        log_out(&session).await.unwrap();
        assert!(current_user(&store, &session).await.is_none());
    }

    #[tokio::test]
    async fn test_flash_is_one_shot() {
        let session = new_session();
        push_flash(&session, "Invalid credentials").await;
        push_flash(&session, "Try again").await;
        assert_eq!(take_flash(&session).await, vec!["Invalid credentials", "Try again"]);
        assert!(take_flash(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_oauth_state_single_use() {
        let session = new_session();
        let state = issue_oauth_state(&session).await.unwrap();
        assert_eq!(take_oauth_state(&session).await.unwrap(), Some(state));
        assert_eq!(take_oauth_state(&session).await.unwrap(), None);
    }
}
