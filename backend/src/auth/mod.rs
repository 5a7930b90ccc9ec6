//! Authentication: local credentials, Discord OAuth, session binding and
//! the route guards built on them.

pub mod discord;
pub mod guard;
pub mod password;
pub mod session;

pub use discord::{DiscordClient, DiscordError, DiscordProfile};
pub use guard::{require_admin, require_auth, CurrentUser};

use rand::Rng;

use crate::config::AdminConfig;
use crate::models::user::{NewUser, User};
use crate::store::{StoreError, UserStore};

/// Upper bound (exclusive) of the credit balance given to new Discord users.
pub const MAX_INITIAL_CREDITS: i64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("OAuth state mismatch")]
    StateMismatch,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Session error: {0}")]
    Session(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Discord(#[from] DiscordError),
}

/// Check a username/password pair against the store.
///
/// Unknown users, accounts without a local password and wrong passwords all
/// fail with [`AuthError::InvalidCredentials`]. The hash comparison runs on the blocking pool.
pub async fn authenticate_local(
    store: &UserStore,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = store
        .find_by_username(username)?
        .ok_or(AuthError::InvalidCredentials)?;

    let hash = user
        .password_hash
        .clone()
        .ok_or(AuthError::InvalidCredentials)?;

    if !password::verify_password_blocking(password.to_string(), hash).await? {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

/// Resolve a Discord profile to a user, creating a non-admin account with a
/// random credit balance on first login.
pub fn login_with_discord(store: &UserStore, profile: &DiscordProfile) -> Result<User, AuthError> {
    let (user, created) =
        store.find_or_create_discord_user(&profile.id, &profile.username, initial_credits())?;

    if created {
        tracing::info!(
            "New Discord user {} ({}) with {} credits",
            user.username,
            profile.id,
            user.discord_credits
        );
    }

    Ok(user)
}

/// Create the configured admin account if it does not exist yet.
///
/// Returns the created user, or `None` when nothing was configured or the
/// username is already taken.
pub fn ensure_admin(store: &UserStore, admin: &AdminConfig) -> Result<Option<User>, AuthError> {
    let (Some(username), Some(password)) = (admin.username.as_deref(), admin.password.as_deref())
    else {
        return Ok(None);
    };

    if username.is_empty() || password.is_empty() {
        return Ok(None);
    }

    if store.find_by_username(username)?.is_some() {
        tracing::debug!("Admin account {} already present", username);
        return Ok(None);
    }

    let user = store.create_user(NewUser {
        username: username.to_string(),
        password_hash: Some(password::hash_password(password)?),
        is_admin: true,
        ..Default::default()
    })?;

    Ok(Some(user))
}

/// Random starting balance in `[0, MAX_INITIAL_CREDITS)`.
pub fn initial_credits() -> i64 {
    rand::thread_rng().gen_range(0..MAX_INITIAL_CREDITS)
}
