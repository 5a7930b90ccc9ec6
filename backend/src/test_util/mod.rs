//! Helpers shared by unit and integration tests.

use std::sync::Arc;

use crate::auth::password;
use crate::config::{Config, DatabaseConfig, ServerConfig, SessionConfig};
use crate::models::user::{NewUser, User};
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        },
        session: SessionConfig {
            secret: "test-session-secret".to_string(),
            secure_cookies: false,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        ..Default::default()
    }
}

pub fn create_test_state(config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(config).expect("Failed to build test state"))
}

/// Insert a user with a local password.
pub fn create_user(state: &AppState, username: &str, password: &str, is_admin: bool) -> User {
    state
        .users
        .create_user(NewUser {
            username: username.to_string(),
            password_hash: Some(password::hash_password(password).expect("Failed to hash password")),
            is_admin,
            ..Default::default()
        })
        .expect("Failed to create test user")
}
