pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod panel;
pub mod realtime;
pub mod routes;
pub mod store;
pub mod test_util;
pub mod views;

pub use auth::{DiscordClient, CurrentUser};
pub use config::Config;
pub use error::AppError;
pub use models::user::{NewUser, User};
pub use panel::PanelClient;
pub use store::UserStore;
pub use views::Views;

use std::sync::Arc;

use axum::Router;
use sha2::{Digest, Sha512};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::store::StoreError;
use crate::views::ViewError;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: UserStore,
    pub panel_client: PanelClient,
    pub discord_client: DiscordClient,
    pub views: Views,
    /// Session records. Shared by every router built from this state.
    pub sessions: MemoryStore,
}

/// Failures while assembling [`AppState`].
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Views(#[from] ViewError),
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let users = UserStore::new(&config.database.url)?;
        let panel_client = PanelClient::new(&config.panel);
        let discord_client = DiscordClient::new(&config.discord);
        let views = Views::new()?;

        if !discord_client.is_configured() {
            tracing::info!("Discord login disabled (no client id configured)");
        }

        Ok(Self {
            config,
            users,
            panel_client,
            discord_client,
            views,
            sessions: MemoryStore::default(),
        })
    }
}

/// Build the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    let session_layer = SessionManagerLayer::new(state.sessions.clone())
        .with_secure(state.config.session.secure_cookies)
        // Lax so the cookie survives the redirect back from Discord
        .with_same_site(SameSite::Lax)
        .with_signed(session_key(&state.config.session.secret));

    Router::new()
        .merge(routes::health::router())
        .merge(routes::pages::router(state.clone()))
        .merge(routes::discord::router(state.clone()))
        .merge(routes::admin::router(state.clone()))
        .merge(routes::servers::router(state.clone()))
        .merge(realtime::router())
        .fallback_service(ServeDir::new(&state.config.server.static_dir))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

/// Cookie signing key derived from the configured secret of any length.
fn session_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_is_stable() {
        let a = session_key("craze-session");
        let b = session_key("craze-session");
        let c = session_key("other");
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }

    #[test]
    fn test_short_secret_still_yields_key() {
        assert_eq!(session_key("x").master().len(), 64);
    }
}
