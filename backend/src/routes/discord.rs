//! Discord OAuth2 login: `/auth/discord` and its callback.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::{self, session, AuthError, DiscordError};
use crate::models::user::User;
use crate::AppState;

/// Query parameters Discord appends when redirecting back.
#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn start(State(state): State<Arc<AppState>>, session: Session) -> Redirect {
    let url = match session::issue_oauth_state(&session).await {
        Ok(oauth_state) => state
            .discord_client
            .authorize_url(&oauth_state)
            .map_err(AuthError::from),
        Err(e) => Err(e),
    };

    match url {
        Ok(url) => Redirect::to(&url),
        Err(e) => {
            tracing::warn!("Cannot start Discord login: {}", e);
            session::push_flash(&session, "Discord login is not available").await;
            Redirect::to("/login")
        }
    }
}

async fn callback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match complete_login(&state, &session, params).await {
        Ok(user) => {
            tracing::info!("User {} logged in with Discord", user.username);
            Redirect::to("/dashboard")
        }
        Err(e) => {
            tracing::warn!("Discord login failed: {}", e);
            session::push_flash(&session, "Discord login failed").await;
            Redirect::to("/login")
        }
    }
}

async fn complete_login(
    state: &AppState,
    session: &Session,
    params: CallbackParams,
) -> Result<User, AuthError> {
    // Consumed before anything else so a state value is never accepted twice
    let expected = session::take_oauth_state(session).await?;

    if let Some(error) = params.error {
        return Err(DiscordError::Rejected(error).into());
    }

    match (expected, params.state) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => return Err(AuthError::StateMismatch),
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| DiscordError::InvalidResponse("missing authorization code".to_string()))?;

    let access_token = state.discord_client.exchange_code(&code).await?;
    let profile = state.discord_client.fetch_profile(&access_token).await?;
    let user = auth::login_with_discord(&state.users, &profile)?;
    session::log_in(session, &user).await?;

    Ok(user)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/discord", get(start))
        .route("/auth/discord/callback", get(callback))
        .with_state(state)
}
