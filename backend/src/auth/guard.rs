//! Route guards. `require_auth` must wrap `require_admin`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::session;
use crate::models::user::User;
use crate::AppState;

/// The authenticated user, attached to request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware that requires a session bound to an existing user.
/// Anything else is redirected to the login page.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match session::current_user(&state.users, &session).await {
        Some(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        None => {
            tracing::debug!("Unauthenticated request to {}", request.uri().path());
            Redirect::to("/login").into_response()
        }
    }
}

/// Middleware that requires the attached user to be an admin.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(user)| user.is_admin())
        .unwrap_or(false);

    if !is_admin {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    next.run(request).await
}
