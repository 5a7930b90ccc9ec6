//! Login, logout and the dashboard page.

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::{self, session, require_auth, AuthError, CurrentUser};
use crate::views::{DashboardPage, LoginPage, ViewError};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn index() -> Redirect {
    Redirect::to("/dashboard")
}

async fn login_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, ViewError> {
    let page = LoginPage {
        flash: session::take_flash(&session).await,
        discord_enabled: state.discord_client.is_configured(),
    };
    state.views.render("login.html", &state.config, &page)
}

async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Redirect {
    match auth::authenticate_local(&state.users, &form.username, &form.password).await {
        Ok(user) => match session::log_in(&session, &user).await {
            Ok(()) => {
                tracing::info!("User {} logged in", user.username);
                Redirect::to("/dashboard")
            }
            Err(e) => {
                tracing::error!("Failed to bind session for {}: {}", user.username, e);
                session::push_flash(&session, "Login failed").await;
                Redirect::to("/login")
            }
        },
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Rejected login for {:?}", form.username);
            session::push_flash(&session, "Invalid credentials").await;
            Redirect::to("/login")
        }
        Err(e) => {
            tracing::error!("Login for {:?} failed: {}", form.username, e);
            session::push_flash(&session, "Login failed").await;
            Redirect::to("/login")
        }
    }
}

async fn logout(session: Session) -> Redirect {
    if let Err(e) = session::log_out(&session).await {
        tracing::warn!("Failed to destroy session: {}", e);
    }
    Redirect::to("/login")
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    state
        .views
        .render("dashboard.html", &state.config, &DashboardPage { user: &user })
        .into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .merge(protected)
        .with_state(state)
}
