//! Admin routes: the user listing page and the create-user endpoint.
//!
//! Both sit behind `require_auth` then `require_admin`.

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::{password, require_admin, require_auth, CurrentUser};
use crate::error::{AppError, Result};
use crate::models::user::NewUser;
use crate::routes::extract::JsonOrForm;
use crate::store::StoreError;
use crate::views::AdminPage;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    /// `true`/`false` from scripts, `"on"` from a checkbox.
    #[serde(default)]
    is_admin: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedUser {
    username: String,
    is_admin: bool,
}

#[derive(Debug, Serialize)]
struct CreateUserResponse {
    success: bool,
    user: CreatedUser,
}

/// Interpret a checkbox-ish value. Anything but `true` or `"on"` is false.
fn checkbox_flag(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s == "on",
        _ => false,
    }
}

async fn admin_page(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let users = match state.users.list_users() {
        Ok(users) => users,
        Err(e) => {
            tracing::error!("Failed to list users: {}", e);
            return Redirect::to("/dashboard").into_response();
        }
    };

    state
        .views
        .render(
            "admin.html",
            &state.config,
            &AdminPage {
                user: &user,
                users: &users,
            },
        )
        .into_response()
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    JsonOrForm(request): JsonOrForm<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>> {
    let (Some(username), Some(plain_password)) = (
        request.username.filter(|u| !u.is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest("Missing fields".to_string()));
    };

    let is_admin = checkbox_flag(&request.is_admin);
    let password_hash = password::hash_password_blocking(plain_password).await?;

    let user = state
        .users
        .create_user(NewUser {
            username,
            password_hash: Some(password_hash),
            is_admin,
            ..Default::default()
        })
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Conflict("User already exists".to_string()),
            other => other.into(),
        })?;

    tracing::info!("Admin {} created user {}", admin.username, user.username);

    Ok(Json(CreateUserResponse {
        success: true,
        user: CreatedUser {
            username: user.username,
            is_admin: user.is_admin,
        },
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admin", get(admin_page))
        .route("/admin/create-user", post(create_user))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}
