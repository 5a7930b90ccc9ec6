use std::sync::Arc;

use axum::{extract::State, middleware, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{require_auth, CurrentUser};
use crate::error::{AppError, Result};
use crate::routes::extract::JsonOrForm;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateServerBody {
    #[serde(default)]
    server_name: Option<String>,
    #[serde(default)]
    server_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateServerReply {
    success: bool,
    server_id: Option<serde_json::Value>,
}

/// POST /api/servers - create a game server on the panel for the current user.
async fn create_server(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    JsonOrForm(body): JsonOrForm<CreateServerBody>,
) -> Result<Json<CreateServerReply>> {
    let (Some(server_name), Some(server_type)) = (
        body.server_name.filter(|n| !n.is_empty()),
        body.server_type.filter(|t| !t.is_empty()),
    ) else {
        return Err(AppError::BadRequest("Missing fields".to_string()));
    };

    let server_id = state
        .panel_client
        .create_server(&server_name, &server_type, &user.username)
        .await?;

    tracing::info!(
        "User {} created server {:?} ({})",
        user.username,
        server_name,
        server_type
    );

    Ok(Json(CreateServerReply {
        success: true,
        server_id,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/servers", post(create_server))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}
