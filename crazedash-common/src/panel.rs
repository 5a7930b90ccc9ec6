//! Request and response bodies of the external panel's server-creation API.

use serde::{Deserialize, Serialize};

/// Body of `POST {panel}/api/createServer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub server_type: String,
    /// Username of the dashboard user requesting the server.
    pub creator: String,
}

/// Reply of the panel API. `server_id` is present on success, `error` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServerResponse {
    #[serde(default)]
    pub success: bool,
    /// The panel may assign numeric or string ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
