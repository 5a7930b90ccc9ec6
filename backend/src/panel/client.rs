use reqwest::Client;

use crazedash_common::{CreateServerRequest, CreateServerResponse};

use crate::config::PanelConfig;

/// Client for the external game panel API.
pub struct PanelClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("Panel URL is not configured")]
    NotConfigured,
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The panel answered `success: false`; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),
}

impl PanelClient {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Ask the panel to create a server. Returns the panel-assigned id, if any.
    ///
    /// The body is read as JSON whatever the HTTP status; only its `success`
    /// flag decides the outcome. No retries.
    pub async fn create_server(
        &self,
        name: &str,
        server_type: &str,
        creator: &str,
    ) -> Result<Option<serde_json::Value>, PanelError> {
        if self.base_url.is_empty() {
            return Err(PanelError::NotConfigured);
        }

        let url = format!("{}/api/createServer", self.base_url);
        let body = CreateServerRequest {
            name: name.to_string(),
            server_type: server_type.to_string(),
            creator: creator.to_string(),
        };

        tracing::debug!("Sending createServer request to panel: {}", url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PanelError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let data: CreateServerResponse = response
            .json()
            .await
            .map_err(|e| PanelError::InvalidResponse(format!("{}: {}", status, e)))?;

        if !data.success {
            return Err(PanelError::Rejected(
                data.error.unwrap_or_else(|| "Panel API error".to_string()),
            ));
        }

        Ok(data.server_id)
    }
}
