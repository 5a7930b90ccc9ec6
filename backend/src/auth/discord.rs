use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::DiscordConfig;

/// Discord account fields the dashboard cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("Discord OAuth is not configured")]
    NotConfigured,
    #[error("Invalid Discord configuration: {0}")]
    InvalidConfig(String),
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Discord rejected the request: {0}")]
    Rejected(String),
}

/// Client for the Discord OAuth2 authorization-code flow with the `identify` scope.
pub struct DiscordClient {
    http_client: Client,
    config: DiscordConfig,
}

impl DiscordClient {
    pub fn new(config: &DiscordConfig) -> Self {
        Self {
            http_client: Client::new(),
            config: DiscordConfig {
                api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
                ..config.clone()
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.client_id.is_empty()
    }

    /// URL the browser is sent to for consent.
    pub fn authorize_url(&self, state: &str) -> Result<String, DiscordError> {
        if !self.is_configured() {
            return Err(DiscordError::NotConfigured);
        }

        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("scope", "identify"),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| DiscordError::InvalidConfig(e.to_string()))?;

        Ok(url.to_string())
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, DiscordError> {
        let url = format!("{}/oauth2/token", self.config.api_base_url);

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        tracing::debug!("Exchanging Discord authorization code at {}", url);

        let response = self
            .http_client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| DiscordError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Rejected(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DiscordError::InvalidResponse(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Fetch the profile of the account an access token belongs to.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<DiscordProfile, DiscordError> {
        let url = format!("{}/users/@me", self.config.api_base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| DiscordError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Rejected(format!("{}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| DiscordError::InvalidResponse(e.to_string()))
    }
}
