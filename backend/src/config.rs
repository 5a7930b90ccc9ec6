//! Configuration for the dashboard server.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Flat environment variable names accepted on top of the
/// `CRAZEDASH__SECTION__KEY` form, mapped to their config keys.
const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("STATIC_DIR", "server.static_dir"),
    ("SESSION_SECRET", "session.secret"),
    ("SECURE_COOKIES", "session.secure_cookies"),
    ("DATABASE_URL", "database.url"),
    ("DISCORD_CLIENT_ID", "discord.client_id"),
    ("DISCORD_CLIENT_SECRET", "discord.client_secret"),
    ("DISCORD_CALLBACK_URL", "discord.callback_url"),
    ("DASH_NAME", "branding.name"),
    ("DASH_SUBTITLE", "branding.subtitle"),
    ("FAVICON_URL", "branding.favicon_url"),
    ("PRIMARY_COLOR", "branding.primary_color"),
    ("SECONDARY_COLOR", "branding.secondary_color"),
    ("BACKGROUND_ANIMATION_URL", "branding.background_url"),
    ("PANEL_URL", "panel.url"),
    ("SKYPORT_API_KEY", "panel.api_key"),
    ("ADMIN_USERNAME", "admin.username"),
    ("ADMIN_PASSWORD", "admin.password"),
    ("LOG_LEVEL", "logging.level"),
];

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub branding: BrandingConfig,
    #[serde(default)]
    pub panel: PanelConfig,
    /// Admin account created at startup when missing.
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for any path no route matches.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret the session cookie signing key is derived from.
    #[serde(default = "default_session_secret")]
    pub secret: String,
    /// Only send the session cookie over HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: default_session_secret(),
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, optionally prefixed with `sqlite:`. `:memory:` opens an in-memory database.
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Discord OAuth2 application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub callback_url: String,
    #[serde(default = "default_discord_authorize_url")]
    pub authorize_url: String,
    /// Base of the token and user endpoints.
    #[serde(default = "default_discord_api_base_url")]
    pub api_base_url: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: String::new(),
            authorize_url: default_discord_authorize_url(),
            api_base_url: default_discord_api_base_url(),
        }
    }
}

/// Values passed to every rendered page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrandingConfig {
    #[serde(default = "default_dash_name")]
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub favicon_url: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
    #[serde(default)]
    pub background_url: Option<String>,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            name: default_dash_name(),
            subtitle: String::new(),
            favicon_url: String::new(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
            background_url: None,
        }
    }
}

/// External game panel API.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PanelConfig {
    /// Base URL, also linked from the pages. Empty means not configured.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_static_dir() -> String {
    "public".to_string()
}
fn default_session_secret() -> String {
    "craze-session".to_string()
}
fn default_database_url() -> String {
    "sqlite:./data/crazedash.db".to_string()
}
fn default_discord_authorize_url() -> String {
    "https://discord.com/oauth2/authorize".to_string()
}
fn default_discord_api_base_url() -> String {
    "https://discord.com/api".to_string()
}
fn default_dash_name() -> String {
    "CrazeDash".to_string()
}
fn default_primary_color() -> String {
    "#1abc9c".to_string()
}
fn default_secondary_color() -> String {
    "#2c3e50".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Flat environment variables such as `PORT` or `DASH_NAME`
    /// 2. Environment variables (CRAZEDASH__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Like [`Config::load`], reading flat variables through `lookup`.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("CRAZEDASH")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV_VARS {
            let value = lookup(var).filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Address the HTTP listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::load_with(|name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 3000);
        assert_eq!(server.static_dir, "public");
    }

    #[test]
    fn test_default_branding() {
        let branding = BrandingConfig::default();
        assert_eq!(branding.name, "CrazeDash");
        assert_eq!(branding.subtitle, "");
        assert_eq!(branding.primary_color, "#1abc9c");
        assert_eq!(branding.secondary_color, "#2c3e50");
        assert!(branding.background_url.is_none());
    }

    #[test]
    fn test_load_without_overrides_uses_defaults() {
        let config = load_from(&[]);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.secret, "craze-session");
        assert_eq!(config.discord.api_base_url, "https://discord.com/api");
        assert!(config.panel.url.is_empty());
        assert!(config.admin.username.is_none());
    }

    #[test]
    fn test_legacy_env_vars_override() {
        let config = load_from(&[
            ("PORT", "8081"),
            ("DASH_NAME", "MyDash"),
            ("PANEL_URL", "https://panel.example.com"),
            ("SKYPORT_API_KEY", "secret-key"),
            ("BACKGROUND_ANIMATION_URL", "https://cdn.example.com/bg.mp4"),
            ("ADMIN_USERNAME", "root"),
        ]);
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.branding.name, "MyDash");
        assert_eq!(config.panel.url, "https://panel.example.com");
        assert_eq!(config.panel.api_key, "secret-key");
        assert_eq!(
            config.branding.background_url.as_deref(),
            Some("https://cdn.example.com/bg.mp4")
        );
        assert_eq!(config.admin.username.as_deref(), Some("root"));
    }

    #[test]
    fn test_empty_legacy_var_keeps_default() {
        let config = load_from(&[("DASH_NAME", "")]);
        assert_eq!(config.branding.name, "CrazeDash");
    }

    #[test]
    fn test_invalid_port_is_error() {
        let result = Config::load_with(|name| (name == "PORT").then(|| "not-a-port".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_listen_addr() {
        let config = Config::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
    }
}
