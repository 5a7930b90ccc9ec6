use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crazedash_backend::{app, auth, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.logging.level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting {} dashboard", config.branding.name);

    if config.session.secret == "craze-session" {
        tracing::warn!("Using the default session secret; set SESSION_SECRET in production");
    }
    if config.panel.url.is_empty() {
        tracing::warn!("PANEL_URL is not set; server creation will fail");
    }

    let state = Arc::new(AppState::new(config.clone())?);

    if let Some(admin) = auth::ensure_admin(&state.users, &config.admin)? {
        tracing::info!("Created admin account {}", admin.username);
    }

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
