//! Page rendering with Tera. Templates are compiled into the binary.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::Config;
use crate::models::user::User;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("admin.html", include_str!("../../templates/admin.html")),
];

#[derive(Debug, thiserror::Error)]
#[error("Template error: {0}")]
pub struct ViewError(#[from] tera::Error);

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        tracing::error!("{:?}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>500 Internal Server Error</h1>"),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub flash: Vec<String>,
    pub discord_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage<'a> {
    pub user: &'a User,
}

#[derive(Debug, Serialize)]
pub struct AdminPage<'a> {
    pub user: &'a User,
    pub users: &'a [User],
}

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self, ViewError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    /// Render `template` with the branding bundle and the page-specific values.
    pub fn render<P: Serialize>(
        &self,
        template: &str,
        config: &Config,
        page: &P,
    ) -> Result<Html<String>, ViewError> {
        let mut context = Context::new();
        context.insert("branding", &config.branding);
        context.insert("panel_url", &config.panel.url);
        context.extend(Context::from_serialize(page)?);

        Ok(Html(self.tera.render(template, &context)?))
    }
}
