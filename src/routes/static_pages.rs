use askama::Template;
use axum::{extract::State, response::Html};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::ItemKind,
};

// Landing page with a count per browse list
#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    sections: Vec<(String, usize)>,
}

// Login page. The quick-login button only appears when the gate offers it.
#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    offer_biometric: bool,
    method_name: String,
    saved_user: String,
    locked_out_seconds: i64,
    signed_in_as: String,
}

fn render(template: &impl Template, name: &str) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Failed to render {} template: {}", name, e);
            Err(AppError::InternalServerError(anyhow::Error::new(e)))
        }
    }
}

pub async fn landing_page(State(app_state): State<AppState>) -> AppResult<Html<String>> {
    let sections = ItemKind::ALL
        .iter()
        .map(|kind| (kind.as_path().to_string(), app_state.catalogs.get(*kind).len()))
        .collect();
    render(&LandingTemplate { sections }, "landing")
}

// Rendering the login page counts as a screen focus
pub async fn login_page(State(app_state): State<AppState>) -> AppResult<Html<String>> {
    app_state.focus_login_screen();
    let snapshot = app_state.gate.refresh().await;
    let signed_in_as = app_state
        .session
        .current()
        .await
        .map(|record| record.display_name)
        .unwrap_or_default();

    let template = LoginTemplate {
        offer_biometric: snapshot.offer_biometric_login,
        method_name: snapshot.method_name.unwrap_or("Biometrics").to_string(),
        saved_user: snapshot.saved_user.unwrap_or_default(),
        locked_out_seconds: snapshot.locked_out_seconds.unwrap_or(0),
        signed_in_as,
    };
    render(&template, "login")
}
