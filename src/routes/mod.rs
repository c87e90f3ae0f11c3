// Route definitions

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

// Declare submodules for different route groups
pub mod api;
pub mod auth;
pub mod static_pages;

pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        // Browsing
        .route("/catalog/:kind", get(api::get_catalog))
        .route("/catalog/:kind/filters", get(api::get_filter_defaults))
        .route("/catalog/:kind/search", post(api::search_catalog))
        .route("/likes/:kind", get(api::get_likes))
        .route("/likes/:kind/:id/toggle", post(api::toggle_like))
        // Session
        .route("/session", get(auth::get_session).post(auth::sign_in))
        .route("/session/logout", post(auth::logout))
        // Biometric quick login
        .route("/auth/biometric", get(auth::get_biometric))
        .route("/auth/biometric/enable", post(auth::enable_biometric))
        .route("/auth/biometric/disable", post(auth::disable_biometric))
        .route("/auth/biometric/login", post(auth::biometric_login))
        .route("/auth/biometric/blur", post(auth::blur_login_screen))
        .with_state(app_state.clone());

    Router::new()
        .route("/", get(static_pages::landing_page))
        .route("/login", get(static_pages::login_page))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
