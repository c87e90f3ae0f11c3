// Session and biometric quick-login handlers

use axum::{
    extract::{Json as JsonExtract, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

use crate::{
    AppState,
    error::{AppError, AppResult},
    gate::{BiometricLogin, GateSnapshot, GateUpdate},
    models::{SessionRecord, SignInRequest},
};

// --- Response Wrappers ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub signed_in: bool,
    pub session: Option<SessionRecord>,
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricLoginResponse {
    // "restored" or "cancelled"
    pub outcome: &'static str,
    pub session: Option<SessionRecord>,
}

// --- Session Handlers ---

pub async fn get_session(State(app_state): State<AppState>) -> Json<SessionResponse> {
    let session = app_state.session.current().await;
    Json(SessionResponse {
        signed_in: session.is_some(),
        session,
        warning: None,
    })
}

// Credentials were verified upstream; record the identity as the active
// session and as the last-session record
pub async fn sign_in(
    State(app_state): State<AppState>,
    JsonExtract(request): JsonExtract<SignInRequest>,
) -> Json<SessionResponse> {
    tracing::info!("[HANDLER] /api/session - Sign-in for user: {}", request.user_id);
    let (record, warning) = app_state.session.sign_in(request, app_state.preferences()).await;
    app_state.gate.clear_failures();
    Json(SessionResponse {
        signed_in: true,
        session: Some(record),
        warning,
    })
}

pub async fn logout(State(app_state): State<AppState>) -> Json<SessionResponse> {
    tracing::info!("[HANDLER] /api/session/logout - Request received.");
    let warning = app_state.session.logout(app_state.preferences()).await;
    app_state.likes.clear().await;
    Json(SessionResponse {
        signed_in: false,
        session: None,
        warning,
    })
}

// --- Biometric Handlers ---

// Login screen focus: re-evaluates the gate
pub async fn get_biometric(State(app_state): State<AppState>) -> Json<GateSnapshot> {
    app_state.focus_login_screen();
    Json(app_state.gate.refresh().await)
}

pub async fn enable_biometric(State(app_state): State<AppState>) -> AppResult<Json<GateUpdate>> {
    tracing::info!("[HANDLER] /api/auth/biometric/enable - Request received.");
    if !app_state.session.is_signed_in().await {
        return Err(AppError::Unauthorized(
            "Sign in before enabling biometric login".to_string(),
        ));
    }
    let liveness = app_state.login_screen_liveness();
    let update = app_state.gate.enable(&liveness).await?;
    Ok(Json(update))
}

pub async fn disable_biometric(State(app_state): State<AppState>) -> Json<GateUpdate> {
    tracing::info!("[HANDLER] /api/auth/biometric/disable - Request received.");
    Json(app_state.gate.disable().await)
}

pub async fn biometric_login(
    State(app_state): State<AppState>,
) -> AppResult<Json<BiometricLoginResponse>> {
    tracing::info!("[HANDLER] /api/auth/biometric/login - Request received.");
    let liveness = app_state.login_screen_liveness();
    let response = match app_state.gate.login(&app_state.session, &liveness).await? {
        BiometricLogin::Restored(record) => BiometricLoginResponse {
            outcome: "restored",
            session: Some(record),
        },
        BiometricLogin::Cancelled => BiometricLoginResponse {
            outcome: "cancelled",
            session: None,
        },
    };
    Ok(Json(response))
}

// Login screen dismissed or navigated away from
pub async fn blur_login_screen(State(app_state): State<AppState>) -> StatusCode {
    app_state.blur_login_screen();
    StatusCode::NO_CONTENT
}
