// Application error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::filter::FilterError;
use crate::gate::GateError;

#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    Gate(GateError),
}

// Implement conversion from anyhow::Error for easier error propagation
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl From<FilterError> for AppError {
    fn from(error: FilterError) -> Self {
        AppError::BadRequest(error.to_string())
    }
}

impl From<GateError> for AppError {
    fn from(error: GateError) -> Self {
        AppError::Gate(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(e) => {
                // Log the detailed error here, don't expose it to the client
                tracing::error!("Internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
            AppError::Unauthorized(message) => {
                tracing::warn!("Unauthorized access attempt: {}", message);
                (StatusCode::UNAUTHORIZED, json!({ "error": message }))
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            AppError::Gate(e) => {
                let message = e.to_string();
                match e {
                    GateError::ChallengeFailed { attempts_remaining, .. } => (
                        StatusCode::UNAUTHORIZED,
                        json!({ "error": message, "attemptsRemaining": attempts_remaining, "fallback": "credentials" }),
                    ),
                    GateError::LockedOut { remaining_seconds } => (
                        StatusCode::TOO_MANY_REQUESTS,
                        json!({ "error": message, "retryAfterSeconds": remaining_seconds, "fallback": "credentials" }),
                    ),
                    GateError::Stale => (StatusCode::GONE, json!({ "error": message })),
                    GateError::Unavailable | GateError::NotEnabled | GateError::NoSavedSession => {
                        (StatusCode::CONFLICT, json!({ "error": message }))
                    }
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

// Define a custom Result type using our AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_errors_map_to_distinct_statuses() {
        let locked = AppError::from(GateError::LockedOut { remaining_seconds: 12 }).into_response();
        assert_eq!(locked.status(), StatusCode::TOO_MANY_REQUESTS);

        let failed = AppError::from(GateError::ChallengeFailed {
            reason: "no match".to_string(),
            attempts_remaining: 1,
        })
        .into_response();
        assert_eq!(failed.status(), StatusCode::UNAUTHORIZED);

        let disabled = AppError::from(GateError::NotEnabled).into_response();
        assert_eq!(disabled.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn filter_errors_are_bad_requests() {
        let response = AppError::from(FilterError::InvalidPriceRange { min: 5, max: 1 }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
