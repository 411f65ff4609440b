use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::resolver::DEFAULT_USER_INPUT;
use crate::services::temperatures::DEFAULT_NUM_HOURS;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::ExternalServiceError(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal database error".to_string(),
                )
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

/// Geocoding failures reported by the upstream autocomplete lookup.
///
/// Every variant is recoverable: the resolver falls back to the default
/// location and reports a [`CycleWarning::ResolutionFailure`].
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("no location matched {0:?}")]
    NotFound(String),

    #[error("unexpected geocoding response: {0}")]
    Parse(String),

    #[error("geocoding request failed: {0}")]
    Request(String),
}

/// Non-fatal problems found during a resolution cycle.
///
/// These never abort the cycle. Each one has already been replaced by a
/// default value by the time the caller sees it, and is only carried along so
/// the presentation layer can tell the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleWarning {
    #[error(
        "seanweather didnt like that, please try another city or zipcode (showing {})",
        DEFAULT_USER_INPUT
    )]
    ResolutionFailure { input: String },

    #[error("seanweather didnt like the number of hours, using {}", DEFAULT_NUM_HOURS)]
    ParameterFailure { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages_mention_defaults() {
        let w = CycleWarning::ResolutionFailure {
            input: "??invalid??".to_string(),
        };
        assert!(w.to_string().contains("10027"));

        let w = CycleWarning::ParameterFailure {
            value: "tacos".to_string(),
        };
        assert!(w.to_string().contains("12"));
    }

    #[test]
    fn test_database_error_maps_to_500() {
        let response = AppError::DatabaseError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_external_service_error_maps_to_502() {
        let response = AppError::ExternalServiceError("hourly API".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_error_maps_to_500() {
        let response = AppError::InternalError("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
