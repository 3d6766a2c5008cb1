//! HTTP error mapping. Domain and authentication failures convert into
//! a uniform JSON error body with a stable status code per category.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use dispatch_domain::DispatchError;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DispatchError),
    #[error(transparent)]
    Authentication(#[from] AuthError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::Domain(
                DispatchError::DispatchNotFound { .. } | DispatchError::UserNotFound { .. },
            ) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ApiError::Domain(DispatchError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "CONFLICT", self.to_string())
            }
            ApiError::Domain(DispatchError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message.clone())
            }
            ApiError::Domain(DispatchError::InvalidCredentials)
            | ApiError::Authentication(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_ERROR",
                "Invalid email or password".to_string(),
            ),
            ApiError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_ERROR",
                "Invalid or expired authentication token".to_string(),
            ),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            }
            ApiError::Domain(DispatchError::Database(_) | DispatchError::Internal(_))
            | ApiError::Internal(_) => {
                // internals stay in the log, not in the response body
                error!("internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain::DispatchStatus;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn missing_dispatch_is_404() {
        let err = ApiError::Domain(DispatchError::dispatch_not_found(7));
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_transition_is_409() {
        let err = ApiError::Domain(DispatchError::invalid_transition(
            DispatchStatus::Completed,
            "accept",
        ));
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_is_400() {
        let err = ApiError::Domain(DispatchError::validation_error("area must not be empty"));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_failures_are_401() {
        assert_eq!(
            status_of(ApiError::Authentication(AuthError::MissingToken)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ApiError::Authentication(AuthError::ExpiredToken)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ApiError::Authentication(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn database_errors_stay_opaque() {
        let response =
            ApiError::Domain(DispatchError::database_error("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
