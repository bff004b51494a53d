//! Maps `DomainError` to HTTP status codes and `{success: false, message}` bodies.

use crate::domain::DomainError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn status_of(e: &DomainError) -> StatusCode {
    match e {
        DomainError::Validation(_) | DomainError::Import(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Repo(_)
        | DomainError::Auth(_)
        | DomainError::Notifier(_)
        | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            error!(error = %self.0, "request failed");
            "Internal server error".to_string()
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(&DomainError::validation("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(&DomainError::Import("bad zip".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(&DomainError::conflict("dup")), StatusCode::CONFLICT);
        assert_eq!(
            status_of(&DomainError::Forbidden("no".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(&DomainError::Repo("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let resp = ApiError(DomainError::Repo("secret path".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = ApiError(DomainError::not_found("Task not found")).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
