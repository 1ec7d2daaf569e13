//! API error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::PagetextError;

use super::types::ErrorResponse;

/// An error answered as `{"error_type", "message", "status_code"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: &PagetextError) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error_type: error.kind().to_string(),
                message: error.to_string(),
                status_code: status.as_u16(),
            },
        }
    }

    /// 400 Bad Request.
    pub fn validation(error: PagetextError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &error)
    }

    /// 500 Internal Server Error.
    pub fn internal(error: PagetextError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, &error)
    }
}

impl From<PagetextError> for ApiError {
    fn from(error: PagetextError) -> Self {
        if error.is_caller_facing() {
            Self::validation(error)
        } else {
            tracing::error!(error = %error, "Unexpected error while serving request");
            Self::internal(error)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_is_bad_request() {
        let err: ApiError = PagetextError::UnsupportedFormat("a.docx".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error_type, "UnsupportedFormat");
        assert_eq!(err.body.status_code, 400);
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err: ApiError = PagetextError::Other("boom".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.message, "boom");
    }
}
