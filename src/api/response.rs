//! Response envelope and error mapping
//!
//! Every JSON endpoint answers `{success, data?, error?}`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<T> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error, rendered as an `ApiResponse` with a matching status code
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(m) | Self::Unauthorized(m) | Self::NotFound(m) | Self::Internal(m) => m,
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("Invalid path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl From<wagate_core::Error> for ApiError {
    fn from(err: wagate_core::Error) -> Self {
        use wagate_core::Error;
        use wagate_providers::Error as ProviderError;

        match err {
            Error::NotFound(what) => Self::NotFound(format!("Not found: {what}")),
            Error::InvalidInput(msg) => Self::BadRequest(msg),
            Error::SessionInactive(phone) => {
                Self::BadRequest(format!("Session {phone} is not active"))
            }
            Error::Provider(ProviderError::InvalidInput(msg)) => Self::BadRequest(msg),
            Error::Provider(ProviderError::UnknownProvider(name)) => {
                Self::BadRequest(format!("Provider not available: {name}"))
            }
            other => {
                error!(error = %other, "Request failed");
                Self::Internal("Internal server error".to_string())
            }
        }
    }
}

/// Handler result
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap data in a success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let not_found: ApiError = wagate_core::Error::NotFound("session 1".to_string()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let inactive: ApiError = wagate_core::Error::SessionInactive("1".to_string()).into();
        assert_eq!(inactive.status(), StatusCode::BAD_REQUEST);

        let internal: ApiError = wagate_core::Error::Internal("boom".to_string()).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(internal, ApiError::Internal(m) if m == "Internal server error"));
    }

    #[test]
    fn test_envelope_skips_empty_fields() {
        let body = serde_json::to_value(ApiResponse::success(1)).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": 1 }));

        let body = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(body, serde_json::json!({ "success": false, "error": "nope" }));
    }
}
