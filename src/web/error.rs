//! API error handling for the Post Box web API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::delivery::RejectReason;
use crate::PostboxError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Not found (404).
    NotFound,
    /// Conflict (409).
    Conflict,
    /// Validation error (422) - for field-level validation errors.
    ValidationError,
    /// A letter was refused by validation or moderation (422).
    LetterRejected,
    /// Too many requests (429), including an active letter cooldown.
    TooManyRequests,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::LetterRejected => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Field-level validation error details (only present for validation errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
    /// Reason a letter was refused, with its payload.
    #[serde(flatten)]
    pub rejection: Option<RejectReason>,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
    rejection: Option<RejectReason>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            rejection: None,
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Create a too-many-requests error.
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TooManyRequests, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a validation error with field-level details.
    pub fn validation(details: HashMap<String, Vec<String>>) -> Self {
        Self {
            details: Some(details),
            ..Self::new(ErrorCode::ValidationError, "Validation failed")
        }
    }

    /// Create an error for a refused letter.
    ///
    /// An active cooldown is 429; every other reason is 422.
    pub fn rejected(reason: RejectReason, message: impl Into<String>) -> Self {
        let code = match reason {
            RejectReason::CooldownActive { .. } => ErrorCode::TooManyRequests,
            _ => ErrorCode::LetterRejected,
        };
        Self {
            rejection: Some(reason),
            ..Self::new(code, message)
        }
    }

    /// Create a validation error from validator::ValidationErrors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut details: HashMap<String, Vec<String>> = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            details.insert(field.to_string(), messages);
        }

        Self::validation(details)
    }

    /// The error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
                rejection: self.rejection,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<PostboxError> for ApiError {
    fn from(err: PostboxError) -> Self {
        match &err {
            PostboxError::NotFound(_) => ApiError::not_found(err.to_string()),
            PostboxError::Validation(msg) => {
                ApiError::new(ErrorCode::ValidationError, msg.clone())
            }
            PostboxError::Conflict(msg) => ApiError::conflict(msg.clone()),
            _ => {
                tracing::error!("Internal error: {}", err);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_code_status() {
        assert_eq!(ErrorCode::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::ValidationError.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::LetterRejected.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::TooManyRequests.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_cooldown_rejection_body() {
        let err = ApiError::rejected(
            RejectReason::CooldownActive { remaining_hours: 3 },
            "wait 3 hours",
        );
        let (status, json) = body_json(err).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"], "TOO_MANY_REQUESTS");
        assert_eq!(json["error"]["reason"], "cooldown-active");
        assert_eq!(json["error"]["remainingHours"], 3);
        assert_eq!(json["error"]["message"], "wait 3 hours");
    }

    #[tokio::test]
    async fn test_content_rejection_body() {
        let (status, json) =
            body_json(ApiError::rejected(RejectReason::ContentRejected, "no")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "LETTER_REJECTED");
        assert_eq!(json["error"]["reason"], "content-rejected");
    }

    #[tokio::test]
    async fn test_plain_error_has_no_reason() {
        let (status, json) = body_json(ApiError::not_found("missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].get("reason").is_none());
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_validation_error() {
        let mut details = HashMap::new();
        details.insert("username".to_string(), vec!["Too long".to_string()]);

        let err = ApiError::validation(details);
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Validation failed");
        assert_eq!(
            err.details.unwrap().get("username").unwrap(),
            &vec!["Too long".to_string()]
        );
    }

    #[test]
    fn test_from_postbox_error() {
        let err: ApiError = PostboxError::Conflict("taken".to_string()).into();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let err: ApiError = PostboxError::NotFound("user".to_string()).into();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err: ApiError = PostboxError::Database("disk full".to_string()).into();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.message, "An internal error occurred");
    }
}
