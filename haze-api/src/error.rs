//! API error handling.

use std::time::Duration;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use haze_core::{FetchError, HazeError};

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Map<String, Value>>,
    retry_after: Option<u64>,
}

/// Copy of an error body attached to the response so the request middleware
/// can log it with the request's context.
#[derive(Clone, Debug)]
pub struct ErrorLog {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
            retry_after: None,
        }
    }

    /// Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    /// Not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Internal server error. The caller's message is never shown to clients.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "An internal error occurred")
    }

    /// Too many requests in the current window.
    pub fn rate_limited(retry_after: Duration) -> Self {
        // Round up so clients never retry before the window has rolled over.
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        let mut err = Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many requests, please try again later",
        );
        err.retry_after = Some(secs.max(1));
        err.with_detail("retryAfter", secs.max(1))
    }

    /// Adds a field to the error's `details` object.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        self.code
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Map<String, Value>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let log = ErrorLog {
            code: self.code,
            message: self.message.clone(),
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                status: self.status.as_u16(),
                details: self.details,
            },
        };

        let mut response = (self.status, Json(body)).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response.extensions_mut().insert(log);
        response
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let mut api = ApiError::new(StatusCode::BAD_REQUEST, "UPSTREAM_FETCH_ERROR", err.to_string())
            .with_detail("reason", err.details());
        match &err {
            FetchError::InvalidUrl { url, .. } => {
                api = api.with_detail("url", url.as_str());
            }
            FetchError::Status { status } => {
                api = api.with_detail("statusCode", *status);
            }
            FetchError::NotImage { content_type } => {
                api = api.with_detail("contentType", content_type.as_str());
            }
            FetchError::TooLarge { limit } => {
                api = api.with_detail("limit", *limit);
            }
            FetchError::Timeout { .. } | FetchError::Network(_) => {}
        }
        api
    }
}

impl From<HazeError> for ApiError {
    fn from(err: HazeError) -> Self {
        if err.is_client_error() {
            tracing::debug!(error = %err, "Client error");
        } else {
            tracing::error!(error = %err, "Server error");
        }
        match err {
            HazeError::Validation(message) => ApiError::validation(message),
            HazeError::Fetch(fetch) => fetch.into(),
            HazeError::Transform(message) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "TRANSFORM_ERROR", message)
            }
            HazeError::Internal(_) => ApiError::internal(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::validation(format!("Invalid multipart body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(format!("Invalid path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::new(status, "VALIDATION_ERROR", "Uploaded file is too large");
        }
        ApiError::validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}
