//! Error types for haze.
//!
//! Errors are split by who is at fault so callers can pattern-match instead of
//! inspecting message strings:
//!
//! - [`HazeError::Validation`]: the caller sent something out of range or missing
//! - [`HazeError::Fetch`]: a remote image could not be acquired
//! - [`HazeError::Transform`]: the image/blurhash codec failed
//! - [`HazeError::Internal`]: anything unexpected

use thiserror::Error;

/// Result type alias using `HazeError`.
pub type Result<T> = std::result::Result<T, HazeError>;

/// Main error type for all haze operations.
#[derive(Debug, Error)]
pub enum HazeError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CLIENT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Fetching a remote image failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERVER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Image decoding, resizing, or blurhash encoding/decoding failed.
    #[error("Transform failed: {0}")]
    Transform(String),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HazeError {
    /// Returns true if the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, HazeError::Validation(_) | HazeError::Fetch(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, HazeError::Validation(_))
    }
}

/// Failure while acquiring a remote image.
///
/// Cloneable so batch results can carry it without re-fetching.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The URL did not parse or used an unsupported scheme.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The remote host answered with a non-2xx status.
    #[error("Failed to fetch image: HTTP {status}")]
    Status {
        /// Upstream HTTP status code
        status: u16,
    },

    /// No response arrived within the fetch timeout.
    #[error("Fetching image timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed
        seconds: u64,
    },

    /// The response did not declare an `image/*` content type.
    #[error("URL is not an image resource (content-type: {content_type})")]
    NotImage {
        /// Declared content type, or empty when absent
        content_type: String,
    },

    /// The body exceeded the maximum payload size.
    #[error("Image exceeds the {limit} byte limit")]
    TooLarge {
        /// Byte limit that was exceeded
        limit: usize,
    },

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("Network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Short description used as the `details` of a failed batch item.
    pub fn details(&self) -> String {
        match self {
            FetchError::Status { status } => format!("HTTP {}", status),
            FetchError::Timeout { .. } | FetchError::Network(_) => "network error".into(),
            FetchError::InvalidUrl { .. } => "invalid url".into(),
            FetchError::NotImage { content_type } => format!("content-type: {}", content_type),
            FetchError::TooLarge { limit } => format!("limit: {} bytes", limit),
        }
    }

    /// Returns true if retrying the same URL later might succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Network(_) => true,
            FetchError::Status { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
