//! DTOs for API requests and responses.

use serde::{Deserialize, Serialize};

use haze_cache::CacheStats;
use haze_core::{BatchItem, BatchOutcome, EncodeParams, ImageMetadata};

/// A component count as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ComponentValue {
    /// Integer literal
    Int(i64),
    /// Fractional literal, truncated
    Float(f64),
    /// Numeric string such as `"5"`
    Text(String),
}

impl ComponentValue {
    /// Interprets the value as a count, or `None` when it is not numeric.
    pub fn as_count(&self) -> Option<i64> {
        match self {
            ComponentValue::Int(n) => Some(*n),
            ComponentValue::Float(f) => truncate(*f),
            ComponentValue::Text(s) => parse_count(s),
        }
    }
}

/// Parses a component count from text. Non-numeric input yields `None`.
pub fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(truncate))
}

fn truncate(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

/// Builds clamped encode parameters; missing or unparseable counts use the 4×3 default.
pub fn encode_params(x: Option<&ComponentValue>, y: Option<&ComponentValue>) -> EncodeParams {
    EncodeParams::from_optional(
        x.and_then(ComponentValue::as_count),
        y.and_then(ComponentValue::as_count),
    )
}

/// Request to fingerprint a remote image.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRequest {
    /// Image URL
    pub url: Option<String>,
    /// Horizontal component count
    pub component_x: Option<ComponentValue>,
    /// Vertical component count
    pub component_y: Option<ComponentValue>,
}

/// Request to fingerprint several remote images.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Image URLs, at most 10
    pub urls: Option<Vec<String>>,
    /// Horizontal component count
    pub component_x: Option<ComponentValue>,
    /// Vertical component count
    pub component_y: Option<ComponentValue>,
}

/// Query string of the decode endpoint.
///
/// Kept as text so non-numeric values produce a JSON validation error rather than
/// an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct DecodeQuery {
    /// Preview width
    pub width: Option<String>,
    /// Preview height
    pub height: Option<String>,
    /// Contrast factor
    pub punch: Option<String>,
}

/// One entry of a batch response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemDto {
    /// Source URL, as submitted
    pub url: String,
    /// Fingerprint, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Source metadata, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
    /// Set when the result came from the cache
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
    /// Error message, on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Short failure detail such as `HTTP 404`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<BatchItem> for BatchItemDto {
    fn from(item: BatchItem) -> Self {
        match item.outcome {
            BatchOutcome::Success { result, cached } => Self {
                url: item.url,
                fingerprint: Some(result.fingerprint),
                metadata: Some(result.metadata),
                cached,
                error: None,
                details: None,
            },
            BatchOutcome::Failure { error, details } => Self {
                url: item.url,
                fingerprint: None,
                metadata: None,
                cached: false,
                error: Some(error),
                details: Some(details),
            },
        }
    }
}

/// Response for batch processing.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// One entry per submitted URL, in submission order
    pub results: Vec<BatchItemDto>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Human-readable greeting
    pub message: String,
    /// Service version
    pub version: String,
    /// RFC 3339 server time
    pub timestamp: String,
}

/// Cache totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsDto {
    /// Entries currently stored
    pub total_entries: usize,
    /// Stored entries past their expiry
    pub expired_entries: usize,
    /// Stored entries still valid
    pub valid_entries: usize,
}

impl From<CacheStats> for CacheStatsDto {
    fn from(stats: CacheStats) -> Self {
        Self {
            total_entries: stats.total_entries,
            expired_entries: stats.expired_entries,
            valid_entries: stats.valid_entries,
        }
    }
}

/// Rate limiter totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatsDto {
    /// Clients with a live record
    pub tracked_clients: usize,
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

/// Response for the stats endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Result cache totals
    pub cache: CacheStatsDto,
    /// Admission control totals
    pub rate_limit: RateLimitStatsDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use haze_core::FingerprintResult;
    use serde_json::json;

    #[test]
    fn test_component_values_are_lenient() {
        let req: UrlRequest = serde_json::from_value(json!({
            "url": "https://img.test/a.png",
            "componentX": "6",
            "componentY": 2.7
        }))
        .unwrap();
        let params = encode_params(req.component_x.as_ref(), req.component_y.as_ref());
        assert_eq!((params.component_x(), params.component_y()), (6, 2));
    }

    #[test]
    fn test_unparseable_components_fall_back_then_clamp() {
        let req: BatchRequest = serde_json::from_value(json!({
            "urls": [],
            "componentX": "lots",
            "componentY": 42
        }))
        .unwrap();
        let params = encode_params(req.component_x.as_ref(), req.component_y.as_ref());
        assert_eq!((params.component_x(), params.component_y()), (4, 9));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(" 3 "), Some(3));
        assert_eq!(parse_count("3.9"), Some(3));
        assert_eq!(parse_count("abc"), None);
        assert_eq!(parse_count("NaN"), None);
    }

    #[test]
    fn test_batch_item_shapes() {
        let ok = BatchItemDto::from(BatchItem {
            url: "https://img.test/a.png".into(),
            outcome: BatchOutcome::Success {
                result: FingerprintResult {
                    fingerprint: "LEHV6nWB2yk8pyo0adR*.7kCMdnj".into(),
                    metadata: ImageMetadata {
                        width: 64,
                        height: 48,
                        format: "png".into(),
                        size: 1234,
                        component_x: 4,
                        component_y: 3,
                    },
                },
                cached: false,
            },
        });
        let value = serde_json::to_value(ok).unwrap();
        assert_eq!(value["fingerprint"], "LEHV6nWB2yk8pyo0adR*.7kCMdnj");
        assert!(value.get("cached").is_none());
        assert!(value.get("error").is_none());

        let failed = BatchItemDto::from(BatchItem {
            url: "https://img.test/b.png".into(),
            outcome: BatchOutcome::Failure {
                error: "Failed to fetch image: HTTP 404".into(),
                details: "HTTP 404".into(),
            },
        });
        let value = serde_json::to_value(failed).unwrap();
        assert_eq!(value["details"], "HTTP 404");
        assert!(value.get("fingerprint").is_none());
    }
}
