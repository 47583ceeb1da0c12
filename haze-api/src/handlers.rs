//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info};

use haze_core::constants::{
    DEFAULT_DECODE_HEIGHT, DEFAULT_DECODE_WIDTH, DEFAULT_PUNCH, IMAGE_MEDIA_PREFIX,
    PREVIEW_MAX_AGE_SECS,
};
use haze_core::{DecodeParams, EncodeParams, FingerprintResult, HazeError};

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET / and GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        message: "Blurhash service is running".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// POST /api/blurhash/upload
///
/// Multipart body with one `image` file part and optional `componentX` /
/// `componentY` text parts.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<FingerprintResult>> {
    let mut multipart = multipart?;
    let limit = state.config.upload_max_bytes;
    let mut image: Option<(Option<String>, Bytes)> = None;
    let mut component_x = None;
    let mut component_y = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                if image.is_some() {
                    return Err(ApiError::validation("Only one image may be uploaded per request"));
                }
                let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
                if !content_type.starts_with(IMAGE_MEDIA_PREFIX) {
                    return Err(ApiError::validation("Only image files can be uploaded")
                        .with_detail("contentType", content_type));
                }
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                if data.len() > limit {
                    return Err(ApiError::validation("Uploaded file is too large")
                        .with_detail("limit", limit));
                }
                image = Some((filename, data));
            }
            Some("componentX") => component_x = parse_count(&field.text().await?),
            Some("componentY") => component_y = parse_count(&field.text().await?),
            _ => {}
        }
    }

    let (filename, data) = image.ok_or_else(|| ApiError::validation("No image file was uploaded"))?;
    let params = EncodeParams::from_optional(component_x, component_y);
    let size = data.len();

    let encoded = state.pipeline.encode(data, params).await?;

    info!(
        filename = filename.as_deref().unwrap_or("<unnamed>"),
        size,
        component_x = params.component_x(),
        component_y = params.component_y(),
        cached = encoded.cached,
        "Processed uploaded image"
    );

    Ok(Json(encoded.result))
}

/// POST /api/blurhash/url
pub async fn encode_url(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<FingerprintResult>> {
    let Json(req) = body?;
    let url = req
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Missing url parameter"))?;
    let params = encode_params(req.component_x.as_ref(), req.component_y.as_ref());

    let encoded = state
        .pipeline
        .encode_url(state.fetcher.as_ref(), &url, params)
        .await
        .map_err(|err| match err {
            HazeError::Fetch(_) => ApiError::from(err).with_detail("url", url.as_str()),
            other => other.into(),
        })?;

    info!(
        url = %url,
        size = encoded.result.metadata.size,
        component_x = params.component_x(),
        component_y = params.component_y(),
        cached = encoded.cached,
        "Processed image from URL"
    );

    Ok(Json(encoded.result))
}

/// POST /api/blurhash/batch
pub async fn encode_batch(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>> {
    let Json(req) = body?;
    let urls = req
        .urls
        .ok_or_else(|| ApiError::validation("urls must be a non-empty array"))?;
    let params = encode_params(req.component_x.as_ref(), req.component_y.as_ref());

    let items = state.batch.process(urls, params).await?;

    Ok(Json(BatchResponse {
        results: items.into_iter().map(BatchItemDto::from).collect(),
    }))
}

/// GET /api/blurhash/decode/:hash
///
/// Renders the blurhash as a PNG with a 24 hour cache hint.
pub async fn decode_hash(
    State(state): State<Arc<AppState>>,
    hash: std::result::Result<Path<String>, PathRejection>,
    query: std::result::Result<Query<DecodeQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Path(hash) = hash?;
    let Query(query) = query?;
    let params = decode_params(&query)?;

    let png = state.pipeline.decode(&hash, params).await?;
    debug!(
        width = params.width(),
        height = params.height(),
        punch = params.punch(),
        size = png.len(),
        "Rendered blurhash preview"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_LENGTH, png.len().to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", PREVIEW_MAX_AGE_SECS),
            ),
        ],
        png,
    ))
}

/// GET /api/blurhash/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let limits = state.limiter.config();
    Json(StatsResponse {
        cache: state.cache().stats().into(),
        rate_limit: RateLimitStatsDto {
            tracked_clients: state.limiter.tracked_clients(),
            max_requests: limits.max_requests,
            window_secs: limits.window.as_secs(),
        },
    })
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::not_found("The requested resource does not exist")
}

fn decode_params(query: &DecodeQuery) -> Result<DecodeParams> {
    let width = numeric(query.width.as_deref(), "width")?.unwrap_or(DEFAULT_DECODE_WIDTH as i64);
    let height = numeric(query.height.as_deref(), "height")?.unwrap_or(DEFAULT_DECODE_HEIGHT as i64);
    let punch = match query.punch.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_PUNCH,
        Some(raw) => raw
            .parse::<f32>()
            .map_err(|_| ApiError::validation("punch must be a number"))?,
    };
    Ok(DecodeParams::new(width, height, punch)?)
}

fn numeric(raw: Option<&str>, name: &str) -> Result<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{} must be an integer", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn query(width: Option<&str>, height: Option<&str>, punch: Option<&str>) -> DecodeQuery {
        DecodeQuery {
            width: width.map(str::to_string),
            height: height.map(str::to_string),
            punch: punch.map(str::to_string),
        }
    }

    #[test]
    fn test_decode_params_defaults() {
        let params = decode_params(&DecodeQuery::default()).unwrap();
        assert_eq!((params.width(), params.height(), params.punch()), (32, 32, 1.0));
    }

    #[test_case(Some("0"), None, None; "zero width")]
    #[test_case(None, Some("1001"), None; "height too large")]
    #[test_case(None, None, Some("0"); "zero punch")]
    #[test_case(None, None, Some("11"); "punch too large")]
    #[test_case(Some("wide"), None, None; "non numeric width")]
    #[test_case(None, None, Some("strong"); "non numeric punch")]
    fn test_decode_params_rejected(width: Option<&str>, height: Option<&str>, punch: Option<&str>) {
        let err = decode_params(&query(width, height, punch)).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_decode_params_upper_bounds_accepted() {
        let params = decode_params(&query(Some("1000"), Some("1"), Some("10"))).unwrap();
        assert_eq!((params.width(), params.height(), params.punch()), (1000, 1, 10.0));
    }
}
