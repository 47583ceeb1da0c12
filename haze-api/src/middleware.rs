//! Request admission and request/error logging.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::{ApiError, ErrorLog};
use crate::ratelimit::{client_identity, Admission};
use crate::state::AppState;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Admission control for every route.
///
/// Logs the request, consults the rate limiter before any handler runs, stamps the
/// bookkeeping headers on the response, and logs any error body with the request's
/// method, path and client.
pub async fn admission_middleware(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let limiter = state.limiter.clone();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = client_identity(
        connect_info.map(|ci| ci.0),
        request.headers(),
        limiter.config().trust_proxy_headers,
    );

    info!(method = %method, path = %path, client = %client, "Incoming request");

    let (mut response, remaining, reset_at) = match limiter.admit(&client) {
        Admission::Allowed { remaining, reset_at } => (next.run(request).await, remaining, reset_at),
        Admission::Rejected { retry_after, reset_at } => {
            (ApiError::rate_limited(retry_after).into_response(), 0, reset_at)
        }
    };

    add_rate_limit_headers(
        response.headers_mut(),
        limiter.config().max_requests,
        remaining,
        reset_at,
    );

    if let Some(log) = response.extensions().get::<ErrorLog>() {
        let status = response.status().as_u16();
        if response.status().is_server_error() {
            error!(method = %method, path = %path, client = %client, status, code = log.code, message = %log.message, "Request failed");
        } else {
            warn!(method = %method, path = %path, client = %client, status, code = log.code, message = %log.message, "Request rejected");
        }
    }

    response
}

/// Adds `X-RateLimit-*` headers. The reset time is a Unix timestamp in seconds.
fn add_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_at: Instant) {
    let until_reset = reset_at.saturating_duration_since(Instant::now());
    let reset_epoch = Utc::now().timestamp()
        + until_reset.as_secs() as i64
        + i64::from(until_reset.subsec_nanos() > 0);

    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(reset_epoch));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limit_headers() {
        let mut headers = HeaderMap::new();
        let now = Utc::now().timestamp();
        add_rate_limit_headers(&mut headers, 60, 12, Instant::now() + Duration::from_secs(30));

        assert_eq!(headers[&LIMIT_HEADER], "60");
        assert_eq!(headers[&REMAINING_HEADER], "12");
        let reset: i64 = headers[&RESET_HEADER].to_str().unwrap().parse().unwrap();
        assert!(reset >= now + 29 && reset <= now + 32);
    }
}
