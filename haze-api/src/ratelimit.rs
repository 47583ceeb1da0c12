//! Per-client admission control.
//!
//! Fixed-window counter keyed by client identity (normally the peer IP). The
//! window for a client rolls forward only on that client's first request after
//! it has elapsed; nothing resets windows in the background.
//!
//! Because windows are fixed, a client can land `max` requests at the end of one
//! window and `max` more at the start of the next, i.e. up to 2× `max` within a
//! short span around the boundary.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::DashMap;
use tracing::debug;

use haze_cache::Sweepable;
use haze_core::constants::{DEFAULT_RATE_LIMIT_MAX, DEFAULT_RATE_LIMIT_WINDOW};

/// Rate limiting configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for client identity
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX,
            window: DEFAULT_RATE_LIMIT_WINDOW,
            trust_proxy_headers: false,
        }
    }
}

/// Counter state for one client.
#[derive(Debug, Clone)]
struct RateRecord {
    count: u32,
    window_reset_at: Instant,
}

/// Result of [`RateLimiter::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request may proceed.
    Allowed {
        /// Requests left in the current window
        remaining: u32,
        /// When the current window ends
        reset_at: Instant,
    },
    /// The client is over its limit.
    Rejected {
        /// Time until the current window ends
        retry_after: Duration,
        /// When the current window ends
        reset_at: Instant,
    },
}

/// Fixed-window rate limiter.
///
/// Each client's check-then-increment runs under that record's map shard lock,
/// so concurrent requests from one client never double count or lose updates.
pub struct RateLimiter {
    records: DashMap<String, RateRecord>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Creates a limiter.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            records: DashMap::new(),
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Counts a request from `client` and decides whether it may proceed.
    pub fn admit(&self, client: &str) -> Admission {
        self.admit_at(client, Instant::now())
    }

    fn admit_at(&self, client: &str, now: Instant) -> Admission {
        let window = self.config.window;
        let mut record = self
            .records
            .entry(client.to_string())
            .or_insert_with(|| RateRecord {
                count: 0,
                window_reset_at: now + window,
            });

        if now > record.window_reset_at {
            record.count = 0;
            record.window_reset_at = now + window;
        }

        if record.count >= self.config.max_requests {
            return Admission::Rejected {
                retry_after: record.window_reset_at.saturating_duration_since(now),
                reset_at: record.window_reset_at,
            };
        }

        record.count += 1;
        Admission::Allowed {
            remaining: self.config.max_requests - record.count,
            reset_at: record.window_reset_at,
        }
    }

    /// Drops records whose window has ended.
    ///
    /// Such a record would be reset by its client's next request anyway, so
    /// removing it does not change any admission decision.
    pub fn sweep_stale(&self) -> usize {
        self.sweep_stale_at(Instant::now())
    }

    fn sweep_stale_at(&self, now: Instant) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.window_reset_at >= now);
        let removed = before.saturating_sub(self.records.len());
        if removed > 0 {
            debug!(removed, "Reclaimed stale rate-limit records");
        }
        removed
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.records.len()
    }
}

impl Sweepable for RateLimiter {
    fn sweep_expired(&self) -> usize {
        self.sweep_stale()
    }
}

/// Derives the client identity used as the rate-limit key.
///
/// Falls back to `"unknown"` so requests without a resolvable peer share one bucket
/// instead of bypassing the limiter.
pub fn client_identity(remote_addr: Option<SocketAddr>, headers: &HeaderMap, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        };
        if let Some(ip) = forwarded.or_else(real_ip) {
            return ip.to_string();
        }
    }

    remote_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
