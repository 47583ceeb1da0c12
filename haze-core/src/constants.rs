//! Service constants for haze.
//!
//! Limits that shape the HTTP contract live here so that every crate agrees on them.
//! Tunables that operators may want to change (TTLs, rate limits) have defaults here
//! and are overridden through the API configuration.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// BLURHASH COMPONENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Smallest component count accepted by the codec.
pub const MIN_COMPONENTS: u32 = 1;

/// Largest component count accepted by the codec.
pub const MAX_COMPONENTS: u32 = 9;

/// Horizontal components used when the caller does not specify any.
pub const DEFAULT_COMPONENT_X: u32 = 4;

/// Vertical components used when the caller does not specify any.
pub const DEFAULT_COMPONENT_Y: u32 = 3;

/// Images are shrunk to fit inside this square before encoding.
pub const ENCODE_WORKING_SIZE: u32 = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// DECODE BOUNDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default preview width in pixels.
pub const DEFAULT_DECODE_WIDTH: u32 = 32;

/// Default preview height in pixels.
pub const DEFAULT_DECODE_HEIGHT: u32 = 32;

/// Default contrast ("punch") factor.
pub const DEFAULT_PUNCH: f32 = 1.0;

/// Largest preview edge in pixels (inclusive).
pub const MAX_DECODE_DIMENSION: u32 = 1000;

/// Largest punch factor (inclusive). The lower bound is exclusive zero.
pub const MAX_PUNCH: f32 = 10.0;

/// `Cache-Control` max-age for rendered previews (24 hours).
pub const PREVIEW_MAX_AGE_SECS: u64 = 24 * 60 * 60;

// ═══════════════════════════════════════════════════════════════════════════════
// REMOTE FETCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Timeout for fetching a single remote image.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest remote image body accepted (10 MiB).
pub const FETCH_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Largest uploaded image accepted (5 MiB).
pub const UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Media-type prefix every fetched or uploaded image must carry.
pub const IMAGE_MEDIA_PREFIX: &str = "image/";

/// File extensions that look like images. Only used for a warning.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg"];

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of URLs in one batch request.
pub const MAX_BATCH_SIZE: usize = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE & ADMISSION DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default lifetime of a cached result (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default interval between background sweeps (10 minutes).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default number of requests a client may make per window.
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 60;

/// Default rate-limit window length (1 minute).
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
