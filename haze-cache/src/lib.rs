//! Content-addressed TTL cache for haze.
//!
//! - [`key`]: derives deterministic cache keys from image bytes, URLs, and render parameters
//! - [`TtlCache`]: in-memory map with per-entry expiry and lazy eviction on read
//! - [`spawn_sweeper`]: background task that reclaims expired entries on a fixed interval

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

mod cache;
pub mod key;
mod sweeper;

pub use cache::{CacheConfig, CacheStats, TtlCache};
pub use key::{key_for_bytes, key_for_decode, key_for_url, CacheKey};
pub use sweeper::{spawn_sweeper, Sweepable};
