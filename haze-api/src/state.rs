//! App state: shared cache, pipeline, fetcher, rate limiter, config.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use haze_cache::CacheConfig;
use haze_codec::BlurhashCodec;
use haze_core::constants::UPLOAD_MAX_BYTES;
use haze_core::{FingerprintCodec, ImageSource, Result};
use haze_fetch::{FetchConfig, HttpImageFetcher};
use haze_pipeline::{BatchOrchestrator, FingerprintPipeline, ResultCache};

use crate::ratelimit::{RateLimitConfig, RateLimiter};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Result cache TTL and sweep interval
    pub cache: CacheConfig,
    /// Admission control
    pub rate_limit: RateLimitConfig,
    /// Remote image limits
    pub fetch: FetchConfig,
    /// Largest accepted upload in bytes
    pub upload_max_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            fetch: FetchConfig::default(),
            upload_max_bytes: UPLOAD_MAX_BYTES,
        }
    }
}

impl ApiConfig {
    /// Loads `.env` if present, then reads `HAZE_*` variables over the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            cache: CacheConfig {
                default_ttl: env_secs("HAZE_CACHE_TTL_SECS").unwrap_or(defaults.cache.default_ttl),
                sweep_interval: env_secs("HAZE_CACHE_SWEEP_SECS")
                    .unwrap_or(defaults.cache.sweep_interval),
            },
            rate_limit: RateLimitConfig {
                max_requests: env_parse("HAZE_RATE_LIMIT_MAX")
                    .unwrap_or(defaults.rate_limit.max_requests),
                window: env_secs("HAZE_RATE_LIMIT_WINDOW_SECS").unwrap_or(defaults.rate_limit.window),
                trust_proxy_headers: std::env::var("HAZE_TRUST_PROXY")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(defaults.rate_limit.trust_proxy_headers),
            },
            fetch: FetchConfig {
                timeout: env_secs("HAZE_FETCH_TIMEOUT_SECS").unwrap_or(defaults.fetch.timeout),
                max_bytes: env_parse("HAZE_FETCH_MAX_BYTES").unwrap_or(defaults.fetch.max_bytes),
                ..defaults.fetch
            },
            upload_max_bytes: env_parse("HAZE_UPLOAD_MAX_BYTES").unwrap_or(defaults.upload_max_bytes),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).filter(|s| *s > 0).map(Duration::from_secs)
}

/// Shared state behind every handler.
pub struct AppState {
    /// Active configuration
    pub config: ApiConfig,
    /// Encode/decode through the result cache
    pub pipeline: Arc<FingerprintPipeline>,
    /// Batch fan-out over the pipeline
    pub batch: BatchOrchestrator,
    /// Remote image source
    pub fetcher: Arc<dyn ImageSource>,
    /// Per-client admission control
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Builds state with the blurhash codec and the HTTP fetcher.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let fetcher = HttpImageFetcher::with_config(config.fetch.clone())?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(BlurhashCodec::new()),
            Arc::new(fetcher),
        ))
    }

    /// Builds state around the given codec and image source.
    pub fn with_collaborators(
        config: ApiConfig,
        codec: Arc<dyn FingerprintCodec>,
        fetcher: Arc<dyn ImageSource>,
    ) -> Self {
        let cache = Arc::new(ResultCache::with_config(config.cache.clone()));
        let pipeline = Arc::new(FingerprintPipeline::new(cache, codec));
        let batch = BatchOrchestrator::new(pipeline.clone(), fetcher.clone());
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        Self {
            config,
            pipeline,
            batch,
            fetcher,
            limiter,
        }
    }

    /// The shared result cache.
    pub fn cache(&self) -> &Arc<ResultCache> {
        self.pipeline.cache()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.cache.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.rate_limit.max_requests, 60);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.fetch.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.upload_max_bytes, 5 * 1024 * 1024);
        assert!(!config.rate_limit.trust_proxy_headers);
    }

    #[test]
    fn test_state_shares_one_cache() {
        let state = AppState::new(ApiConfig::default()).unwrap();
        assert!(Arc::ptr_eq(state.cache(), state.pipeline.cache()));
        assert_eq!(state.batch.max_batch(), 10);
    }
}
