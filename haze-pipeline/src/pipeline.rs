//! Cache-aware adapter over the fingerprint codec.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument};

use haze_cache::{key_for_bytes, key_for_decode, key_for_url, TtlCache};
use haze_core::{
    DecodeParams, EncodeParams, FingerprintCodec, FingerprintResult, HazeError, ImageSource, Result,
};

/// Values stored in the result cache.
#[derive(Clone, Debug)]
pub enum CachedPayload {
    /// Encode result, keyed by image bytes or URL
    Fingerprint(FingerprintResult),
    /// Rendered PNG, keyed by blurhash and render parameters
    Preview(Bytes),
}

/// Process-wide result cache.
pub type ResultCache = TtlCache<CachedPayload>;

/// An encode result and whether it came from the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    /// Fingerprint and source metadata
    pub result: FingerprintResult,
    /// True when no codec work was performed
    pub cached: bool,
}

/// Encodes and decodes blurhashes through the shared [`ResultCache`].
///
/// Failures are never cached.
pub struct FingerprintPipeline {
    cache: Arc<ResultCache>,
    codec: Arc<dyn FingerprintCodec>,
}

impl FingerprintPipeline {
    /// Creates a pipeline over `codec` sharing `cache`.
    pub fn new(cache: Arc<ResultCache>, codec: Arc<dyn FingerprintCodec>) -> Self {
        Self { cache, codec }
    }

    /// Returns the shared cache.
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Fingerprints raw image bytes.
    ///
    /// `params` is already clamped by construction, so the cache key and the codec
    /// see the same component counts.
    #[instrument(skip(self, image), fields(size = image.len()))]
    pub async fn encode(&self, image: Bytes, params: EncodeParams) -> Result<Encoded> {
        let key = key_for_bytes(&image, params);
        if let Some(CachedPayload::Fingerprint(result)) = self.cache.get(&key) {
            return Ok(Encoded { result, cached: true });
        }

        let codec = self.codec.clone();
        let result = tokio::task::spawn_blocking(move || codec.encode(&image, params))
            .await
            .map_err(|e| HazeError::Internal(format!("encode task failed: {}", e)))??;

        self.cache.set(key, CachedPayload::Fingerprint(result.clone()));
        Ok(Encoded { result, cached: false })
    }

    /// Fingerprints the image at `url`, fetching it through `source` on a cache miss.
    ///
    /// The result is cached under both the URL key and the content key.
    #[instrument(skip(self, source))]
    pub async fn encode_url(
        &self,
        source: &dyn ImageSource,
        url: &str,
        params: EncodeParams,
    ) -> Result<Encoded> {
        let key = key_for_url(url, params);
        if let Some(CachedPayload::Fingerprint(result)) = self.cache.get(&key) {
            return Ok(Encoded { result, cached: true });
        }

        let fetched = source.fetch(url).await?;
        debug!(url, size = fetched.bytes.len(), content_type = %fetched.content_type, "Downloaded image");

        let encoded = self.encode(fetched.bytes, params).await?;
        self.cache.set(key, CachedPayload::Fingerprint(encoded.result.clone()));
        Ok(encoded)
    }

    /// Renders a blurhash into a PNG preview.
    pub async fn decode(&self, fingerprint: &str, params: DecodeParams) -> Result<Bytes> {
        let key = key_for_decode(fingerprint, params);
        if let Some(CachedPayload::Preview(png)) = self.cache.get(&key) {
            return Ok(png);
        }

        let codec = self.codec.clone();
        let hash = fingerprint.to_string();
        let png = tokio::task::spawn_blocking(move || codec.decode(&hash, params))
            .await
            .map_err(|e| HazeError::Internal(format!("decode task failed: {}", e)))??;

        self.cache.set(key, CachedPayload::Preview(png.clone()));
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haze_core::FetchError;

    use crate::testing::{png_source, CountingCodec, FakeSource};

    fn pipeline(codec: Arc<CountingCodec>) -> FingerprintPipeline {
        FingerprintPipeline::new(Arc::new(ResultCache::new()), codec)
    }

    #[tokio::test]
    async fn test_encode_second_call_is_cache_hit() {
        let codec = Arc::new(CountingCodec::default());
        let pipeline = pipeline(codec.clone());
        let image = Bytes::from_static(b"pixels");

        let first = pipeline.encode(image.clone(), EncodeParams::default()).await.unwrap();
        let second = pipeline.encode(image, EncodeParams::default()).await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.result, second.result);
        assert_eq!(codec.encode_calls(), 1);
    }

    #[tokio::test]
    async fn test_encode_different_params_miss() {
        let codec = Arc::new(CountingCodec::default());
        let pipeline = pipeline(codec.clone());
        let image = Bytes::from_static(b"pixels");

        pipeline.encode(image.clone(), EncodeParams::new(4, 3)).await.unwrap();
        pipeline.encode(image, EncodeParams::new(5, 3)).await.unwrap();

        assert_eq!(codec.encode_calls(), 2);
    }

    #[tokio::test]
    async fn test_encode_clamps_before_key_and_codec() {
        let codec = Arc::new(CountingCodec::default());
        let pipeline = pipeline(codec.clone());
        let image = Bytes::from_static(b"pixels");

        let encoded = pipeline.encode(image.clone(), EncodeParams::new(0, 15)).await.unwrap();
        assert_eq!(codec.last_params(), Some((1, 9)));
        assert_eq!(encoded.result.metadata.component_x, 1);
        assert_eq!(encoded.result.metadata.component_y, 9);

        // Same clamped key: no second codec call.
        let again = pipeline.encode(image, EncodeParams::new(1, 9)).await.unwrap();
        assert!(again.cached);
        assert_eq!(codec.encode_calls(), 1);
    }

    #[tokio::test]
    async fn test_transform_failure_not_cached() {
        let codec = Arc::new(CountingCodec::default());
        let pipeline = pipeline(codec.clone());
        let image = Bytes::from_static(CountingCodec::CORRUPT);

        for _ in 0..2 {
            let err = pipeline.encode(image.clone(), EncodeParams::default()).await.unwrap_err();
            assert!(matches!(err, HazeError::Transform(_)));
        }
        assert_eq!(codec.encode_calls(), 2);
        assert!(pipeline.cache().is_empty());
    }

    #[tokio::test]
    async fn test_encode_url_caches_by_url() {
        let codec = Arc::new(CountingCodec::default());
        let pipeline = pipeline(codec.clone());
        let source = FakeSource::new().with(png_source("https://img.test/a.png", b"aaa"));

        let first = pipeline
            .encode_url(&source, "https://img.test/a.png", EncodeParams::default())
            .await
            .unwrap();
        let second = pipeline
            .encode_url(&source, "https://img.test/a.png", EncodeParams::default())
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(source.fetch_count("https://img.test/a.png"), 1);
        assert_eq!(codec.encode_calls(), 1);
    }

    #[tokio::test]
    async fn test_encode_url_fetch_error_propagates() {
        let pipeline = pipeline(Arc::new(CountingCodec::default()));
        let source = FakeSource::new().with_error(
            "https://img.test/gone.png",
            FetchError::Status { status: 404 },
        );

        let err = pipeline
            .encode_url(&source, "https://img.test/gone.png", EncodeParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HazeError::Fetch(FetchError::Status { status: 404 })));
        assert!(pipeline.cache().is_empty());
    }

    #[tokio::test]
    async fn test_decode_cached_by_render_params() {
        let codec = Arc::new(CountingCodec::default());
        let pipeline = pipeline(codec.clone());
        let params = DecodeParams::new(32, 32, 1.0).unwrap();

        let a = pipeline.decode("LEHV6nWB2yk8", params).await.unwrap();
        let b = pipeline.decode("LEHV6nWB2yk8", params).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(codec.decode_calls(), 1);

        pipeline
            .decode("LEHV6nWB2yk8", DecodeParams::new(32, 32, 2.0).unwrap())
            .await
            .unwrap();
        assert_eq!(codec.decode_calls(), 2);
    }
}
