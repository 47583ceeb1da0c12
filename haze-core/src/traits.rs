//! Collaborator interfaces for haze.
//!
//! The pipeline only talks to the outside world through these traits, so the
//! orchestration logic can be tested with in-memory fakes.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{FetchError, Result};
use crate::types::{DecodeParams, EncodeParams, FetchedImage, FingerprintResult};

// ═══════════════════════════════════════════════════════════════════════════════
// CODEC TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Image → blurhash transform and its inverse.
///
/// Implementations are CPU-bound and synchronous; callers on an async runtime
/// should run them on a blocking thread.
pub trait FingerprintCodec: Send + Sync {
    /// Decodes `image`, shrinks it, and computes its blurhash with `params`.
    ///
    /// The returned metadata describes the original image and records the
    /// component counts used.
    fn encode(&self, image: &[u8], params: EncodeParams) -> Result<FingerprintResult>;

    /// Renders `fingerprint` into an encoded preview image (PNG).
    fn decode(&self, fingerprint: &str, params: DecodeParams) -> Result<Bytes>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMAGE SOURCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Acquires image bytes from a URL.
///
/// Implementations enforce their own timeout and payload limits and must verify
/// that the response declares an `image/*` content type.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetches `url`.
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedImage, FetchError>;
}
