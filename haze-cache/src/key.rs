//! Cache key derivation.
//!
//! Three disjoint namespaces share one cache:
//!
//! ```text
//! img:<sha3-256(bytes)>:<x>:<y>
//! url:<sha3-256(url)>:<x>:<y>
//! decode:<width>:<height>:<punch>:<blurhash>
//! ```
//!
//! The blurhash alphabet contains `:`, so it is placed last where it cannot shift
//! the fixed fields before it.

use std::fmt;

use sha3::{Digest, Sha3_256};

use haze_core::{DecodeParams, EncodeParams};

const BYTES_PREFIX: &str = "img";
const URL_PREFIX: &str = "url";
const DECODE_PREFIX: &str = "decode";

/// Opaque cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn digest_hex(input: &[u8]) -> String {
    hex::encode(Sha3_256::digest(input))
}

/// Key for a fingerprint computed from raw image bytes.
pub fn key_for_bytes(bytes: &[u8], params: EncodeParams) -> CacheKey {
    CacheKey(format!(
        "{}:{}:{}:{}",
        BYTES_PREFIX,
        digest_hex(bytes),
        params.component_x(),
        params.component_y()
    ))
}

/// Key for a fingerprint computed from the image at `url`.
pub fn key_for_url(url: &str, params: EncodeParams) -> CacheKey {
    CacheKey(format!(
        "{}:{}:{}:{}",
        URL_PREFIX,
        digest_hex(url.as_bytes()),
        params.component_x(),
        params.component_y()
    ))
}

/// Key for a rendered preview. The blurhash is bounded in length, so it is used verbatim.
pub fn key_for_decode(fingerprint: &str, params: DecodeParams) -> CacheKey {
    CacheKey(format!(
        "{}:{}:{}:{}:{}",
        DECODE_PREFIX,
        params.width(),
        params.height(),
        params.punch(),
        fingerprint
    ))
}
