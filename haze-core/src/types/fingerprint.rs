//! Fingerprint results and the images they are computed from.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Description of the source image a fingerprint was computed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// Original width in pixels
    pub width: u32,
    /// Original height in pixels
    pub height: u32,
    /// Detected container format (e.g. "png", "jpeg")
    pub format: String,
    /// Size of the encoded source in bytes
    pub size: usize,
    /// Horizontal components actually used
    pub component_x: u32,
    /// Vertical components actually used
    pub component_y: u32,
}

/// A blurhash plus the metadata of its source image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintResult {
    /// The blurhash string
    pub fingerprint: String,
    /// Source image description
    pub metadata: ImageMetadata,
}

/// Raw bytes acquired from a remote URL.
#[derive(Clone, Debug)]
pub struct FetchedImage {
    /// URL the bytes were fetched from
    pub url: String,
    /// Declared content type
    pub content_type: String,
    /// Response body
    pub bytes: Bytes,
}
