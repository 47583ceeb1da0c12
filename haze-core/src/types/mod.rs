//! Domain types for haze.

mod batch;
mod fingerprint;
mod params;

pub use batch::{BatchItem, BatchOutcome};
pub use fingerprint::{FetchedImage, FingerprintResult, ImageMetadata};
pub use params::{DecodeParams, EncodeParams};
