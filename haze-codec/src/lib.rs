//! Blurhash transform adapter for haze.
//!
//! Wraps the `image` crate (decode, shrink, PNG output) and the `blurhash` crate
//! behind [`haze_core::FingerprintCodec`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use haze_codec::BlurhashCodec;
//! use haze_core::{EncodeParams, FingerprintCodec};
//!
//! let codec = BlurhashCodec::new();
//! let result = codec.encode(&png_bytes, EncodeParams::default())?;
//! println!("{}", result.fingerprint);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod codec;
pub mod raster;

pub use codec::{validate_blurhash, BlurhashCodec};
