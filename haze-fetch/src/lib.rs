//! HTTP image fetching for haze.
//!
//! [`HttpImageFetcher`] implements [`haze_core::ImageSource`] on top of `reqwest`,
//! enforcing a per-request timeout, a maximum body size, and an `image/*` content type.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod fetcher;

pub use fetcher::{validate_url, FetchConfig, HttpImageFetcher};
