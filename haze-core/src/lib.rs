//! # Haze Core
//!
//! Core types, errors, and traits for the haze blurhash placeholder service.
//!
//! This crate provides the foundational building blocks used by all other haze crates:
//!
//! - **Types**: Encoding/decoding parameters, fingerprint results, batch items
//! - **Errors**: Typed error taxonomy (validation, upstream fetch, transform, internal)
//! - **Constants**: Service limits and defaults
//! - **Traits**: Collaborator interfaces (codec, image source) for testing and extension
//!
//! ## Example
//!
//! ```rust
//! use haze_core::EncodeParams;
//!
//! // Component counts are clamped into 1..=9
//! let params = EncodeParams::new(0, 15);
//! assert_eq!((params.component_x(), params.component_y()), (1, 9));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{FetchError, HazeError, Result};
pub use traits::*;
pub use types::*;
