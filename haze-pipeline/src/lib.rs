//! Fingerprint pipeline and batch orchestration for haze.
//!
//! The pipeline consults the shared result cache before doing any expensive work
//! and writes back after; the orchestrator fans a batch of URLs out over the
//! pipeline and collects per-source outcomes in input order.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod batch;
mod pipeline;

#[cfg(test)]
mod testing;

pub use batch::BatchOrchestrator;
pub use pipeline::{CachedPayload, Encoded, FingerprintPipeline, ResultCache};
