//! Batch results.

use super::FingerprintResult;

/// Outcome for one source of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The source was fingerprinted.
    Success {
        /// Fingerprint and metadata
        result: FingerprintResult,
        /// True when served from the result cache
        cached: bool,
    },
    /// The source failed; siblings are unaffected.
    Failure {
        /// Human-readable error
        error: String,
        /// Short classification (e.g. "HTTP 404")
        details: String,
    },
}

/// One entry of a batch response, in the caller's input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchItem {
    /// Source URL as given by the caller
    pub url: String,
    /// What happened to it
    pub outcome: BatchOutcome,
}

impl BatchItem {
    /// Returns true if this item carries a fingerprint.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Success { .. })
    }

    /// Returns the fingerprint result, if any.
    pub fn result(&self) -> Option<&FingerprintResult> {
        match &self.outcome {
            BatchOutcome::Success { result, .. } => Some(result),
            BatchOutcome::Failure { .. } => None,
        }
    }
}
