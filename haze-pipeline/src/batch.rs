//! Concurrent batch fingerprinting.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use haze_core::constants::MAX_BATCH_SIZE;
use haze_core::{BatchItem, BatchOutcome, EncodeParams, HazeError, ImageSource, Result};

use crate::pipeline::FingerprintPipeline;

/// Fans a list of URLs out over the pipeline.
///
/// Each source runs as its own task. A failure (fetch, content type, size, codec,
/// or even a panic) is recorded on that source's item and never affects siblings.
pub struct BatchOrchestrator {
    pipeline: Arc<FingerprintPipeline>,
    source: Arc<dyn ImageSource>,
    max_batch: usize,
}

impl BatchOrchestrator {
    /// Creates an orchestrator accepting up to 10 URLs per batch.
    pub fn new(pipeline: Arc<FingerprintPipeline>, source: Arc<dyn ImageSource>) -> Self {
        Self {
            pipeline,
            source,
            max_batch: MAX_BATCH_SIZE,
        }
    }

    /// Maximum number of URLs accepted per batch.
    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// Processes `urls` concurrently and returns one item per URL, in input order.
    ///
    /// The only whole-batch failure is a `Validation` error for an empty or
    /// oversized list, returned before any work starts.
    #[instrument(skip(self, urls), fields(total = urls.len()))]
    pub async fn process(&self, urls: Vec<String>, params: EncodeParams) -> Result<Vec<BatchItem>> {
        if urls.is_empty() {
            return Err(HazeError::Validation("urls must be a non-empty array".into()));
        }
        if urls.len() > self.max_batch {
            return Err(HazeError::Validation(format!(
                "a batch may contain at most {} urls, got {}",
                self.max_batch,
                urls.len()
            )));
        }

        // Handles stay in input order; slot i is filled by source i whatever
        // order the tasks finish in.
        let handles: Vec<_> = urls
            .iter()
            .cloned()
            .map(|url| {
                let pipeline = self.pipeline.clone();
                let source = self.source.clone();
                tokio::spawn(async move { pipeline.encode_url(source.as_ref(), &url, params).await })
            })
            .collect();

        let settled = join_all(handles).await;

        let items: Vec<BatchItem> = urls
            .into_iter()
            .zip(settled)
            .map(|(url, joined)| {
                let outcome = match joined {
                    Ok(Ok(encoded)) => BatchOutcome::Success {
                        result: encoded.result,
                        cached: encoded.cached,
                    },
                    Ok(Err(err)) => failure(&url, &err),
                    Err(join_err) => {
                        warn!(url = %url, error = %join_err, "Batch task aborted");
                        BatchOutcome::Failure {
                            error: "processing task aborted".into(),
                            details: "internal error".into(),
                        }
                    }
                };
                BatchItem { url, outcome }
            })
            .collect();

        info!(
            total_urls = items.len(),
            success_count = items.iter().filter(|i| i.is_success()).count(),
            component_x = params.component_x(),
            component_y = params.component_y(),
            "Batch processing complete"
        );

        Ok(items)
    }
}

fn failure(url: &str, err: &HazeError) -> BatchOutcome {
    let recoverable = matches!(err, HazeError::Fetch(fetch) if fetch.is_recoverable());
    warn!(url = %url, error = %err, recoverable, "Batch item failed");

    let details = match err {
        HazeError::Fetch(fetch) => fetch.details(),
        HazeError::Validation(_) => "invalid input".into(),
        HazeError::Transform(_) => "transform error".into(),
        HazeError::Internal(_) => "internal error".into(),
    };
    BatchOutcome::Failure {
        error: err.to_string(),
        details,
    }
}
