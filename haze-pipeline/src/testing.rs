//! In-memory collaborators for pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use haze_core::{
    DecodeParams, EncodeParams, FetchError, FetchedImage, FingerprintCodec, FingerprintResult,
    HazeError, ImageMetadata, ImageSource, Result,
};

/// Codec that counts calls and derives fingerprints from input length.
#[derive(Default)]
pub struct CountingCodec {
    encodes: AtomicUsize,
    decodes: AtomicUsize,
    last_params: Mutex<Option<(u32, u32)>>,
}

impl CountingCodec {
    /// Input that makes `encode` fail.
    pub const CORRUPT: &'static [u8] = b"corrupt";

    pub fn encode_calls(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }

    pub fn decode_calls(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<(u32, u32)> {
        *self.last_params.lock()
    }
}

impl FingerprintCodec for CountingCodec {
    fn encode(&self, image: &[u8], params: EncodeParams) -> Result<FingerprintResult> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock() = Some((params.component_x(), params.component_y()));

        if image == Self::CORRUPT {
            return Err(HazeError::Transform("corrupt image".into()));
        }

        Ok(FingerprintResult {
            fingerprint: format!("fp{}-{}x{}", image.len(), params.component_x(), params.component_y()),
            metadata: ImageMetadata {
                width: 10,
                height: 10,
                format: "png".into(),
                size: image.len(),
                component_x: params.component_x(),
                component_y: params.component_y(),
            },
        })
    }

    fn decode(&self, fingerprint: &str, params: DecodeParams) -> Result<Bytes> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(format!(
            "{}@{}x{}x{}",
            fingerprint,
            params.width(),
            params.height(),
            params.punch()
        )))
    }
}

/// Canned response for one URL.
pub struct Canned {
    url: String,
    delay: Duration,
    response: std::result::Result<FetchedImage, FetchError>,
}

impl Canned {
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// An `image/png` response whose body is `body`.
pub fn png_source(url: &str, body: &'static [u8]) -> Canned {
    Canned {
        url: url.to_string(),
        delay: Duration::ZERO,
        response: Ok(FetchedImage {
            url: url.to_string(),
            content_type: "image/png".into(),
            bytes: Bytes::from_static(body),
        }),
    }
}

/// Image source serving canned responses; unknown URLs fail with a network error.
#[derive(Default)]
pub struct FakeSource {
    responses: HashMap<String, Canned>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, canned: Canned) -> Self {
        self.responses.insert(canned.url.clone(), canned);
        self
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(
            url.to_string(),
            Canned {
                url: url.to_string(),
                delay: Duration::ZERO,
                response: Err(error),
            },
        );
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ImageSource for FakeSource {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedImage, FetchError> {
        *self.fetches.lock().entry(url.to_string()).or_default() += 1;

        let Some(canned) = self.responses.get(url) else {
            return Err(FetchError::Network(format!("no route to {}", url)));
        };
        if !canned.delay.is_zero() {
            tokio::time::sleep(canned.delay).await;
        }
        canned.response.clone()
    }
}
