//! Remote image fetcher.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument, warn};
use url::Url;

use haze_core::constants::{FETCH_MAX_BYTES, FETCH_TIMEOUT, IMAGE_EXTENSIONS, IMAGE_MEDIA_PREFIX};
use haze_core::{FetchError, FetchedImage, HazeError, ImageSource};

/// Fetcher configuration.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Whole-request timeout (connect, headers, and body)
    pub timeout: Duration,
    /// Largest accepted body in bytes
    pub max_bytes: usize,
    /// `User-Agent` sent upstream
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: FETCH_TIMEOUT,
            max_bytes: FETCH_MAX_BYTES,
            user_agent: concat!("haze/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// Parses `raw` and checks that it is an `http`/`https` URL.
///
/// URLs whose path does not end in a known image extension are accepted with a
/// warning, since many image hosts serve extension-less paths.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: "scheme must be http or https".into(),
        });
    }

    let path = parsed.path().to_lowercase();
    if !IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        warn!(url = %raw, "URL has no image file extension");
    }

    Ok(parsed)
}

/// `reqwest`-backed [`ImageSource`].
pub struct HttpImageFetcher {
    config: FetchConfig,
    http_client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Creates a fetcher with default limits (10 s, 10 MiB).
    pub fn new() -> Result<Self, HazeError> {
        Self::with_config(FetchConfig::default())
    }

    /// Creates a fetcher with custom limits.
    pub fn with_config(config: FetchConfig) -> Result<Self, HazeError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HazeError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                seconds: self.config.timeout.as_secs(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl ImageSource for HttpImageFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let parsed = validate_url(url)?;

        let mut response = self
            .http_client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.to_ascii_lowercase().starts_with(IMAGE_MEDIA_PREFIX) {
            return Err(FetchError::NotImage { content_type });
        }

        let limit = self.config.max_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::TooLarge { limit });
        }

        // Content-Length may be absent or wrong, so the limit is enforced while reading.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url, size = body.len(), content_type = %content_type, "Fetched image");

        Ok(FetchedImage {
            url: url.to_string(),
            content_type,
            bytes: Bytes::from(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(route: &str, template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a.png").is_ok());
        assert!(validate_url("http://example.com/no-extension").is_ok());
        assert!(matches!(
            validate_url("ftp://example.com/a.png"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(validate_url("not a url"), Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_image() {
        let server = serve(
            "/a.png",
            ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/png"),
        )
        .await;

        let fetcher = HttpImageFetcher::new().unwrap();
        let image = fetcher.fetch(&format!("{}/a.png", server.uri())).await.unwrap();
        assert_eq!(image.bytes.as_ref(), &[1, 2, 3]);
        assert_eq!(image.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_fetch_non_2xx() {
        let server = serve("/missing.png", ResponseTemplate::new(404)).await;

        let fetcher = HttpImageFetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing.png", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status { status: 404 });
    }

    #[tokio::test]
    async fn test_fetch_not_image() {
        let server = serve(
            "/page.png",
            ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"),
        )
        .await;

        let fetcher = HttpImageFetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("{}/page.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotImage { content_type } if content_type == "text/html"));
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let server = serve(
            "/big.png",
            ResponseTemplate::new(200).set_body_raw(vec![0u8; 4096], "image/png"),
        )
        .await;

        let fetcher = HttpImageFetcher::with_config(FetchConfig {
            max_bytes: 1024,
            ..Default::default()
        })
        .unwrap();
        let err = fetcher
            .fetch(&format!("{}/big.png", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::TooLarge { limit: 1024 });
    }

    /// Serves one chunked response with no Content-Length header.
    async fn serve_chunked(chunks: usize, chunk_size: usize) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nTransfer-Encoding: chunked\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let chunk = vec![0u8; chunk_size];
            for _ in 0..chunks {
                let size_line = format!("{:x}\r\n", chunk_size);
                let framed = [size_line.as_bytes(), &chunk[..], &b"\r\n"[..]].concat();
                if socket.write_all(&framed).await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });
        format!("http://{}/stream.png", addr)
    }

    #[tokio::test]
    async fn test_fetch_too_large_without_content_length() {
        let url = serve_chunked(8, 512).await;

        let fetcher = HttpImageFetcher::with_config(FetchConfig {
            max_bytes: 1024,
            ..Default::default()
        })
        .unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err, FetchError::TooLarge { limit: 1024 });
    }

    #[tokio::test]
    async fn test_fetch_chunked_within_limit() {
        let url = serve_chunked(2, 256).await;

        let fetcher = HttpImageFetcher::with_config(FetchConfig {
            max_bytes: 1024,
            ..Default::default()
        })
        .unwrap();
        let image = fetcher.fetch(&url).await.unwrap();
        assert_eq!(image.bytes.len(), 512);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = serve(
            "/slow.png",
            ResponseTemplate::new(200)
                .set_body_raw(vec![1u8], "image/png")
                .set_delay(Duration::from_millis(500)),
        )
        .await;

        let fetcher = HttpImageFetcher::with_config(FetchConfig {
            timeout: Duration::from_millis(50),
            ..Default::default()
        })
        .unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_never_hits_network() {
        let fetcher = HttpImageFetcher::new().unwrap();
        let err = fetcher.fetch("javascript:alert(1)").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
