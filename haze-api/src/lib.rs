//! # Haze API Server
//!
//! REST API that turns images into blurhash placeholders and renders them back.
//!
//! ## Endpoints
//!
//! - `GET /`, `GET /health` - Liveness
//! - `POST /api/blurhash/upload` - Fingerprint an uploaded image (multipart field `image`)
//! - `POST /api/blurhash/url` - Fingerprint a remote image
//! - `POST /api/blurhash/batch` - Fingerprint up to 10 remote images
//! - `GET /api/blurhash/decode/:hash` - Render a blurhash as PNG
//! - `GET /api/blurhash/stats` - Cache and rate limiter totals
//!
//! Every route is rate limited per client and carries `X-RateLimit-*` headers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use haze_api::{ApiServer, ApiConfig};
//!
//! let server = ApiServer::new(ApiConfig::from_env())?;
//! server.run(([0, 0, 0, 0], 3000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod ratelimit;
mod routes;
mod state;

pub use error::ApiError;
pub use ratelimit::{client_identity, Admission, RateLimitConfig, RateLimiter};
pub use routes::create_router;
pub use state::{ApiConfig, AppState};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use haze_cache::{spawn_sweeper, Sweepable};
use haze_core::Result;

/// API server for haze.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server with the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self::from_state(AppState::new(config)?))
    }

    /// Creates a server around prepared state.
    pub fn from_state(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl-C.
    ///
    /// Starts the background sweepers for the result cache and the rate limiter.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        let sweep_every = self.state.config.cache.sweep_interval;
        let cache: Arc<dyn Sweepable> = self.state.cache().clone();
        let limiter: Arc<dyn Sweepable> = self.state.limiter.clone();
        let sweepers = [
            spawn_sweeper(cache, sweep_every, "result-cache"),
            spawn_sweeper(limiter, self.state.config.rate_limit.window, "rate-limiter"),
        ];

        info!("Haze API server listening on {}", addr);

        let served = axum::serve(
            listener,
            self.router().into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        for sweeper in sweepers {
            sweeper.abort();
        }
        info!("Haze API server stopped");
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Starts the API server with configuration from the environment.
pub async fn start_server(port: u16) -> std::io::Result<()> {
    let config = ApiConfig::from_env();
    let server = ApiServer::new(config).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    server.run(([0, 0, 0, 0], port)).await
}
