//! Haze CLI
//!
//! Runs the blurhash API server and encodes or renders blurhashes locally.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use haze_api::{ApiConfig, ApiServer};
use haze_codec::BlurhashCodec;
use haze_core::{DecodeParams, EncodeParams, FingerprintCodec, FingerprintResult, ImageSource};
use haze_fetch::HttpImageFetcher;

/// Haze - blurhash placeholders as a service
#[derive(Parser)]
#[command(name = "haze")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "HAZE_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000", env = "PORT")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Compute the blurhash of a local file or an http(s) URL
    Encode {
        /// Image path or URL
        source: String,
        /// Horizontal components (1-9)
        #[arg(short = 'x', long, default_value = "4")]
        component_x: i64,
        /// Vertical components (1-9)
        #[arg(short = 'y', long, default_value = "3")]
        component_y: i64,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a blurhash to a PNG file
    Decode {
        /// Blurhash string
        hash: String,
        /// Output PNG path
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,
        /// Width in pixels (1-1000)
        #[arg(long, default_value = "32")]
        width: i64,
        /// Height in pixels (1-1000)
        #[arg(long, default_value = "32")]
        height: i64,
        /// Contrast factor (0-10]
        #[arg(long, default_value = "1.0")]
        punch: f32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "haze=debug,info"
    } else {
        "haze=info,warn"
    };

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()));
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
        Commands::Encode {
            source,
            component_x,
            component_y,
            json,
        } => cmd_encode(&source, EncodeParams::new(component_x, component_y), json).await,
        Commands::Decode {
            hash,
            output,
            width,
            height,
            punch,
        } => cmd_decode(&hash, &output, width, height, punch).await,
    }
}

/// Run the API server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    println!("{}", "Starting haze API server...".cyan().bold());
    println!("   {} http://{}:{}", "Listening on:".green(), bind, port);
    println!("   {} http://{}:{}/health", "Health check:".dimmed(), bind, port);
    println!("\n   Press Ctrl+C to stop.\n");

    let config = ApiConfig::from_env();
    let server = ApiServer::new(config).context("Failed to initialize server")?;

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;
    server.run(addr).await?;

    Ok(())
}

/// Compute a blurhash
async fn cmd_encode(source: &str, params: EncodeParams, json: bool) -> Result<()> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let fetcher = HttpImageFetcher::new()?;
        fetcher
            .fetch(source)
            .await
            .with_context(|| format!("Failed to fetch {}", source))?
            .bytes
            .to_vec()
    } else {
        std::fs::read(source).with_context(|| format!("Failed to read {}", source))?
    };

    let codec = BlurhashCodec::new();
    let result = tokio::task::spawn_blocking(move || codec.encode(&bytes, params))
        .await
        .context("Encode task failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &FingerprintResult) {
    let meta = &result.metadata;
    println!("{}", result.fingerprint.green().bold());
    println!(
        "   {} {}x{} {} ({} bytes)",
        "Source:".dimmed(),
        meta.width,
        meta.height,
        meta.format,
        meta.size
    );
    println!(
        "   {} {}x{}",
        "Components:".dimmed(),
        meta.component_x,
        meta.component_y
    );
}

/// Render a blurhash to disk
async fn cmd_decode(hash: &str, output: &Path, width: i64, height: i64, punch: f32) -> Result<()> {
    let params = DecodeParams::new(width, height, punch)?;
    let codec = BlurhashCodec::new();
    let owned = hash.to_string();
    let png = tokio::task::spawn_blocking(move || codec.decode(&owned, params))
        .await
        .context("Decode task failed")??;

    std::fs::write(output, &png).with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "{} {} ({}x{}, {} bytes)",
        "Wrote".green(),
        output.display(),
        params.width(),
        params.height(),
        png.len()
    );
    Ok(())
}
