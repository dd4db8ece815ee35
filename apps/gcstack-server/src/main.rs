//! gcstack server - local Google Cloud Storage JSON API emulator.
//!
//! Serves bucket, object, upload and download endpoints backed by a local
//! directory (or memory) until interrupted.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_LISTEN=0.0.0.0:9023 gcstack-server
//! gcstack-server --health-check
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:9023` | Bind address |
//! | `STORAGE_BASE` | `.` | Parent directory of the storage root |
//! | `STORAGE_DIR` | `.cloudstorage` | Storage root directory name |
//! | `IN_MEMORY` | `false` | Keep all state in memory |
//! | `API_ENDPOINT` | `/storage/v1` | Metadata API prefix |
//! | `UPLOAD_ENDPOINT` | `/upload/storage/v1` | Upload API prefix |
//! | `DOWNLOAD_ENDPOINT` | `/download/storage/v1` | Download API prefix |
//! | `DEFAULT_LOCATION` | `US` | Location of new buckets |
//! | `PROJECT_NUMBER` | `1234` | Project number on bucket resources |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result};
use gcstack_core::GcsConfig;
use gcstack_http::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Address a local probe should connect to for a configured listen address.
fn probe_address(gateway_listen: &str) -> String {
    gateway_listen
        .replace("0.0.0.0", "127.0.0.1")
        .replace("[::]", "[::1]")
}

/// Whether a raw HTTP response is a healthy `/_health` answer.
fn is_healthy_response(response: &str) -> bool {
    response.starts_with("HTTP/1.1 200") && response.contains("\"status\":\"running\"")
}

/// Request `/_health` from a running server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /_health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Exit code for container health checks.
    if std::env::args().any(|a| a == "--health-check") {
        let config = GcsConfig::from_env();
        let healthy = run_health_check(&probe_address(&config.gateway_listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = GcsConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        storage_root = %config.storage_root().display(),
        in_memory = config.in_memory,
        api_endpoint = %config.api_endpoint,
        version = VERSION,
        "starting gcstack server",
    );

    let listen = config.gateway_listen.clone();
    let mut server = Server::bind(config)
        .await
        .with_context(|| format!("failed to start server on {listen}"))?;
    server.start()?;

    info!(addr = %server.local_addr(), base_url = server.base_url(), "listening for connections");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("received shutdown signal, draining connections");

    server.stop().await;
    info!("server stopped");

    Ok(())
}
