//! Embeddable server lifecycle.
//!
//! [`Server`] owns one [`Storage`] and one listener. Tests and the binary
//! both go through it:
//!
//! ```no_run
//! # async fn run() -> Result<(), gcstack_http::ServerError> {
//! use gcstack_core::GcsConfig;
//! use gcstack_http::Server;
//!
//! let config = GcsConfig::builder()
//!     .gateway_listen("127.0.0.1:0".to_owned())
//!     .in_memory(true)
//!     .build();
//! let mut server = Server::bind(config).await?;
//! server.start()?;
//! println!("listening on {}", server.base_url());
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gcstack_core::{GcsConfig, GcsServiceError, Storage};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::handlers::{GcsState, build_router};
use crate::service::GcsHttpService;

/// How long `stop` waits for in-flight connections before giving up on them.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while bringing a server up.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `gateway_listen` is not a socket address.
    #[error("invalid bind address: {0}")]
    InvalidAddress(String),

    /// The listener could not be bound.
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),

    /// Storage could not be opened or loaded.
    #[error("failed to open storage: {0}")]
    Storage(#[from] GcsServiceError),

    /// A configured endpoint prefix produced an invalid route pattern.
    #[error("invalid route pattern: {0}")]
    Router(#[from] regex::Error),

    /// `start` was called twice.
    #[error("server already started")]
    AlreadyStarted,
}

struct Running {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// A bound emulator instance.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    base_url: String,
    storage: Arc<Storage>,
    service: GcsHttpService,
    running: Option<Running>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("base_url", &self.base_url)
            .field("running", &self.running.is_some())
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Open storage and bind the listener. Port `0` picks a free port.
    ///
    /// Links in responses use the bound address; an unspecified IP
    /// (`0.0.0.0`, `::`) is reported as loopback.
    pub async fn bind(config: GcsConfig) -> Result<Self, ServerError> {
        let addr: SocketAddr = config
            .gateway_listen
            .parse()
            .map_err(|_| ServerError::InvalidAddress(config.gateway_listen.clone()))?;

        let storage = Arc::new(Storage::from_config(&config)?);
        let router = build_router(&config)?;
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let base_url = base_url_for(local_addr);

        info!(
            %local_addr,
            %base_url,
            in_memory = config.in_memory,
            "storage emulator bound"
        );

        let service = GcsHttpService::new(
            router,
            GcsState::new(Arc::clone(&storage), config),
            base_url.clone(),
        );

        Ok(Self {
            listener: Some(listener),
            local_addr,
            base_url,
            storage,
            service,
            running: None,
        })
    }

    /// Spawn the accept loop on the current runtime.
    pub fn start(&mut self) -> Result<(), ServerError> {
        let listener = self.listener.take().ok_or(ServerError::AlreadyStarted)?;
        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(serve(listener, self.service.clone(), shutdown_rx));
        self.running = Some(Running { shutdown, handle });
        Ok(())
    }

    /// Close the listener, drain connections and wait for the loop to end.
    ///
    /// A no-op if the server is not running.
    pub async fn stop(&mut self) {
        let Some(Running { shutdown, handle }) = self.running.take() else {
            return;
        };
        // The loop may already be gone if it panicked.
        let _ = shutdown.send(());
        if let Err(e) = handle.await {
            error!(error = %e, "accept loop terminated abnormally");
        }
    }

    /// The bound socket address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://{host}:{port}` of this server.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The storage instance this server serves.
    #[must_use]
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Clear all buckets, objects and sessions.
    pub fn wipe(&self) -> Result<(), GcsServiceError> {
        self.storage.wipe()
    }
}

fn base_url_for(addr: SocketAddr) -> String {
    let ip = addr.ip();
    if !ip.is_unspecified() {
        return format!("http://{addr}");
    }
    if ip.is_ipv4() {
        format!("http://127.0.0.1:{}", addr.port())
    } else {
        format!("http://[::1]:{}", addr.port())
    }
}

/// Run the accept loop until `shutdown` fires or its sender is dropped.
async fn serve(listener: TcpListener, service: GcsHttpService, mut shutdown: oneshot::Receiver<()>) {
    let graceful = GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let conn = http.serve_connection(TokioIo::new(stream), service.clone());
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            _ = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    drop(listener);
    if tokio::time::timeout(DRAIN_TIMEOUT, graceful.shutdown())
        .await
        .is_err()
    {
        warn!("timed out draining connections");
    } else {
        info!("all connections drained");
    }
}
