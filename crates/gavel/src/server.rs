//! `GavelServer` builder and accept loop.
//!
//! Ties the layers together: transport → codec → room registry → room
//! actors.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gavel_auction::{AuctionConfig, Catalog, Clock, RoomManager, SystemClock};
use gavel_protocol::{Codec, JsonCodec};
use tokio::sync::Mutex;

use crate::GavelError;
use crate::handler::handle_connection;
use crate::settings::ServerSettings;
use crate::transport::{Transport, WebSocketTransport};

/// State shared by every connection task.
///
/// The registry lock is held only to create or look up a room; intents are
/// applied by the room's own actor after the lock is released.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    pub(crate) started: Instant,
}

impl<C: Codec> ServerState<C> {
    /// Milliseconds since the server started; stamped on every reply.
    pub(crate) fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting a Gavel server.
///
/// # Example
///
/// ```rust,no_run
/// use gavel::prelude::*;
///
/// # async fn start() -> Result<(), GavelError> {
/// let server = GavelServer::builder()
///     .bind("0.0.0.0:8080")
///     .config(AuctionConfig::default().with_countdown(20))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GavelServerBuilder {
    bind_addr: String,
    config: AuctionConfig,
    catalog: Option<Catalog>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
    seed: Option<u64>,
}

impl GavelServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            config: AuctionConfig::default(),
            catalog: None,
            clock: Arc::new(SystemClock),
            idle_timeout: ServerSettings::default().idle_timeout,
            seed: None,
        }
    }

    /// Starts from environment settings, loading the catalog file if one
    /// is named.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self, GavelError> {
        let mut builder = Self::new()
            .bind(&settings.bind_addr)
            .config(settings.auction_config(AuctionConfig::default()))
            .idle_timeout(settings.idle_timeout);
        if let Some(path) = &settings.catalog_path {
            builder = builder.catalog(Catalog::load_json(path)?);
        }
        Ok(builder)
    }

    /// Address to listen on; port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn config(mut self, config: AuctionConfig) -> Self {
        self.config = config;
        self
    }

    /// Player catalog shared by every room. Defaults to the built-in list.
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Connections that send nothing for this long are closed.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Makes queue shuffles reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener. Uses [`JsonCodec`] and [`WebSocketTransport`].
    pub async fn build(self) -> Result<GavelServer<JsonCodec>, GavelError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let catalog = Arc::new(self.catalog.unwrap_or_else(Catalog::builtin));
        let mut rooms = RoomManager::new(Arc::clone(&catalog), self.config, self.clock);
        if let Some(seed) = self.seed {
            rooms = rooms.with_seed(seed);
        }
        tracing::info!(
            players = catalog.len(),
            countdown_secs = rooms.config().countdown_secs,
            finalize = ?rooms.config().finalize_mode,
            linger_secs = rooms.config().ended_linger_secs,
            "auction rules loaded"
        );

        let state = Arc::new(ServerState {
            rooms: Mutex::new(rooms),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            started: Instant::now(),
        });

        Ok(GavelServer { transport, state })
    }
}

impl Default for GavelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gavel server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GavelServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl GavelServer<JsonCodec> {
    pub fn builder() -> GavelServerBuilder {
        GavelServerBuilder::new()
    }
}

impl<C: Codec> GavelServer<C> {
    pub fn local_addr(&self) -> Result<SocketAddr, GavelError> {
        Ok(self.transport.local_addr()?)
    }

    /// Accepts connections until the process is terminated.
    pub async fn run(self) -> Result<(), GavelError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes. Connections already
    /// accepted keep running on their own tasks.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), GavelError> {
        tracing::info!("gavel server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => {
                    tracing::info!("gavel server shutting down");
                    return Ok(());
                }
            }
        }
    }
}
