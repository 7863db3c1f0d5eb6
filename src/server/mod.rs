// Server module entry point
// Owns the listener and its lifecycle: bind, accept loop, stop, drain

pub mod connection;
pub mod listener;
pub mod signal;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::{AppState, Config};
use crate::error::ServerError;
use crate::logger;
use connection::{accept_connection, stopped};
pub use listener::create_listener;

/// Interval between active-connection checks while draining
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Cloneable handle used to stop a running [`RelayServer`]
#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl ServerHandle {
    /// Stop accepting connections. Idempotent; works before `run` starts too.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}

/// The relay server: a bound listener plus the state every connection shares
pub struct RelayServer {
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl RelayServer {
    /// Bind the configured address and build the shared state.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let addr = config.get_socket_addr().map_err(ServerError::Address)?;
        let listener =
            create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;
        let state = Arc::new(AppState::new(config)?);
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            listener,
            state,
            active_connections: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(shutdown),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Accept connections until stopped, then wait up to the configured grace
    /// period for in-flight connections before returning.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self {
            listener,
            state,
            active_connections,
            shutdown,
        } = self;
        let mut shutdown_rx = shutdown.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            accept_connection(
                                stream,
                                peer_addr,
                                &state,
                                &active_connections,
                                shutdown.subscribe(),
                            );
                        }
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }

                () = stopped(&mut shutdown_rx) => break,
            }
        }

        drop(listener);
        logger::log_shutdown_started(active_connections.load(Ordering::SeqCst));

        let grace = Duration::from_secs(state.config.server.shutdown_grace_secs);
        let deadline = tokio::time::Instant::now() + grace;
        while active_connections.load(Ordering::SeqCst) > 0 {
            if tokio::time::Instant::now() >= deadline {
                logger::log_warning(&format!(
                    "Shutdown grace period elapsed, dropping {} connection(s)",
                    active_connections.load(Ordering::SeqCst)
                ));
                break;
            }
            tokio::time::sleep(DRAIN_POLL).await;
        }

        logger::log_shutdown_complete();
        Ok(())
    }
}
