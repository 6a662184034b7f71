//! Collection server.
//!
//! # Data Flow
//! ```text
//! Listener::accept (permit)
//!     → spawn per connection (tracked, instrumented span)
//!     → Session: read frame → Request::parse
//!     → Dispatcher: per-user lock → load → mutate → persist
//!     → Response line → half-close → drop permit
//! ```
//!
//! On shutdown the accept loop stops first; in-flight connections get
//! `timeouts.shutdown_secs` to finish.

pub mod dispatcher;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::net::{ConnectionTracker, Listener, ListenerError};

pub use dispatcher::Dispatcher;
pub use session::{Session, SessionLimits};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Accept loop plus shared request execution state.
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    tracker: ConnectionTracker,
    limits: SessionLimits,
    drain_timeout: Duration,
}

impl Server {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(&config.storage)),
            tracker: ConnectionTracker::new(),
            limits: SessionLimits {
                max_request_bytes: config.protocol.max_request_bytes,
                idle: Duration::from_secs(config.timeouts.idle_secs),
            },
            drain_timeout: Duration::from_secs(config.timeouts.shutdown_secs),
        }
    }

    /// Serve until `shutdown` fires, then wait for open connections to drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        tracing::info!(
            address = ?listener.local_addr().ok(),
            data_dir = ?self.dispatcher.data_dir(),
            "Server started"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Stopping accept loop");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let guard = self.tracker.track();
                        let span = tracing::info_span!(
                            "connection",
                            connection_id = %guard.id(),
                            request_id = %Uuid::new_v4(),
                            peer = %peer,
                        );
                        let dispatcher = Arc::clone(&self.dispatcher);
                        let limits = self.limits;

                        tokio::spawn(
                            async move {
                                let _permit = permit;
                                let session = Session::new(guard.id(), stream, limits);
                                if let Err(e) = session.run(&dispatcher).await {
                                    tracing::debug!(error = %e, "Connection ended with I/O error");
                                }
                                drop(guard);
                            }
                            .instrument(span),
                        );
                    }
                    // Per-connection accept failures (e.g. reset before accept)
                    // must not stop the server.
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }

        let open = self.tracker.active_count();
        if open > 0 {
            tracing::info!(open, "Waiting for connections to finish");
        }
        if !self.tracker.wait_for_drain(self.drain_timeout).await {
            tracing::warn!(
                open = self.tracker.active_count(),
                "Drain timed out, abandoning connections"
            );
        }
        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Address a client should dial for a listener bound to `addr`.
///
/// Wildcard binds are reached through loopback.
pub fn dial_address(addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        let loopback = match addr {
            SocketAddr::V4(_) => std::net::Ipv4Addr::LOCALHOST.into(),
            SocketAddr::V6(_) => std::net::Ipv6Addr::LOCALHOST.into(),
        };
        SocketAddr::new(loopback, addr.port())
    } else {
        addr
    }
}
