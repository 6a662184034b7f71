//! One connection's request/response exchange.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::net::{ConnectionId, ConnectionState};
use crate::observability::metrics;
use crate::protocol::frame::RequestDecoder;
use crate::protocol::{ProtocolError, Request, Response};
use crate::server::dispatcher::Dispatcher;

const READ_CHUNK: usize = 4096;

/// Per-connection limits taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_request_bytes: usize,
    pub idle: Duration,
}

/// Drives a single connection through its state machine.
pub struct Session<S> {
    id: ConnectionId,
    stream: S,
    state: ConnectionState,
    limits: SessionLimits,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: ConnectionId, stream: S, limits: SessionLimits) -> Self {
        Self {
            id,
            stream,
            state: ConnectionState::AwaitingData,
            limits,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(connection_id = %self.id, from = ?self.state, to = ?next, "State change");
        self.state = next;
    }

    /// Receive one request, answer it, and close our side.
    ///
    /// Returns an error only for socket failures; protocol problems are
    /// answered with an error response.
    pub async fn run(mut self, dispatcher: &Dispatcher) -> std::io::Result<ConnectionState> {
        let response = match self.receive().await {
            Ok(frame) => {
                self.transition(ConnectionState::Dispatching);
                match Request::parse(&frame) {
                    Ok(request) => dispatcher.dispatch(request).await,
                    Err(e) => self.reject(&e),
                }
            }
            Err(ProtocolError::Io(e)) => {
                self.transition(ConnectionState::Closed);
                return Err(e);
            }
            Err(e) => self.reject(&e),
        };

        self.transition(ConnectionState::Responding);
        self.stream.write_all(&response.to_line()).await?;
        self.stream.flush().await?;
        self.stream.shutdown().await?;
        self.transition(ConnectionState::Closed);
        Ok(self.state)
    }

    /// Buffer bytes until a complete request or end-of-input.
    async fn receive(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut decoder = RequestDecoder::new(self.limits.max_request_bytes);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let idle = self.limits.idle;
            let n = tokio::time::timeout(idle, self.stream.read(&mut chunk))
                .await
                .map_err(|_| ProtocolError::Timeout(idle))??;

            if n == 0 {
                tracing::trace!(bytes = decoder.buffered(), "Peer finished writing");
                return decoder.finish();
            }
            if self.state == ConnectionState::AwaitingData {
                self.transition(ConnectionState::Buffering);
            }
            if let Some(frame) = decoder.push(&chunk[..n])? {
                return Ok(frame);
            }
        }
    }

    fn reject(&self, err: &ProtocolError) -> Response {
        tracing::warn!(connection_id = %self.id, error = %err, "Rejecting request");
        metrics::record_rejected_request();
        Response::from(err)
    }
}
