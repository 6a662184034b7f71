//! TCP client for the collection server.
//!
//! Each call opens a connection, sends one request, half-closes and reads the
//! single response line.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::{Request, Response};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Server sent an invalid response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Server did not answer within {0:?}")]
    Timeout(Duration),
}

pub struct Client {
    addr: SocketAddr,
    timeout: Duration,
}

impl Client {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send `request` and wait for its response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let mut payload = request.to_json().map_err(ClientError::Encode)?;
        payload.push(b'\n');
        let raw = self.send_raw(&payload).await?;
        serde_json::from_slice(&raw).map_err(ClientError::Decode)
    }

    /// Send arbitrary bytes and return whatever the server writes back.
    pub async fn send_raw(&self, payload: &[u8]) -> Result<Vec<u8>, ClientError> {
        let exchange = async {
            let mut stream = TcpStream::connect(self.addr).await?;
            stream.write_all(payload).await?;
            stream.shutdown().await?;

            let mut out = Vec::new();
            stream.read_to_end(&mut out).await?;
            Ok::<_, std::io::Error>(out)
        };

        let out = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;
        tracing::debug!(addr = %self.addr, bytes = out.len(), "Response received");
        Ok(out)
    }
}
