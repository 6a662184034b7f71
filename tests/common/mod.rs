//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use funko_server::client::Client;
use funko_server::config::ListenerConfig;
use funko_server::model::{Funko, FunkoGenre, FunkoType};
use funko_server::net::Listener;
use funko_server::server::ServerError;
use funko_server::{Server, ServerConfig, Shutdown};

/// A server running on an ephemeral port over a throwaway data directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub data_dir: TempDir,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with a config adjusted by `tune`. The bind address and data
    /// directory are always overridden.
    pub async fn start_with(tune: impl FnOnce(&mut ServerConfig)) -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.timeouts.shutdown_secs = 2;
        tune(&mut config);
        config.storage.data_dir = data_dir.path().to_path_buf();

        let listener = Listener::bind(&ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            max_connections: config.listener.max_connections,
        })
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let handle = tokio::spawn(Server::new(&config).run(listener, shutdown.subscribe()));

        Self {
            addr,
            data_dir,
            shutdown,
            handle,
        }
    }

    pub fn client(&self) -> Client {
        Client::new(self.addr).with_timeout(Duration::from_secs(10))
    }

    pub fn user_dir(&self, user: &str) -> std::path::PathBuf {
        self.data_dir.path().join(user)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

pub fn funko(name: &str, market_value: f64) -> Funko {
    Funko {
        id: String::new(),
        name: name.to_string(),
        description: format!("{name} figure"),
        kind: FunkoType::Pop,
        genre: FunkoGenre::Animation,
        franchise: "Guardians of the Galaxy".to_string(),
        number: 49,
        exclusive: false,
        market_value,
    }
}

/// Parse a stored item file.
pub fn read_item(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}
