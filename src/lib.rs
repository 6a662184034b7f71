//! Funko collection server library.
//!
//! A TCP service where each connection carries one JSON request against a
//! user's collection and receives one JSON response. Collections live on disk
//! as one file per item under `<data_dir>/<user>/`.

// Core subsystems
pub mod config;
pub mod model;
pub mod net;
pub mod protocol;
pub mod server;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub mod client;

pub use config::schema::ServerConfig;
pub use lifecycle::Shutdown;
pub use server::Server;
