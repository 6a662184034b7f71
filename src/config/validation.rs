//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits sane)
//! - Check addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// Smallest request limit that still fits a minimal request.
const MIN_REQUEST_BYTES: usize = 64;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field, message: String| errors.push(ValidationError { field, message });

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        fail(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        );
    }
    if config.listener.max_connections == 0 {
        fail("listener.max_connections", "must be greater than 0".into());
    }
    if config.storage.data_dir.as_os_str().is_empty() {
        fail("storage.data_dir", "must not be empty".into());
    }
    if config.timeouts.idle_secs == 0 {
        fail("timeouts.idle_secs", "must be greater than 0".into());
    }
    if config.protocol.max_request_bytes < MIN_REQUEST_BYTES {
        fail(
            "protocol.max_request_bytes",
            format!("must be at least {MIN_REQUEST_BYTES}"),
        );
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        fail(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "localhost".into();
        config.listener.max_connections = 0;
        config.timeouts.idle_secs = 0;
        config.protocol.max_request_bytes = 10;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "listener.max_connections",
                "timeouts.idle_secs",
                "protocol.max_request_bytes",
            ]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
