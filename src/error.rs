//! Startup and lifecycle errors for the relay server

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file: {0}")]
    LogFile(#[source] std::io::Error),

    #[error("Failed to build runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to build outbound HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_addr_of_closed() -> Result<SocketAddr, ServerError> {
        let addr = Err::<SocketAddr, _>(std::io::Error::other("socket closed"))?;
        Ok(addr)
    }

    #[test]
    fn test_io_errors_convert() {
        let err = local_addr_of_closed().unwrap_err();
        assert!(matches!(err, ServerError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: socket closed");
    }

    #[test]
    fn test_startup_variants_keep_source() {
        use std::error::Error as _;

        let err = ServerError::LogFile(std::io::Error::other("read-only"));
        assert_eq!(err.to_string(), "Failed to open log file: read-only");
        assert!(err.source().is_some());

        let err = ServerError::from(config::ConfigError::Message("bad key".to_string()));
        assert!(matches!(err, ServerError::Config(_)));
    }
}
