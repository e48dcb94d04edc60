//! Bookshelf Core - configuration and shared error types
//!
//! This crate holds what every Bookshelf binary needs before it can serve a
//! request:
//! - Application configuration (server, database, token signing, logging)
//! - The core error type used during bootstrap

pub mod config;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that stop a Bookshelf server from starting
#[derive(Error, Debug)]
pub enum BookshelfError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, BookshelfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: BookshelfError = ConfigError::MissingRequired("JWT_ACCESS_SECRET".to_string()).into();
        assert!(matches!(err, BookshelfError::ConfigError(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required configuration: JWT_ACCESS_SECRET"
        );
    }
}
