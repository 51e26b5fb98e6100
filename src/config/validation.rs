//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (backlog > 0, timeout > 0)
//! - Check daemon mode has somewhere to write its pid and errors
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is handed to the host server

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic violation in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backlog must be greater than zero")]
    ZeroBacklog,

    #[error("worker timeout must be greater than zero")]
    ZeroTimeout,

    #[error("worker count must be at least one")]
    ZeroWorkers,

    #[error("bind address `{value}` is not an ip:port pair")]
    UnparseableBindAddress { value: String },

    #[error("daemon mode requires a pid file path")]
    DaemonWithoutPidFile,

    #[error("daemon mode requires an error log path")]
    DaemonWithoutErrorLog,

    #[error("TLS requires both a certificate and a key path")]
    IncompleteTls,
}

/// Check every semantic rule and collect the violations.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.socket.backlog == 0 {
        errors.push(ValidationError::ZeroBacklog);
    }

    if config.socket.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::UnparseableBindAddress {
            value: config.socket.bind_address.clone(),
        });
    }

    if config.workers.timeout_seconds == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.workers.count == 0 {
        errors.push(ValidationError::ZeroWorkers);
    }

    if config.process.daemonize {
        if config.process.pid_file_path.is_none() {
            errors.push(ValidationError::DaemonWithoutPidFile);
        }
        if config.logging.error_log_path.is_none() {
            errors.push(ValidationError::DaemonWithoutErrorLog);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
