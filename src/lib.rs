//! Configuration front-end for a prefork HTTP application server.
//!
//! Validates and normalizes the server's tunables, exposes them as a typed
//! immutable value, and registers the lifecycle callbacks the host server
//! invokes around worker management. Everything else (accept loop, HTTP
//! parsing, forking, log rotation, signals) belongs to the host.

pub mod config;
pub mod hooks;

pub use config::schema::ServerConfig;
pub use config::{build, load, ConfigError};
pub use hooks::{HookContext, HookRegistry, LifecycleEvent};
