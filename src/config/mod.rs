//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → defaults file (flat key = value pairs, optional)
//!     → environment variables (same keys, uppercased)
//!     → loader.rs (merge, derive worker count)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ServerConfig (validated, immutable)
//!     → handed to the host server, inert thereafter
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the host owns everything afterwards
//! - All fields have defaults so an empty environment loads cleanly
//! - Validation separates syntactic (serde/FromStr) from semantic checks
//! - Loading is idempotent: equal inputs give field-wise-equal configs

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::Environment;
pub use loader::{build, build_with_file, load, load_with_file, ConfigError};
pub use schema::ServerConfig;
pub use schema::WorkerClass;
pub use validation::{validate_config, ValidationError};
