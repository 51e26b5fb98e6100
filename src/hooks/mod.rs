//! Lifecycle hook subsystem.
//!
//! # Data Flow
//! ```text
//! loader builds HookRegistry (default logging callbacks)
//!     → handed to the host server with the config
//!     → host invokes events from its worker-management threads:
//!         ready                 master finished booting
//!         worker_spawned_pre    about to fork a worker
//!         worker_spawned_post   worker forked
//!         worker_interrupted    worker got INT or QUIT
//! ```
//!
//! # Design Decisions
//! - Invocation is synchronous; callbacks must not block
//! - Callback failures (errors and panics) are logged, never propagated
//! - One callback per event; registering again replaces it

pub mod registry;

pub use registry::CallbackError;
pub use registry::HookContext;
pub use registry::HookRegistry;
pub use registry::LifecycleEvent;
