//! Lifecycle event registry.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;

/// Points in the host server's worker management where hooks fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Master finished booting and is about to spawn workers.
    Ready,
    /// The host is about to fork a worker.
    WorkerSpawnedPre,
    /// A worker finished forking.
    WorkerSpawnedPost,
    /// A worker received INT or QUIT.
    WorkerInterrupted,
}

impl LifecycleEvent {
    /// The host-facing event name.
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::Ready => "ready",
            LifecycleEvent::WorkerSpawnedPre => "worker_spawned_pre",
            LifecycleEvent::WorkerSpawnedPost => "worker_spawned_post",
            LifecycleEvent::WorkerInterrupted => "worker_interrupted",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the host knows at the moment it fires an event.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// Present for worker-scoped events, absent for `ready`.
    pub worker_pid: Option<u32>,
}

impl HookContext {
    /// Context for master-scoped events.
    pub fn server() -> Self {
        Self { worker_pid: None }
    }

    /// Context for worker-scoped events.
    pub fn worker(pid: u32) -> Self {
        Self {
            worker_pid: Some(pid),
        }
    }
}

/// Failure reported by a callback. Logged by the registry, never retried.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

type HookFn = Box<dyn Fn(&HookContext) -> Result<(), CallbackError> + Send + Sync>;

/// Named callback slots the host invokes at lifecycle points.
///
/// Invocation never raises past this boundary: errors and panics inside a
/// callback are logged and swallowed so the host's control flow is never
/// disturbed.
pub struct HookRegistry {
    slots: HashMap<LifecycleEvent, HookFn>,
}

impl HookRegistry {
    /// An empty registry with no callbacks.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// A registry with a logging callback installed for every event.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(LifecycleEvent::Ready, |_ctx: &HookContext| {
            tracing::info!("server is ready, spawning workers");
            Ok(())
        });
        registry.register(LifecycleEvent::WorkerSpawnedPre, |ctx: &HookContext| {
            tracing::info!(pid = ctx.worker_pid, "spawning worker");
            Ok(())
        });
        registry.register(LifecycleEvent::WorkerSpawnedPost, |ctx: &HookContext| {
            tracing::info!(pid = ctx.worker_pid, "worker spawned");
            Ok(())
        });
        registry.register(LifecycleEvent::WorkerInterrupted, |ctx: &HookContext| {
            tracing::info!(pid = ctx.worker_pid, "worker received INT or QUIT signal");
            Ok(())
        });
        registry
    }

    /// Install a callback for an event, replacing any existing one.
    pub fn register<F>(&mut self, event: LifecycleEvent, callback: F)
    where
        F: Fn(&HookContext) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.slots.insert(event, Box::new(callback));
    }

    /// Invoke the callback for an event, if one is registered.
    ///
    /// Always returns normally. A callback error is logged at error level;
    /// a panic is caught and logged the same way.
    pub fn invoke(&self, event: LifecycleEvent, context: &HookContext) {
        let Some(callback) = self.slots.get(&event) else {
            tracing::debug!(event = %event, "no hook registered");
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| callback(context))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(event = %event, error = %e, "lifecycle hook failed");
            }
            Err(panic) => {
                tracing::error!(
                    event = %event,
                    reason = panic_message(panic.as_ref()),
                    "lifecycle hook panicked"
                );
            }
        }
    }

    /// Number of events with a callback installed.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<&str> = self.slots.keys().map(|e| e.as_str()).collect();
        events.sort_unstable();
        f.debug_struct("HookRegistry").field("events", &events).finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn defaults_cover_every_event() {
        let registry = HookRegistry::with_defaults();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn registered_callback_sees_context() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_by_hook = seen.clone();

        let mut registry = HookRegistry::new();
        registry.register(LifecycleEvent::WorkerSpawnedPost, move |ctx| {
            seen_by_hook.store(ctx.worker_pid.unwrap_or(0), Ordering::SeqCst);
            Ok(())
        });

        registry.invoke(LifecycleEvent::WorkerSpawnedPost, &HookContext::worker(4242));
        assert_eq!(seen.load(Ordering::SeqCst), 4242);
    }

    #[test]
    fn callback_error_does_not_propagate() {
        let mut registry = HookRegistry::new();
        registry.register(LifecycleEvent::Ready, |_| {
            Err(CallbackError::new("readiness probe failed"))
        });

        registry.invoke(LifecycleEvent::Ready, &HookContext::server());
    }

    #[test]
    fn callback_panic_does_not_propagate() {
        let mut registry = HookRegistry::new();
        registry.register(LifecycleEvent::WorkerInterrupted, |_| {
            panic!("hook blew up");
        });

        registry.invoke(LifecycleEvent::WorkerInterrupted, &HookContext::worker(7));
    }

    #[test]
    fn invoking_unregistered_event_is_a_noop() {
        let registry = HookRegistry::new();
        registry.invoke(LifecycleEvent::Ready, &HookContext::server());
    }

    #[test]
    fn register_replaces_existing_slot() {
        let count = Arc::new(AtomicU32::new(0));

        let mut registry = HookRegistry::new();
        for _ in 0..2 {
            let count = count.clone();
            registry.register(LifecycleEvent::Ready, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        registry.invoke(LifecycleEvent::Ready, &HookContext::server());
        assert_eq!(registry.len(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_names_match_host_contract() {
        assert_eq!(LifecycleEvent::Ready.as_str(), "ready");
        assert_eq!(LifecycleEvent::WorkerSpawnedPre.as_str(), "worker_spawned_pre");
        assert_eq!(LifecycleEvent::WorkerSpawnedPost.as_str(), "worker_spawned_post");
        assert_eq!(LifecycleEvent::WorkerInterrupted.as_str(), "worker_interrupted");
    }
}
