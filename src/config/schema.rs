//! Configuration schema definitions.
//!
//! This module defines the complete tunable surface handed to the host
//! server. All types derive Serde traits so the resolved configuration can
//! be dumped for inspection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Access log format string handed to the host server:
/// remote host, identity, user, timestamp, request line, status, bytes,
/// referrer, user-agent, duration.
pub const DEFAULT_ACCESS_FORMAT: &str =
    r#"%(h)s %(l)s %(u)s %(t)s "%(r)s" %(s)s %(b)s "%(f)s" "%(a)s" %(D)s"#;

/// Resolved server configuration.
///
/// Built once by the loader, validated, then handed to the host server.
/// Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ServerConfig {
    /// Socket settings (bind address, accept backlog).
    pub socket: SocketConfig,

    /// Worker pool settings.
    pub workers: WorkerConfig,

    /// Log destinations and format.
    pub logging: LoggingConfig,

    /// Process identity and daemon settings.
    pub process: ProcessConfig,

    /// Optional TLS material for the host's listener.
    pub tls: Option<TlsConfig>,
}

/// Socket configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocketConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,

    /// Listen backlog passed to the host's accept socket.
    pub backlog: u32,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            backlog: 2048,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerConfig {
    /// Number of worker processes. Derived from CPU topology when no
    /// source sets it.
    pub count: u32,

    /// Worker concurrency model.
    pub class: WorkerClass,

    /// Maximum simultaneous connections per worker.
    pub connections: u32,

    /// Requests served before a worker is recycled (0 disables recycling).
    pub max_requests: u32,

    /// Random spread added to max_requests so workers don't recycle at once.
    pub max_requests_jitter: u32,

    /// Load the application before forking workers.
    pub preload_app: bool,

    /// Seconds a silent worker may run before the host kills it.
    pub timeout_seconds: u64,

    /// Seconds to hold a keep-alive connection open.
    pub keepalive_seconds: u64,

    /// Scratch directory for worker heartbeat files.
    pub tmp_dir_override: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);

        Self {
            count: derived_worker_count(cpus),
            class: WorkerClass::Sync,
            connections: 1000,
            max_requests: 1000,
            max_requests_jitter: 100,
            preload_app: true,
            timeout_seconds: 30,
            keepalive_seconds: 2,
            tmp_dir_override: None,
        }
    }
}

/// Worker count formula: two workers per CPU plus one, never below one.
pub fn derived_worker_count(cpus: usize) -> u32 {
    (cpus as u32).saturating_mul(2).saturating_add(1).max(1)
}

/// Worker concurrency model offered by the host server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerClass {
    /// One request at a time per worker process.
    Sync,
    /// Thread pool per worker process.
    Gthread,
    /// Greenlet-based cooperative workers.
    Eventlet,
    /// Greenlet-based cooperative workers (gevent hub).
    Gevent,
}

impl fmt::Display for WorkerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerClass::Sync => write!(f, "sync"),
            WorkerClass::Gthread => write!(f, "gthread"),
            WorkerClass::Eventlet => write!(f, "eventlet"),
            WorkerClass::Gevent => write!(f, "gevent"),
        }
    }
}

impl FromStr for WorkerClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sync" => Ok(WorkerClass::Sync),
            "gthread" => Ok(WorkerClass::Gthread),
            "eventlet" => Ok(WorkerClass::Eventlet),
            "gevent" => Ok(WorkerClass::Gevent),
            other => Err(format!("unknown worker class `{other}`")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    /// Access log file. None means the host logs to stdout.
    pub access_log_path: Option<PathBuf>,

    /// Error log file. None means the host logs to stderr.
    pub error_log_path: Option<PathBuf>,

    /// Minimum severity the host should emit.
    pub level: LogLevel,

    /// Access log line format.
    pub access_format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log_path: None,
            error_log_path: None,
            level: LogLevel::Info,
            access_format: DEFAULT_ACCESS_FORMAT.to_string(),
        }
    }
}

/// Log severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

/// Process identity and daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessConfig {
    /// Process title shown in the process table.
    pub name: String,

    /// Detach from the controlling terminal.
    pub daemonize: bool,

    /// Where the host writes its master pid.
    pub pid_file_path: Option<PathBuf>,

    /// Drop privileges to this user after binding.
    pub run_as_user: Option<String>,

    /// Drop privileges to this group after binding.
    pub run_as_group: Option<String>,

    /// Let workers inherit the master's stdout/stderr.
    pub enable_stdio_inheritance: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            name: "prefork".to_string(),
            daemonize: false,
            pid_file_path: None,
            run_as_user: None,
            run_as_group: None,
            enable_stdio_inheritance: false,
        }
    }
}

/// TLS material for the host's listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}
