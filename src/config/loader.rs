//! Configuration loading and source merging.
//!
//! Sources, lowest precedence first: built-in defaults, an optional flat
//! `key = value` defaults file, then environment variables. Each override
//! key is the file key uppercased (`workers` / `WORKERS`).

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::config::env::Environment;
use crate::config::schema::{LogLevel, ServerConfig, TlsConfig, WorkerClass};
use crate::config::validation::{validate_config, ValidationError};
use crate::hooks::HookRegistry;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: String, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, message } => {
                write!(f, "Invalid value for {}: {}", key, message)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Overrides gathered from a single source. Later sources win per field.
///
/// Field names double as the defaults-file keys; the environment uses the
/// same names uppercased.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigOverrides {
    bind_address: Option<String>,
    backlog: Option<u32>,
    workers: Option<u32>,
    worker_class: Option<WorkerClass>,
    worker_connections: Option<u32>,
    max_requests: Option<u32>,
    max_requests_jitter: Option<u32>,
    preload_app: Option<bool>,
    timeout: Option<u64>,
    keepalive: Option<u64>,
    worker_tmp_dir: Option<PathBuf>,
    access_log: Option<PathBuf>,
    error_log: Option<PathBuf>,
    log_level: Option<LogLevel>,
    access_format: Option<String>,
    proc_name: Option<String>,
    daemon: Option<bool>,
    pid_file: Option<PathBuf>,
    user: Option<String>,
    group: Option<String>,
    enable_stdio_inheritance: Option<bool>,
    certfile: Option<PathBuf>,
    keyfile: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Fold this source into the config. TLS paths accumulate separately
    /// because the pair is only resolved once every source has spoken.
    fn apply(
        self,
        config: &mut ServerConfig,
        cert: &mut Option<PathBuf>,
        key: &mut Option<PathBuf>,
    ) {
        if let Some(v) = self.bind_address {
            config.socket.bind_address = v;
        }
        if let Some(v) = self.backlog {
            config.socket.backlog = v;
        }
        if let Some(v) = self.workers {
            config.workers.count = v;
        }
        if let Some(v) = self.worker_class {
            config.workers.class = v;
        }
        if let Some(v) = self.worker_connections {
            config.workers.connections = v;
        }
        if let Some(v) = self.max_requests {
            config.workers.max_requests = v;
        }
        if let Some(v) = self.max_requests_jitter {
            config.workers.max_requests_jitter = v;
        }
        if let Some(v) = self.preload_app {
            config.workers.preload_app = v;
        }
        if let Some(v) = self.timeout {
            config.workers.timeout_seconds = v;
        }
        if let Some(v) = self.keepalive {
            config.workers.keepalive_seconds = v;
        }
        if let Some(v) = self.worker_tmp_dir {
            config.workers.tmp_dir_override = Some(v);
        }
        if let Some(v) = self.access_log {
            config.logging.access_log_path = Some(v);
        }
        if let Some(v) = self.error_log {
            config.logging.error_log_path = Some(v);
        }
        if let Some(v) = self.log_level {
            config.logging.level = v;
        }
        if let Some(v) = self.access_format {
            config.logging.access_format = v;
        }
        if let Some(v) = self.proc_name {
            config.process.name = v;
        }
        if let Some(v) = self.daemon {
            config.process.daemonize = v;
        }
        if let Some(v) = self.pid_file {
            config.process.pid_file_path = Some(v);
        }
        if let Some(v) = self.user {
            config.process.run_as_user = Some(v);
        }
        if let Some(v) = self.group {
            config.process.run_as_group = Some(v);
        }
        if let Some(v) = self.enable_stdio_inheritance {
            config.process.enable_stdio_inheritance = v;
        }
        if let Some(v) = self.certfile {
            *cert = Some(v);
        }
        if let Some(v) = self.keyfile {
            *key = Some(v);
        }
    }
}

/// Load and validate configuration from the environment alone.
pub fn load(env: &Environment) -> Result<ServerConfig, ConfigError> {
    load_inner(env, None)
}

/// Load and validate configuration from a defaults file plus the
/// environment. Environment values win.
pub fn load_with_file(env: &Environment, path: &Path) -> Result<ServerConfig, ConfigError> {
    load_inner(env, Some(path))
}

/// Produce the validated configuration together with the default hook
/// registry, ready to hand to the host server.
pub fn build(env: &Environment) -> Result<(ServerConfig, HookRegistry), ConfigError> {
    Ok((load(env)?, HookRegistry::with_defaults()))
}

/// Like [`build`], with a defaults file underneath the environment.
pub fn build_with_file(
    env: &Environment,
    path: &Path,
) -> Result<(ServerConfig, HookRegistry), ConfigError> {
    Ok((load_with_file(env, path)?, HookRegistry::with_defaults()))
}

fn load_inner(env: &Environment, file: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::default();
    let mut cert = None;
    let mut key = None;

    if let Some(path) = file {
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let overrides: ConfigOverrides = toml::from_str(&content).map_err(ConfigError::Parse)?;
        overrides.apply(&mut config, &mut cert, &mut key);
    }

    env_overrides(env)?.apply(&mut config, &mut cert, &mut key);

    let mut errors = Vec::new();
    config.tls = match (cert, key) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig {
            cert_path,
            key_path,
        }),
        (None, None) => None,
        _ => {
            errors.push(ValidationError::IncompleteTls);
            None
        }
    };

    if let Err(more) = validate_config(&config) {
        errors.extend(more);
    }
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    Ok(config)
}

/// Gather overrides from the environment snapshot.
fn env_overrides(env: &Environment) -> Result<ConfigOverrides, ConfigError> {
    Ok(ConfigOverrides {
        bind_address: env.get("BIND_ADDRESS").map(str::to_owned),
        backlog: parse_env(env, "BACKLOG")?,
        workers: parse_env(env, "WORKERS")?,
        worker_class: parse_env(env, "WORKER_CLASS")?,
        worker_connections: parse_env(env, "WORKER_CONNECTIONS")?,
        max_requests: parse_env(env, "MAX_REQUESTS")?,
        max_requests_jitter: parse_env(env, "MAX_REQUESTS_JITTER")?,
        preload_app: parse_env_bool(env, "PRELOAD_APP")?,
        timeout: parse_env(env, "TIMEOUT")?,
        keepalive: parse_env(env, "KEEPALIVE")?,
        worker_tmp_dir: env.get("WORKER_TMP_DIR").map(PathBuf::from),
        access_log: env.get("ACCESS_LOG").map(PathBuf::from),
        error_log: env.get("ERROR_LOG").map(PathBuf::from),
        log_level: parse_env(env, "LOG_LEVEL")?,
        access_format: env.get("ACCESS_FORMAT").map(str::to_owned),
        proc_name: env.get("PROC_NAME").map(str::to_owned),
        daemon: parse_env_bool(env, "DAEMON")?,
        pid_file: env.get("PID_FILE").map(PathBuf::from),
        user: env.get("USER_OVERRIDE").map(str::to_owned),
        group: env.get("GROUP_OVERRIDE").map(str::to_owned),
        enable_stdio_inheritance: parse_env_bool(env, "ENABLE_STDIO_INHERITANCE")?,
        certfile: env.get("CERTFILE").map(PathBuf::from),
        keyfile: env.get("KEYFILE").map(PathBuf::from),
    })
}

fn parse_env<T>(env: &Environment, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.get(key) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|e: T::Err| ConfigError::Env {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Booleans accept `true`/`false` and `1`/`0`, case-insensitively.
fn parse_env_bool(env: &Environment, key: &str) -> Result<Option<bool>, ConfigError> {
    match env.get(key) {
        None => Ok(None),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(ConfigError::Env {
                key: key.to_string(),
                message: format!("`{}` is not a boolean", other),
            }),
        },
    }
}
