//! Integration tests: defaults, file + environment merging, validation,
//! and hook handoff.

use std::io::Write;

use tempfile::NamedTempFile;

use prefork_config::config::schema::{derived_worker_count, LogLevel, DEFAULT_ACCESS_FORMAT};
use prefork_config::config::{
    build, load, load_with_file, ConfigError, Environment, ValidationError, WorkerClass,
};
use prefork_config::{HookContext, LifecycleEvent};

fn defaults_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn empty_environment_yields_documented_defaults() {
    let config = load(&Environment::empty()).unwrap();

    assert_eq!(config.socket.bind_address, "127.0.0.1:8000");
    assert_eq!(config.socket.backlog, 2048);
    assert_eq!(config.workers.class, WorkerClass::Sync);
    assert_eq!(config.workers.connections, 1000);
    assert_eq!(config.workers.max_requests, 1000);
    assert_eq!(config.workers.max_requests_jitter, 100);
    assert!(config.workers.preload_app);
    assert_eq!(config.workers.timeout_seconds, 30);
    assert_eq!(config.workers.keepalive_seconds, 2);
    assert_eq!(config.logging.level, LogLevel::Info);
    assert_eq!(config.logging.access_format, DEFAULT_ACCESS_FORMAT);
    assert_eq!(config.process.name, "prefork");
    assert!(!config.process.daemonize);
    assert!(config.tls.is_none());
}

#[test]
fn worker_count_derived_from_cpu_topology_when_unset() {
    let cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    let config = load(&Environment::empty()).unwrap();
    assert_eq!(config.workers.count, derived_worker_count(cpus));
    assert!(config.workers.count >= 1);
}

#[test]
fn four_cpus_give_nine_workers() {
    assert_eq!(derived_worker_count(4), 9);
}

#[test]
fn daemon_without_pid_file_is_rejected() {
    let env = Environment::from_iter([("DAEMON", "true")]);

    match load(&env) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.contains(&ValidationError::DaemonWithoutPidFile));
            assert!(errors.contains(&ValidationError::DaemonWithoutErrorLog));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn daemon_with_pid_file_and_error_log_is_accepted() {
    let env = Environment::from_iter([
        ("DAEMON", "true"),
        ("PID_FILE", "/run/prefork/prefork.pid"),
        ("ERROR_LOG", "/var/log/prefork/error.log"),
    ]);

    let config = load(&env).unwrap();
    assert!(config.process.daemonize);
    assert_eq!(
        config.process.pid_file_path.as_deref(),
        Some(std::path::Path::new("/run/prefork/prefork.pid"))
    );
}

#[test]
fn environment_wins_over_defaults_file() {
    let file = defaults_file(
        r#"
        workers = 5
        proc_name = "billing-api"
        timeout = 60
        "#,
    );
    let env = Environment::from_iter([("WORKERS", "2")]);

    let config = load_with_file(&env, file.path()).unwrap();
    assert_eq!(config.workers.count, 2);
    assert_eq!(config.process.name, "billing-api");
    assert_eq!(config.workers.timeout_seconds, 60);
}

#[test]
fn reload_with_identical_inputs_is_idempotent() {
    let file = defaults_file(
        r#"
        bind_address = "0.0.0.0:8080"
        workers = 4
        log_level = "warning"
        "#,
    );
    let env = Environment::from_iter([("KEEPALIVE", "5")]);

    let first = load_with_file(&env, file.path()).unwrap();
    let second = load_with_file(&env, file.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn malformed_defaults_file_is_a_parse_error() {
    let file = defaults_file("workers = ");
    assert!(matches!(
        load_with_file(&Environment::empty(), file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn missing_defaults_file_is_an_io_error() {
    let result = load_with_file(
        &Environment::empty(),
        std::path::Path::new("/nonexistent/prefork.conf"),
    );
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn build_hands_over_config_and_hooks() {
    let (config, hooks) = build(&Environment::empty()).unwrap();
    assert!(config.workers.count >= 1);
    assert_eq!(hooks.len(), 4);

    // Every event is safe to fire as the host would.
    hooks.invoke(LifecycleEvent::Ready, &HookContext::server());
    hooks.invoke(LifecycleEvent::WorkerSpawnedPre, &HookContext::worker(100));
    hooks.invoke(LifecycleEvent::WorkerSpawnedPost, &HookContext::worker(100));
    hooks.invoke(LifecycleEvent::WorkerInterrupted, &HookContext::worker(100));
}

#[test]
fn misbehaving_hook_never_reaches_the_host() {
    let (_config, mut hooks) = build(&Environment::empty()).unwrap();
    hooks.register(LifecycleEvent::WorkerSpawnedPost, |_| {
        panic!("listener state corrupted");
    });

    // Must return normally despite the panic inside the callback.
    hooks.invoke(LifecycleEvent::WorkerSpawnedPost, &HookContext::worker(31337));
}
