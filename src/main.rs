//! Config-check binary.
//!
//! Loads the configuration the way the host server would (defaults →
//! optional defaults file → environment), validates it, and prints the
//! resolved result as JSON. Exits non-zero when validation rejects the
//! configuration, so deploy scripts can gate on it.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prefork_config::config::{build, build_with_file, Environment};

#[derive(Parser)]
#[command(name = "prefork-config")]
#[command(about = "Validate and print the resolved server configuration", long_about = None)]
struct Cli {
    /// Defaults file (flat key = value pairs) applied under the environment.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only validate; skip the resolved-config dump.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prefork_config=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let env = Environment::process();

    let result = match &cli.config {
        Some(path) => build_with_file(&env, path),
        None => build(&env),
    };

    let (config, _hooks) = match result {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            std::process::exit(1);
        }
    };

    tracing::info!(
        bind_address = %config.socket.bind_address,
        workers = config.workers.count,
        worker_class = %config.workers.class,
        timeout_seconds = config.workers.timeout_seconds,
        "Configuration loaded"
    );

    if !cli.quiet {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }

    Ok(())
}
