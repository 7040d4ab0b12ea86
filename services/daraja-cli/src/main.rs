//! Daraja command-line client
//!
//! Loads a TOML config, builds an `Mpesa` client, runs one operation and
//! prints the upstream JSON response to stdout. Logs go to stderr as JSON.

mod command;
mod config;
mod metrics;

use anyhow::{Context, Result};
use daraja::Mpesa;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::{Invocation, USAGE};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let prometheus = metrics::install_recorder();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match Invocation::parse(&args) {
        Ok(invocation) => invocation,
        Err(msg) => {
            eprintln!("{msg}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let config_path = Config::resolve_path(invocation.config_path.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let mut mpesa_config = config.to_mpesa_config();
    if let Some(environment) = invocation.environment {
        mpesa_config.environment = environment;
    }

    info!(
        environment = %mpesa_config.environment,
        short_code = %mpesa_config.short_code,
        initiator = mpesa_config.initiator_name.is_some(),
        "configuration loaded"
    );

    let mpesa = Mpesa::new(mpesa_config).context("invalid Daraja configuration")?;

    let operation = invocation.command.name();
    let result = invocation.command.run(&mpesa).await;

    if let Some(handle) = &prometheus {
        debug!(metrics = %handle.render(), "client counters");
    }

    match result {
        Ok(response) => {
            let rendered =
                serde_json::to_string_pretty(&response).context("failed to render response")?;
            println!("{rendered}");
            info!(operation, "operation completed");
            Ok(())
        }
        Err(e) => {
            error!(operation, error = %e, "operation failed");
            Err(e).with_context(|| format!("{operation} failed"))
        }
    }
}
