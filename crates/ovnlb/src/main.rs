mod applier;
mod cli;
mod error;

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ovnlb_api::{NetworkClient, UpstreamClient};
use ovnlb_config::{Config, endpoint_url, load_config, resolve_token};
use ovnlb_core::{BackendSnapshot, BackendStore, Driver};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "ovnlb-db-sync", &mut std::io::stdout());
        return;
    }

    init_tracing(cli.debug_requested());

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Logs go to stderr; stdout carries the change requests.
fn init_tracing(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let filters = cli::parse_filters(&cli.filters);
    let config = load_config(cli.config.as_deref())?;

    let (upstream, network) = build_clients(&config)?;
    let store = load_store(&config)?;

    let (driver, rx) = Driver::new(
        Arc::new(store),
        Arc::new(network),
        Arc::new(upstream),
        config.driver_config(),
    );
    let applier = tokio::spawn(applier::write_json_lines(rx, tokio::io::stdout()));

    let report = driver.sync(&filters).await;
    drop(driver);
    let written = applier.await.map_err(|e| CliError::Sync {
        message: format!("applier task failed: {e}"),
    })??;
    let report = report?;

    for failure in &report.failed {
        warn!(lb_id = %failure.lb_id, error = %failure.error, "load balancer not synced");
    }
    info!(
        synced = report.synced.len(),
        recreated = report.recreated.len(),
        failed = report.failed.len(),
        requests = written,
        "sync complete"
    );
    Ok(())
}

fn build_clients(config: &Config) -> Result<(UpstreamClient, NetworkClient), CliError> {
    let transport = config.transport_config();

    let upstream = UpstreamClient::from_token(
        endpoint_url(&config.upstream, "upstream")?,
        &resolve_token(&config.upstream, "upstream")?,
        &transport,
    )?;
    let network = NetworkClient::from_token(
        endpoint_url(&config.network, "network")?,
        &resolve_token(&config.network, "network")?,
        &transport,
    )?;
    Ok((upstream, network))
}

fn load_store(config: &Config) -> Result<BackendStore, CliError> {
    let Some(path) = config.backend.snapshot.as_deref() else {
        warn!("no backend snapshot configured, every load balancer will be recreated");
        return Ok(BackendStore::new());
    };
    let snapshot = BackendSnapshot::load(path)?;
    info!(
        path = %path.display(),
        load_balancers = snapshot.load_balancers.len(),
        "backend snapshot loaded"
    );
    Ok(BackendStore::from_snapshot(snapshot))
}
