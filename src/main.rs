/*!
 * Purger CLI - one purge pass per invocation
 *
 * Periodic execution (cron, systemd timer) is left to the deployment.
 */

use clap::Parser;
use purger::{
    config::{Credentials, PurgerConfig},
    core::{Ledger, RunOrchestrator, Thresholds},
    error::{PurgerError, Result, EXIT_SUCCESS},
    logging, HttpChatApi,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "purger")]
#[command(version, about = "Purge inactive users from Matrix discovery rooms", long_about = None)]
struct Cli {
    /// Homeserver URL, e.g. http://hostname
    #[arg(env = "MATRIX_SERVER", value_name = "SERVER")]
    server: String,

    /// JSON file with `username` and `password` of an admin account
    #[arg(short = 'c', long, env = "MATRIX_CREDENTIALS_FILE", value_name = "FILE")]
    credentials_file: PathBuf,

    /// TOML configuration file; command line flags take precedence
    #[arg(long = "config", env = "MATRIX_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Activity ledger location
    #[arg(long, env = "MATRIX_LEDGER", value_name = "FILE")]
    ledger: Option<PathBuf>,

    /// Older activity ledger to fold into the current one before the pass
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,

    /// Seconds an offline user may stay inactive before being purged
    #[arg(long, env = "MATRIX_THRESHOLD_SECS")]
    threshold_secs: Option<i64>,

    /// Minimum milliseconds between two homeserver calls
    #[arg(long, env = "MATRIX_PROBE_DELAY_MS")]
    probe_delay_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, env = "MATRIX_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Network id to track (repeatable); replaces the configured list
    #[arg(long = "network", value_name = "ID")]
    networks: Vec<String>,

    /// Probe and report, but never deactivate accounts
    #[arg(long)]
    dry_run: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write JSON logs to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn build_config(cli: &Cli) -> Result<PurgerConfig> {
    let mut config = match &cli.config {
        Some(path) => PurgerConfig::from_file(path)?,
        None => PurgerConfig::default(),
    };

    config.server_url = cli.server.clone();
    if let Some(ref ledger) = cli.ledger {
        config.ledger_path = ledger.clone();
    }
    if let Some(threshold) = cli.threshold_secs {
        config.inactivity_threshold_secs = threshold;
    }
    if let Some(delay) = cli.probe_delay_ms {
        config.probe_delay_ms = delay;
    }
    if let Some(timeout) = cli.timeout_secs {
        config.request_timeout_secs = timeout;
    }
    if !cli.networks.is_empty() {
        config.networks = cli.networks.clone();
    }
    config.dry_run |= cli.dry_run;
    config.verbose |= cli.verbose;
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    logging::init_logging(&config)?;

    let credentials = Credentials::from_file(&cli.credentials_file)?;
    let api = HttpChatApi::connect(&config, &credentials).await?;

    let now = chrono::Utc::now().timestamp();
    let thresholds = Thresholds::from_config(&config);
    let mut ledger = Ledger::load_or_fresh(&config.ledger_path, now, &thresholds);
    if let Some(ref import) = cli.import {
        let older = Ledger::load(import).map_err(PurgerError::from)?;
        tracing::info!(
            path = %import.display(),
            accounts = older.account_count(),
            "Importing activity ledger"
        );
        ledger.merge(older);
    }

    let ledger_path = config.ledger_path.clone();
    let orchestrator = RunOrchestrator::new(api, config);
    let outcome = orchestrator.run_pass(ledger, now).await;

    outcome.ledger.persist(&ledger_path).map_err(PurgerError::from)?;
    tracing::info!(path = %ledger_path.display(), "Activity ledger written");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            tracing::error!(category = %e.category(), error = %e, "Purge run failed");
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}
