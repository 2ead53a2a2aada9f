//! Inviter binary entry point

use std::path::PathBuf;

use clap::Parser;
use tokio::signal;

use inviter::{
    services::{JsonLedgerStore, RealVkClient, SystemClock},
    Inviter, InviterConfig, InviterError, InviterResult,
};
use shared::{agent_info, logging, AgentId};

/// Invites members of one VK community into another
#[derive(Parser)]
#[command(name = "inviter")]
#[command(about = "Invites filtered members of a VK community into your own community")]
struct Args {
    /// Environment file to load before reading configuration (defaults to ./.env if present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Ledger file, overrides STATS_FILE
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also append log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> InviterResult<()> {
    let args = Args::parse();

    match &args.env_file {
        Some(path) => {
            dotenv::from_path(path).map_err(|e| InviterError::ConfigError {
                message: format!("cannot load {}: {}", path.display(), e),
            })?;
        }
        None => {
            dotenv::dotenv().ok();
        }
    }

    logging::init_tracing(Some(&args.log_level), args.log_file.as_deref())?;

    let mut config = match InviterConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::log_error(&AgentId::new("inviter"), "Configuration", &e);
            return Err(e);
        }
    };
    if let Some(path) = args.state_file {
        config.stats_file = path;
    }

    let directory = RealVkClient::from_config(&config);
    let store = JsonLedgerStore::new(config.stats_file.clone());
    let mut inviter = Inviter::new(config, directory, store, SystemClock).await;
    let agent = inviter.agent().clone();

    if args.once {
        logging::log_startup(&agent, "single invitation cycle");
        let report = inviter.run_cycle().await;
        agent_info!(agent, "Cycle ended with {:?}: {} invitation(s) sent", report.outcome, report.invited);
        return Ok(());
    }

    tokio::select! {
        _ = inviter.run_scheduled(None) => {}
        result = signal::ctrl_c() => match result {
            Ok(()) => logging::log_shutdown(&agent, "Received Ctrl+C signal"),
            Err(err) => logging::log_error(&agent, "Signal handling", &err),
        },
    }

    logging::log_success(&agent, "Inviter stopped");
    Ok(())
}
