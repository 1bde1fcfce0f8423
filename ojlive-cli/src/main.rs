//! ojlive
//!
//! Submit solutions to an online judge and follow their verdicts live, or
//! keep a contest leaderboard on screen.

mod commands;
mod config;
mod render;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::leaderboard::LeaderboardArgs;
use commands::submit::SubmitArgs;
use config::ConfigLoader;
use ojlive_sdk::auth::AuthToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

const DEFAULT_LOG_FILTER: &str = "info,ojlive=debug,reqwest=warn";

/// ojlive - online judge client with live results
#[derive(Parser, Debug)]
#[command(name = "ojlive")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file [default: ./ojlive.toml, if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the judge base URL (e.g. https://oj.example.com)
    #[arg(long)]
    base_url: Option<Url>,

    /// Bearer token for the judge API
    #[arg(long, env = "OJLIVE_TOKEN", hide_env_values = true)]
    token: String,

    /// Emit logs as JSON
    #[arg(long, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a source file and wait for the verdict
    Submit(SubmitArgs),
    /// Show a contest leaderboard, refreshing periodically
    Leaderboard(LeaderboardArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.log_json);

    tracing::debug!("Starting ojlive v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(args.config.as_deref(), args.base_url);
    let config = config_loader.load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;
    tracing::debug!(base_url = %config.server.base_url, "Configuration loaded");

    let token = AuthToken::new(args.token);
    if token.is_empty() {
        anyhow::bail!("the API token is empty");
    }

    let shutdown_rx = shutdown::spawn_shutdown_listener();

    match args.command {
        Command::Submit(submit) => {
            let accepted = commands::submit::run(&config, token, submit, shutdown_rx).await?;
            Ok(if accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Leaderboard(leaderboard) => {
            commands::leaderboard::run(&config, token, leaderboard, shutdown_rx).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr so they do not mix with results on stdout.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
