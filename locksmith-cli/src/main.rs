//! Fernet Locksmith CLI
//!
//! Keeps a Fernet key set rotated and identical across several Vault servers.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod ui;

#[derive(Parser)]
#[command(name = "fernet-locksmith")]
#[command(about = "Rotate Fernet keys replicated across Vault servers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true, env = "LOCKSMITH_CONFIG")]
    config: Option<PathBuf>,

    /// Vault server address, in read/write order (repeatable)
    #[arg(long = "vault", global = true)]
    vaults: Vec<String>,

    /// Vault token, paired with --vault by position; one token is shared (repeatable)
    #[arg(long = "token", global = true)]
    tokens: Vec<String>,

    /// Secret path holding the key set
    #[arg(long, global = true)]
    key_path: Option<String>,

    /// Rotation safety margin and secret TTL, in seconds
    #[arg(long, global = true)]
    ttl: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run rotation cycles until interrupted
    Run {
        /// Seconds between cycles (defaults to the TTL)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single rotation cycle
    Once,

    /// Show key set age and next rotation
    Status {
        /// Print status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the first key set in every Vault
    Init {
        /// Rotation period in seconds
        #[arg(short, long)]
        period: Option<u64>,

        /// Number of keys
        #[arg(short, long)]
        num_keys: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over the defaults
    let default_filter = if cli.verbose {
        "locksmith_cli=debug,locksmith_lib=debug"
    } else {
        "locksmith_cli=info,locksmith_lib=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let overrides = config::Overrides {
        config_file: cli.config,
        vaults: cli.vaults,
        tokens: cli.tokens,
        key_path: cli.key_path,
        ttl_secs: cli.ttl,
    };
    let config = config::load(&overrides)?;

    // Dispatch commands
    match cli.command {
        Commands::Run { interval } => {
            commands::run::run(&config, interval, cli.verbose).await?;
        }
        Commands::Once => {
            commands::once::run(&config, cli.verbose).await?;
        }
        Commands::Status { json } => {
            commands::status::run(&config, json, cli.verbose).await?;
        }
        Commands::Init { period, num_keys } => {
            commands::init::run(&config, period, num_keys, cli.verbose).await?;
        }
    }

    Ok(())
}
