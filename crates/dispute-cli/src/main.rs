//! # disputes CLI entry point
//!
//! Parses command-line arguments, installs logging, loads configuration,
//! and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use dispute_cli::commands::{named_actor, run, Command, Session};
use dispute_cli::config::CliConfig;
use dispute_cli::exit_code_for;

/// Commission dispute ledger.
///
/// Files, works, and closes commission disputes in a local store, keeping a
/// hash-chained audit trail of every change.
#[derive(Parser, Debug)]
#[command(name = "disputes", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: ./disputes.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// User id recorded as the actor of mutations.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Display name for `--user`. Defaults to the id.
    #[arg(long, global = true)]
    user_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }

    tracing::debug!("disputes CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = CliConfig::load(cli.config.as_deref()).and_then(|config| {
        tracing::debug!(
            store_dir = %config.store_dir.display(),
            key = %config.collection_key,
            "loaded configuration"
        );
        let user = cli
            .user
            .as_deref()
            .map(|id| named_actor(id, cli.user_name.as_deref()))
            .transpose()?;
        let session = Session::open(&config, user)?;
        run(&cli.command, &session)
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}
