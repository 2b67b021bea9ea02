//! RemoteRoster command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// RemoteRoster - roster bridge for external gateways
#[derive(Parser)]
#[command(name = "remoteroster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the property file
    #[arg(short, long, env = "REMOTEROSTER_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage per-gateway enable flags
    Flags(commands::flags::FlagsArgs),

    /// Classify a stanza against a gateway domain
    Classify(commands::classify::ClassifyArgs),

    /// Show version information
    Version,
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "remoteroster=info",
        1 => "remoteroster=debug",
        _ => "remoteroster=trace",
    }
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Flags(args) => commands::flags::run(args, config).await,
        Commands::Classify(args) => commands::classify::run(args).await,
        Commands::Version => {
            println!("remoteroster {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
