mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use watson::{config, server};

#[derive(Parser)]
#[command(
    name = "watson",
    version,
    about = "Investigation analysis engine for murder-mystery games"
)]
struct Cli {
    /// Case file to use instead of the configured one
    #[arg(long, global = true)]
    case: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Run a recorded interrogation through the analysis engine
    Replay {
        /// JSON transcript: a list of turns, or an object with a `turns` list
        transcript: PathBuf,
        /// JSON theory to evaluate once the transcript has been replayed
        #[arg(long)]
        theory: Option<PathBuf>,
        /// Print machine-readable JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Show the active case as the player sees it
    Case {
        /// Print machine-readable JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::WatsonConfig::load()?;
    if let Some(path) = cli.case {
        config.case.path = Some(path);
    }

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve_stdio(config).await?;
        }
        Command::Replay {
            transcript,
            theory,
            json,
        } => {
            cli::replay::replay(&config, &transcript, theory.as_deref(), json).await?;
        }
        Command::Case { json } => {
            cli::case::show_case(&config, json)?;
        }
    }

    Ok(())
}
