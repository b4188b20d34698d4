mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use medmatch::config::MedmatchConfig;

#[derive(Parser)]
#[command(name = "medmatch", version, about = "Semantic item matching for healthcare cost lookup")]
struct Cli {
    /// Config file (defaults to ~/.medmatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP matching service
    Serve,
    /// Match a query against items from a JSON file and print the ranking
    Match {
        /// Free-text query, e.g. "eye surgery"
        query: String,
        /// JSON array of {"id", "text"} items
        #[arg(long)]
        items: PathBuf,
        /// Number of ranked results to print
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Print the resolved configuration and validate it
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MedmatchConfig::load_from(path)?,
        None => MedmatchConfig::load()?,
    };

    // Log to stderr so stdout stays clean for CLI output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            config.validate()?;
            medmatch::server::serve(config).await?;
        }
        Command::Match {
            query,
            items,
            top_k,
        } => {
            config.validate()?;
            cli::match_items(&config, &query, &items, top_k).await?;
        }
        Command::Check => cli::check(&config)?,
    }

    Ok(())
}
