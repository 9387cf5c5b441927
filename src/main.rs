use clap::{Parser, Subcommand};
use rag_chat::Result;
use rag_chat::commands::{ask, chat, index};
use rag_chat::config::{resolve_config_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rag-chat")]
#[command(about = "Chat with a local collection of PDF documents")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (defaults to ~/.rag-chat)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure documents, models and vector store
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the vector store, or verify an existing one
    Index {
        /// Discard any existing collection and re-embed every chunk
        #[arg(long)]
        force_rebuild: bool,
    },
    /// Answer a single question
    Ask {
        question: String,
    },
    /// Start an interactive chat session
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = resolve_config_dir(cli.config_dir)?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Index { force_rebuild } => {
            index(&config_dir, force_rebuild).await?;
        }
        Commands::Ask { question } => {
            ask(&config_dir, &question).await?;
        }
        Commands::Chat => {
            chat(&config_dir).await?;
        }
    }

    Ok(())
}
