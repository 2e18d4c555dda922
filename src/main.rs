use askdocs::Result;
use askdocs::commands::{ask, chat};
use askdocs::config::{Config, run_interactive_config, show_config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "askdocs")]
#[command(about = "Ask questions about a PDF using retrieval-augmented generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the language model, embedding server and index back-end
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Chat interactively about a PDF
    Chat {
        /// PDF to load before the first question; use /upload inside the chat otherwise
        pdf: Option<PathBuf>,
    },
    /// Ask a single question about a PDF and print the answer
    Ask {
        /// PDF to answer from
        pdf: PathBuf,
        /// The question
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Chat { pdf } => {
            chat(&Config::load_from_env()?, pdf).await?;
        }
        Commands::Ask { pdf, question } => {
            ask(&Config::load_from_env()?, &pdf, &question).await?;
        }
    }

    Ok(())
}
