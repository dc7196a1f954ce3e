use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::download::GitAcquirer;
use crate::highlight::SyntectHighlighter;
use crate::load_config::load_config;
use crate::preprocess::PassthroughReformatter;
use crate::progress::LogProgress;
use crate::render::{render, Collaborators};

/// CLI for repoprint: render source trees into paginated PDF documents.
#[derive(Parser)]
#[clap(
    name = "repoprint",
    version,
    about = "Render a git repository or local source tree into syntax-colored PDF documents"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the configured source using the given config file
    Render {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render { config } => {
            let config = load_config(config)?;
            println!("Render starting...");

            let acquirer = GitAcquirer::new();
            let reformatter = PassthroughReformatter;
            let highlighter = SyntectHighlighter::new();
            let progress = LogProgress;
            let collab = Collaborators {
                acquirer: &acquirer,
                reformatter: &reformatter,
                highlighter: &highlighter,
                progress: &progress,
            };

            match render(&config, &collab).await {
                Ok(report) => {
                    println!("Render complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => Err(anyhow::Error::new(e).context("Render failed")),
            }
        }
    }
}
