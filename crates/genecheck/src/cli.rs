//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fact-check gene-set hypotheses with a tool-using verification cascade
#[derive(Parser)]
#[command(name = "genecheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/genecheck/config.toml)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the cascade over a CSV batch
    Run {
        /// CSV with an id column and a gene column
        #[arg(long, short)]
        input: PathBuf,

        /// Process at most N items
        #[arg(long)]
        limit: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Print the batch summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the enabled tool schemas as JSON
    Tools,

    /// Show the effective config, or write the defaults
    Config {
        /// Write a default config file to PATH
        #[arg(long, value_name = "PATH")]
        init: Option<PathBuf>,
    },
}
