//! genecheck - gene-set hypothesis fact-checking

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use genecheck::llm::ModelClient;
use genecheck::tools::build_registry;
use genecheck::{load_csv, BatchDriver, CascadeController, Config, FileSink, OpenAiClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Config { init: Some(path) } => {
            Config::save_default(&path)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
        Commands::Config { init: None } => {
            let config = Config::load(cli.config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Tools => {
            let config = Config::load(cli.config.as_deref())?;
            let registry = build_registry(&config.tools)?;
            println!("{}", serde_json::to_string_pretty(&registry.schemas())?);
            Ok(())
        }
        Commands::Run {
            input,
            limit,
            no_progress,
            json,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            run(&config, &input, limit, !no_progress, json).await
        }
    }
}

async fn run(
    config: &Config,
    input: &std::path::Path,
    limit: Option<usize>,
    progress: bool,
    json: bool,
) -> Result<()> {
    info!("genecheck v{} starting", env!("CARGO_PKG_VERSION"));

    let items = load_csv(input, &config.input, limit)?;

    let generator: Arc<dyn ModelClient> =
        Arc::new(OpenAiClient::from_config(&config.llm, &config.llm.model)?);
    let verifier_model: Arc<dyn ModelClient> = Arc::new(OpenAiClient::from_config(
        &config.llm,
        config.llm.verifier_model(),
    )?);
    info!(
        "Models: generator {}, verifier {}",
        generator.model_name(),
        verifier_model.model_name()
    );

    let registry = Arc::new(build_registry(&config.tools)?);
    let sink = Arc::new(FileSink::from_config(&config.output).context("Failed to open output logs")?);

    let controller = CascadeController::new(generator, verifier_model, registry, sink)
        .with_settings(config.agent_settings());
    let mut driver = BatchDriver::new(controller);
    if progress && !json {
        driver = driver.with_progress();
    }

    let summary = driver.run(&items).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}
