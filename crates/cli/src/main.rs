//! `qroute`: run routing passes over queue snapshots from the terminal

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use qroute_routing_engine::config::{EngineConfig, LogSettings};
use qroute_routing_engine::logging::{log_startup, parse_log_level, setup_logging, LoggingConfig};
use qroute_routing_engine::prediction::{FeatureContext, ScorePredictor};
use qroute_routing_engine::repository::{InMemoryQueueFleet, InMemoryResultStore};
use qroute_routing_engine::routing::RoutingEngine;
use qroute_routing_engine::service::RoutingService;
use qroute_routing_engine::types::{Agent, Customer};
use serde_json::json;
use tracing::info;

use crate::commands::{Cli, Commands, OutputFormat, SnapshotArgs};

const APP_NAME: &str = "qroute";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref())?;
    config::validate(&config)?;

    setup_logging(logging_config(&cli, &config.logging)?)?;
    log_startup(APP_NAME, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Route { snapshots, model, format } => route(config, &snapshots, model, format).await,
        Commands::Score { snapshots, model, format } => score(config, &snapshots, model, format).await,
        Commands::ModelInfo { model } => {
            let config = with_model(config, model);
            let predictor = ScorePredictor::from_config(&config.predictor);
            print!("{}", output::render_model_info(&predictor.model_info()));
            Ok(())
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
            print!("{}", rendered);
            Ok(())
        }
    }
}

/// Command-line logging flags layered over the `[logging]` section
fn logging_config(cli: &Cli, settings: &LogSettings) -> Result<LoggingConfig> {
    let mut logging = LoggingConfig::from_settings(settings)?;
    if let Some(level) = &cli.log_level {
        logging = logging.with_level(parse_log_level(level)?);
    }
    if cli.json_logs {
        logging = logging.json();
    }
    if cli.log_source {
        logging = logging.with_source_location();
    }
    if cli.log_spans {
        logging = logging.with_span_events();
    }
    Ok(logging)
}

/// `--model` takes precedence over the configured artifact
fn with_model(mut config: EngineConfig, model: Option<PathBuf>) -> EngineConfig {
    if model.is_some() {
        config.predictor.model_path = model;
    }
    config
}

fn load_snapshots(args: &SnapshotArgs) -> Result<(Vec<Customer>, Vec<Agent>)> {
    let customers: Vec<Customer> = config::read_json(&args.customers)?;
    let agents: Vec<Agent> = config::read_json(&args.agents)?;
    info!(
        customers = customers.len(),
        agents = agents.len(),
        "snapshots loaded"
    );
    Ok((customers, agents))
}

async fn route(config: EngineConfig, args: &SnapshotArgs, model: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let config = with_model(config, model);
    let (customers, agents) = load_snapshots(args)?;

    let fleet = Arc::new(InMemoryQueueFleet::from_snapshots(customers, agents).context("loading snapshots")?);
    fleet.refresh_wait_times();
    let store = Arc::new(InMemoryResultStore::new());
    let service = RoutingService::new(&config, fleet, store);

    let report = service.auto_route().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("{}", output::render_assignments(&report.results));
            println!();
            println!("{}", output::render_statistics(&report.statistics, report.unrouted_customers));
        }
    }
    Ok(())
}

async fn score(config: EngineConfig, args: &SnapshotArgs, model: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let config = with_model(config, model);
    let (customers, agents) = load_snapshots(args)?;
    for customer in &customers {
        customer.validate()?;
    }
    for agent in &agents {
        agent.validate()?;
    }

    let predictor = Arc::new(ScorePredictor::from_config(&config.predictor));
    let engine = RoutingEngine::new(predictor, &config.routing);
    let context = FeatureContext::now(customers.len());

    let Some((candidates, matrix)) = engine.score_matrix(&customers, &agents, &context).await else {
        println!("Nothing to score: no waiting customers or no available agents");
        return Ok(());
    };

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = customers
                .iter()
                .zip(matrix.rows())
                .map(|(customer, row)| {
                    let scores: serde_json::Map<String, serde_json::Value> = candidates
                        .iter()
                        .zip(row)
                        .map(|(agent, score)| (agent.id.clone(), json!(score)))
                        .collect();
                    json!({ "customer_id": customer.id, "scores": scores })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            println!("{}", output::render_matrix(&customers, &candidates, &matrix));
        }
    }
    Ok(())
}
