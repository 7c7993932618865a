//! CLI entrypoint for synthesis-pipeline
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod logging;
mod output;
mod progress;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use progress::ConsoleProgress;
use std::sync::Arc;
use synthesis_application::{
    BreakerRegistry, CompositeProgress, PipelineError, ResultAggregator, RunPipelineUseCase,
    StageOrchestrator,
};
use synthesis_domain::{EligibilityGate, PipelineRequest, Query};
use synthesis_infrastructure::{
    ConfigLoader, FileConfig, FileResultStore, JsonlEventLog, LocalDocumentResolver,
    build_gateway,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose, cli.log_dir.as_deref());

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    // === Configuration ===
    let file_config: FileConfig = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };
    let settings = file_config.to_settings()?;

    if !file_config.output.color {
        colored::control::set_override(false);
    }

    let query = match &cli.query {
        Some(q) => Query::try_new(q.as_str())?,
        None => bail!("A query is required. Use --show-config to inspect configuration."),
    };
    let models = if cli.model.is_empty() {
        settings.default_models.clone()
    } else {
        cli.model.clone()
    };
    if models.is_empty() {
        bail!("No models given. Pass -m/--model or set [models] default in the config file.");
    }

    let mut request = PipelineRequest::new(query, models)
        .with_documents(cli.documents.iter().cloned())
        .with_persist(cli.persist);
    if let Some(caller) = &cli.caller_id {
        request = request.with_caller_id(caller.as_str());
    }

    // === Dependency Injection ===
    let breakers = Arc::new(BreakerRegistry::new(settings.breaker.clone()));
    let gateway = build_gateway(&file_config.providers, breakers, settings.retry.clone())?;
    let working_dir = std::env::current_dir().context("cannot read working directory")?;
    let orchestrator = StageOrchestrator::new(
        Arc::new(gateway),
        settings.catalog.clone(),
        settings.params.clone(),
    )
    .with_context_resolver(Arc::new(LocalDocumentResolver::new(working_dir)));
    let aggregator =
        ResultAggregator::new().with_store(Arc::new(FileResultStore::new(&settings.output_dir)));
    let gate = EligibilityGate::new(settings.policy.clone(), settings.catalog.clone());
    let use_case = RunPipelineUseCase::new(gate, orchestrator).with_aggregator(aggregator);

    let console = (!cli.quiet).then(|| Arc::new(ConsoleProgress::new()));
    let mut progress = CompositeProgress::new();
    if let Some(console) = &console {
        progress = progress.with(console.clone());
    }
    if let Some(path) = cli.events_log.as_ref().or(settings.events_log.as_ref()) {
        if let Some(log) = JsonlEventLog::open(path) {
            info!(path = %log.path().display(), "writing progress events");
            progress = progress.with(Arc::new(log));
        }
    }

    // Ctrl-C cancels every in-flight call; the run ends as `cancelled`
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            signal_token.cancel();
        }
    });

    info!("Starting synthesis pipeline");
    let result = use_case.execute_with_progress(request, &progress, cancel).await;

    match result {
        Ok(result) => {
            if let Some(console) = &console
                && !console.is_finished()
            {
                warn!("progress stream ended without a terminal event");
            }
            let format = cli.output.map(Into::into).unwrap_or(settings.output_format);
            println!("{}", output::render(&result, format)?);

            if let Some(storage) = &result.storage {
                eprintln!(
                    "{} {}",
                    "Saved:".dimmed(),
                    storage.structured.display().to_string().dimmed()
                );
            }
            if let Some(error) = &result.persistence_error {
                eprintln!("{} {}", "Warning: result not saved:".yellow(), error);
            }
            Ok(())
        }
        Err(error) => {
            report_failure(&error);
            Err(error.into())
        }
    }
}

/// The fixed-shape error payload goes to stderr so scripts can parse it
fn report_failure(error: &PipelineError) {
    match serde_json::to_string(&error.payload()) {
        Ok(payload) => eprintln!("{}", payload),
        Err(e) => warn!("could not serialize error payload: {}", e),
    }
}
