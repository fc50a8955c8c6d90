use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use wildscan::app::{self, Cli, ConsoleSink};
use wildscan::config::{criteria_file, settings, EngineConfig};
use wildscan::core::{
    normalize, CoreError, OutputSink, ScanOutcome, SearchEvent, SearchMode, SearchScanner,
};

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ScanOutcome> {
    let mut config = EngineConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Using default configuration: {}", e);
        EngineConfig::default()
    });

    let raw = cli.apply_to(cli.base_criteria(&config)?);
    if let Some(path) = &cli.save_criteria {
        criteria_file::save_criteria(path, &raw)?;
        config.last_criteria_file = Some(path.clone());
        if let Err(e) = settings::save_config(&config) {
            tracing::warn!("Could not remember criteria file: {}", e);
        }
    }

    let sink = ConsoleSink::new(
        config.color_output && !cli.no_color,
        cli.progress || config.show_progress,
    );
    let criteria = match normalize(&raw) {
        Ok(criteria) => criteria,
        Err(e) => {
            sink.send_event(SearchEvent::Error(e.to_string()));
            return Err(e.into());
        }
    };
    let hits_path = cli.hits.clone().unwrap_or_else(|| config.hits_path());
    let mode = if cli.refine {
        SearchMode::RefinePrevious
    } else {
        SearchMode::Fresh
    };

    let scanner = Arc::new(SearchScanner::new(criteria, hits_path));
    let task = app::spawn_search(scanner, mode, sink);

    let cancel = task.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling search");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    task.wait().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    match run(cli).await {
        Ok(ScanOutcome::Completed { hits }) if hits > 0 => ExitCode::SUCCESS,
        Ok(ScanOutcome::Completed { .. }) => ExitCode::from(1),
        Ok(ScanOutcome::Cancelled { .. }) => ExitCode::from(130),
        Err(e) => {
            // Bare engine errors were already reported through the sink.
            let reported = e.chain().count() == 1 && e.downcast_ref::<CoreError>().is_some();
            if !reported {
                eprintln!("error: {e:#}");
            }
            ExitCode::from(2)
        }
    }
}
