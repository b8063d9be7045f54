//! remote-grid - CLI Entry Point
//!
//! Loads the configuration, fetches a row range through the HTTP backend and
//! prints the rows once the provider reports them loaded.

use clap::Parser;
use remote_grid::config::AppConfig;
use remote_grid::provider::{RangeEvent, WindowedProvider};
use remote_grid::services::{runtime_handle, HttpRecordFetcher};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "remote-grid",
    version,
    about = "Fetch a row range from a remote dataset",
    allow_negative_numbers = true
)]
struct Cli {
    /// First row (inclusive, negative values are clamped to 0)
    from: i64,
    /// Last row (inclusive)
    to: i64,
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the backend base URL
    #[arg(long)]
    base_url: Option<String>,
    /// Write logs to a daily rolling file in this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Give up after this many seconds without an answer
    #[arg(long, default_value_t = 60)]
    wait_secs: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_deref());

    tracing::info!("Starting remote-grid...");

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "remote-grid failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(
    log_dir: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "remote-grid.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn run(cli: &Cli) -> remote_grid::error::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::try_load()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.backend.set_base_url(base_url.clone())?;
    }

    let fetcher = HttpRecordFetcher::<serde_json::Value>::new(&config.backend)?;
    tracing::info!(url = fetcher.url(), "Using records endpoint");

    let provider = WindowedProvider::with_runtime(config.provider.clone(), runtime_handle());
    let events = provider.subscribe();
    provider.configure_fetcher(fetcher);
    provider.ensure_range(cli.from, cli.to)?;

    let wait = Duration::from_secs(cli.wait_secs);
    loop {
        let Ok(event) = events.recv_timeout(wait) else {
            eprintln!("timed out after {}s", cli.wait_secs);
            provider.cancel_pending();
            return Ok(ExitCode::FAILURE);
        };

        match event {
            RangeEvent::Loading { range } => tracing::info!(%range, "Loading"),
            RangeEvent::Loaded { range } => {
                tracing::info!(%range, total = provider.len(), "Loaded");
                print_rows(&provider, range.from, range.to);
                return Ok(ExitCode::SUCCESS);
            }
            RangeEvent::LoadingError { range, error } => {
                eprintln!("failed to load rows {range}: {error}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }
}

fn print_rows(provider: &WindowedProvider<serde_json::Value>, from: i64, to: i64) {
    if to < 0 {
        return;
    }
    let start = from.max(0) as usize;
    let mut end = to as usize;
    if !provider.is_empty() {
        end = end.min(provider.len() - 1);
    }
    for index in start..=end {
        if let Some(row) = provider.row(index) {
            println!("{index}\t{row}");
        }
    }
}
