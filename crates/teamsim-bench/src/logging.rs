use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

/// Keeps the non-blocking writer alive for the life of the run.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<LoggingGuard>> {
    let Some(log_dir) = log_dir else {
        return Ok(None);
    };

    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory at {}", log_dir.display()))?;

    let telemetry_path = log_dir.join("telemetry.jsonl");
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Ignore error if a global subscriber is already set (e.g., when running in tests)
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard { _guard: guard }))
}
