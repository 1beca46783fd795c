//! Structured telemetry for simulation runs.
//!
//! When `logging.enable_structured` is set, every `tracing` event from the
//! engine, the policies and the runner is written as one JSON object per line
//! to `telemetry.jsonl` beside the summary table.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Keeps the background writer alive; dropping it flushes pending events.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Installs the JSON subscriber, or does nothing when structured logs are off.
///
/// `RUST_LOG` overrides the configured level.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let telemetry_path = outputs.telemetry_path();
    let file = create_telemetry_file(&telemetry_path)?;
    // Blocks instead of dropping lines when the channel is full.
    let (writer, guard) = NonBlockingBuilder::default().lossy(false).finish(file);

    let default_level = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_span_events(FmtSpan::NONE)
        .json()
        .with_current_span(false)
        .flatten_event(true)
        .finish();

    // Only the first subscriber in a process is installed.
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!(
            target: "septica_sim::logging",
            path = %telemetry_path.display(),
            "subscriber already installed"
        );
    }

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

fn create_telemetry_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    }
    File::create(path).with_context(|| format!("creating telemetry file at {}", path.display()))
}
