use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("locus")
        .join("logs")
}

/// The terminal UI owns stderr, so the interactive session logs to a daily
/// rolling file instead. Filter comes from RUST_LOG.
pub fn init_file_logging() -> Result<PathBuf> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_appender = rolling::daily(&dir, "locus.log");

    tracing_subscriber::registry()
        .with(
            fmt::Layer::new()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter())
        .try_init()
        .context("Failed to set global default subscriber")?;

    tracing::debug!(target: "locus::logging", path = %dir.display(), "File logging initialized");
    Ok(dir)
}

/// One-shot subcommands log to stderr.
pub fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::Layer::default()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(filter())
        .try_init()
        .context("Failed to set global default subscriber")?;
    Ok(())
}
