//! Logging configuration with rotation support
//!
//! # Example
//!
//! ```rust
//! use ingest_core::logging::init_logging;
//!
//! init_logging("logs", "ingestd.log", "info").unwrap();
//! ```

use crate::error::{IngestError, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with daily file rotation plus a compact console
/// layer. Per-phase timings and terminal outcomes are emitted as
/// structured `tracing` fields (see `pipeline::Pipeline::run`) rather than
/// bespoke `println!` lines, so both layers get them for free.
///
/// - `directory`: directory to store rotated log files
/// - `filename_prefix`: prefix for log files (e.g. "ingestd.log")
/// - `level`: default log level (e.g. "info", "debug"), overridden by `RUST_LOG`
pub fn init_logging(directory: &str, filename_prefix: &str, level: &str) -> Result<()> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(filename_prefix)
        .build(directory)
        .map_err(|e| IngestError::Internal(format!("failed to create log appender: {e}")))?;

    let console_layer = fmt::layer().with_target(false).compact();
    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| IngestError::Internal(format!("failed to init tracing: {e}")))?;

    Ok(())
}
