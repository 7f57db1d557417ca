//! Structured logging infrastructure for Footfall

use crate::error::{FootfallError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "footfall_provider=debug")
    pub level: String,
    /// Whether to emit one JSON object per event
    pub json_format: bool,
    /// Optional file path for log output; stdout when absent
    pub file_path: Option<String>,
    /// Whether to log span open/close events
    pub include_spans: bool,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_path: None,
            include_spans: false,
            include_targets: true,
        }
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// When logging to a file the returned guard flushes the background writer
/// on drop, so the caller must keep it alive for the whole run.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| FootfallError::config_with_source("Invalid log filter", e))?;

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let (writer, guard) = match &config.file_path {
        Some(file_path) => {
            let path = Path::new(file_path);
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                FootfallError::config(format!("Log file path has no file name: {file_path}"))
            })?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };
    let ansi = config.file_path.is_none();

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_span_events(span_events)
                    .with_target(config.include_targets),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_span_events(span_events)
                    .with_target(config.include_targets),
            )
            .try_init()
    };

    installed
        .map_err(|e| FootfallError::config_with_source("Failed to install tracing subscriber", e))?;

    Ok(guard)
}
