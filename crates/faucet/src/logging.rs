//! Logging configuration
//!
//! Application logs go to stdout. Access log events (target `access`) go to
//! stdout too, or to a daily-rotated file when one is configured.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Target used for per-request access log events
pub const ACCESS_LOG_TARGET: &str = "access";

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Install the global subscriber
///
/// Returns a WorkerGuard that must be kept alive while the access log file is in use
pub fn init(
    level: &str,
    format: LogFormat,
    access_log_file: Option<&str>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (access_layer, guard) = match access_log_file {
        Some(file) => {
            let path = Path::new(file);
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid access log file: {}", file))?;

            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(Targets::new().with_target(ACCESS_LOG_TARGET, Level::INFO));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Access events leave stdout once they have a file of their own
    let stdout_filter = if access_layer.is_some() {
        Targets::new()
            .with_default(Level::TRACE)
            .with_target(ACCESS_LOG_TARGET, tracing::level_filters::LevelFilter::OFF)
    } else {
        Targets::new().with_default(Level::TRACE)
    };

    let stdout_layer = match format {
        LogFormat::Json => fmt::layer().json().with_filter(stdout_filter).boxed(),
        LogFormat::Pretty => fmt::layer().with_filter(stdout_filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(access_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set subscriber: {}", e))?;

    Ok(guard)
}
