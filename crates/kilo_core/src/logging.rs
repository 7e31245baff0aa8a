use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LaunchpadConfig;

/// File name written inside the logs directory.
pub const LOG_FILE_NAME: &str = "logs.log";

/// Builds the filter directive for a bare level, keeping HTTP and RPC
/// internals quiet. Directive strings (containing `,` or `=`) pass through.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains(',') || level.contains('=') {
        level.to_string()
    } else {
        format!("{level},hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info")
    }
}

/// Initializes file + console logging.
/// Returns a guard that must be kept alive for the duration of the process.
///
/// The console layer is left out when `KILO_ENV=test`.
pub fn init_logging(config: &LaunchpadConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.logs_dir)?;

    let file_appender = tracing_appender::rolling::never(&config.logs_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.log_level)));

    let console_enabled = std::env::var("KILO_ENV").map_or(true, |v| v != "test");
    let console = console_enabled.then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(console)
        .init();

    Ok(guard)
}

/// Initialize file-only logging to a custom directory with a custom filter.
/// Useful for tests, where a global subscriber may already be installed.
pub fn init_logging_to_dir(logs_dir: &Path, filter: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::never(logs_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}
