use std::fs;
use std::path::Path;

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use util::config;

/// Installs the global tracing subscriber.
///
/// Logs go to a daily-rolling file under `logs/` (named after `LOG_FILE`) and,
/// when `LOG_TO_STDOUT=true`, to stdout as well. The filter comes from
/// `LOG_LEVEL` and defaults to the configured level.
///
/// Keep the returned guard alive for the lifetime of the process, otherwise
/// buffered file output is lost.
pub fn init_logging() -> WorkerGuard {
    init_logging_in("logs", &config::log_file(), &config::log_level(), config::log_to_stdout())
}

pub fn init_logging_in(
    log_dir: &str,
    log_file: &str,
    default_level: &str,
    log_to_stdout: bool,
) -> WorkerGuard {
    let dir = Path::new(log_dir);
    fs::create_dir_all(dir).ok();

    let file_appender = rolling::daily(dir, log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true);

    let env_filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    // try_init: a second call (tests, embedding) keeps the first subscriber.
    if log_to_stdout {
        registry.with(stdout_layer).try_init().ok();
    } else {
        registry.try_init().ok();
    }

    guard
}
