//! Subscriber setup: human-readable events on stderr plus an append-only
//! plain-text copy in `<log_dir>/jeansdb.log`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub(crate) const LOG_FILE_NAME: &str = "jeansdb.log";

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. The returned guard flushes
/// the file writer on drop and must be held for the life of the process.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created, the filter
/// directive is invalid, or a global subscriber is already installed.
pub(crate) fn init_logging(log_dir: &Path, default_level: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        anyhow::anyhow!("failed to create log directory {}: {e}", log_dir.display())
    })?;

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(guard)
}
