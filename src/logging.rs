//! Tracing setup: stdout always, plus a daily rolling file when a log
//! directory is configured.

use std::path::Path;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::config::LogSettings;
use crate::error::AppError;

const LOG_FILE_PREFIX: &str = "league-of-gains.log";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Keeps the file writer flushing until the process exits.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init(settings: &LogSettings) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_target(false)
        .with_thread_names(true);

    let installed = match &settings.dir {
        Some(dir) => {
            let file = file_writer(dir, settings.max_files)?;
            let stdout = std::io::stdout.with_max_level(Level::INFO);
            subscriber
                .with_ansi(false)
                .with_writer(stdout.and(file))
                .try_init()
        }
        None => subscriber.with_ansi(true).try_init(),
    };
    installed.map_err(|e| AppError::Config(format!("failed to install logger: {e}")))?;

    tracing::info!(file = settings.dir.is_some(), "📝 Logger initialized");
    Ok(())
}

fn file_writer(dir: &Path, max_files: Option<usize>) -> Result<NonBlocking, AppError> {
    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX);
    if let Some(max_files) = max_files {
        builder = builder.max_log_files(max_files);
    }

    let appender = builder.build(dir).map_err(|e| {
        AppError::Config(format!(
            "failed to create log file in {}: {e}",
            dir.display()
        ))
    })?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_writer_creates_the_log_directory() {
        let dir = std::env::temp_dir().join(format!("log-logging-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        assert!(file_writer(&dir, Some(3)).is_ok());
        assert!(dir.is_dir());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
