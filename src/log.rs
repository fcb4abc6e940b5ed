use crate::errors::{ExplorerError, ExplorerErrorType, Result};
use crate::locations::ensure_dir;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

const LOG_RETENTION_DAYS: i64 = 30;

/// Install the global subscriber, writing bunyan-formatted JSON to a fresh
/// timestamped file in `log_dir`. Keep the returned guard alive for as long as
/// logs should be flushed.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    let log_file = get_log_location(log_dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let formatter = BunyanFormattingLayer::new("explorer_vfs".into(), non_blocking);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatter);
    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        ExplorerError::new(
            ExplorerErrorType::InternalError,
            format!("Failed to install log subscriber: {}", e),
        )
    })?;
    // sled reports through the `log` crate
    LogTracer::init().map_err(|e| {
        ExplorerError::new(
            ExplorerErrorType::InternalError,
            format!("Failed to forward log records: {}", e),
        )
    })?;

    tracing::info!("Logging to {}", log_file.display());
    Ok(guard)
}

fn get_log_location(log_dir: &Path) -> Result<PathBuf> {
    let log_dir = ensure_dir(log_dir)?;
    clean_logfiles(&log_dir)?;
    let timestamp = Utc::now().format("%Y-%m-%d-%H-%M-%S");
    Ok(log_dir.join(format!("explorer-{}.log", timestamp)))
}

/// Delete log files last modified more than 30 days ago. Returns how many went.
pub(crate) fn clean_logfiles(log_dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for file in std::fs::read_dir(log_dir)? {
        let file = file?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified: chrono::DateTime<Utc> = chrono::DateTime::from(metadata.modified()?);
        let age = Utc::now().signed_duration_since(modified);
        if age.num_days() > LOG_RETENTION_DAYS {
            std::fs::remove_file(file.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_logfiles_keeps_recent_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("explorer-recent.log"), "{}").unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();

        assert_eq!(clean_logfiles(tmp.path()).unwrap(), 0);
        assert!(tmp.path().join("explorer-recent.log").exists());
        assert!(tmp.path().join("nested").exists());
    }

    #[test]
    fn test_log_location_is_timestamped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let location = get_log_location(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(location.parent(), Some(dir.as_path()));
        let name = location.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("explorer-") && name.ends_with(".log"));
    }
}
