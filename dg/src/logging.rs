//! Per-run log sink
//!
//! Every run writes to its own file, `<log-dir>/<timestamp>-<run id>.log`.
//! The subscriber is installed only while [`RunLog::scope`] runs, so two runs
//! in one process never share a sink.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use eyre::{Context, Result};
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::artifact::TIMESTAMP_FORMAT;

/// Parse a level name; unknown names fall back to INFO
pub fn parse_level(level: Option<&str>) -> Level {
    match level.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => Level::TRACE,
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" | "WARNING" => Level::WARN,
            "ERROR" => Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                Level::INFO
            }
        },
        None => Level::INFO,
    }
}

/// Log file and subscriber for a single pipeline run
pub struct RunLog {
    run_id: String,
    path: PathBuf,
    level: Level,
    file: File,
}

impl RunLog {
    /// Create the run's log file under `log_dir`
    pub fn create(log_dir: impl AsRef<Path>, level: Level) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;

        let run_id = Uuid::now_v7().simple().to_string();
        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        // The leading UUIDv7 bits are a timestamp; the tail is random
        let path = log_dir.join(format!("{}-{}.log", stamp, &run_id[run_id.len() - 12..]));
        let file = File::create(&path).context(format!("Failed to create log file {}", path.display()))?;

        Ok(Self {
            run_id,
            path,
            level,
            file,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` with this log as the active subscriber
    pub fn scope<T>(self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(Mutex::new(self.file))
            .with_ansi(false)
            .with_env_filter(EnvFilter::from_default_env().add_directive(self.level.into()))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(run_id = %self.run_id, "Logging initialized (level: {:?})", self.level);
            debug!(path = ?self.path, "RunLog::scope: entered");
            f()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("debug")), Level::DEBUG);
        assert_eq!(parse_level(Some("WARNING")), Level::WARN);
        assert_eq!(parse_level(Some("bogus")), Level::INFO);
        assert_eq!(parse_level(None), Level::INFO);
    }

    #[test]
    fn test_scope_writes_to_run_file() {
        let temp = TempDir::new().unwrap();
        let log = RunLog::create(temp.path().join("logs"), Level::INFO).unwrap();
        let path = log.path().to_path_buf();

        let value = log.scope(|| {
            tracing::info!("inside the run");
            7
        });

        assert_eq!(value, 7);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("inside the run"));
    }

    #[test]
    fn test_runs_get_distinct_files() {
        let temp = TempDir::new().unwrap();
        let first = RunLog::create(temp.path(), Level::INFO).unwrap();
        let second = RunLog::create(temp.path(), Level::INFO).unwrap();
        assert_ne!(first.path(), second.path());
        assert_ne!(first.run_id(), second.run_id());
    }
}
