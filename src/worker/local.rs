use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::check::TimestampedResult;
use crate::error::ExecutionError;
use crate::store::ResultStore;
use crate::worker::executor::{is_executable, ScriptExecutor};

/// Periodically runs every executable script in a directory and publishes
/// the complete result set to the [`ResultStore`].
pub struct LocalScheduler<E> {
    dir: PathBuf,
    interval: Duration,
    executor: E,
    store: ResultStore,
}

impl<E: ScriptExecutor> LocalScheduler<E> {
    pub fn new(
        dir: impl Into<PathBuf>,
        interval: Duration,
        executor: E,
        store: ResultStore,
    ) -> Self {
        Self {
            dir: dir.into(),
            interval,
            executor,
            store,
        }
    }

    /// Run a cycle now, then one per interval, until `shutdown` fires.
    ///
    /// Cycle errors are logged and the previous results stay in place.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            dir = %self.dir.display(),
            interval = ?self.interval,
            "Local scheduler started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle(&shutdown).await {
                        if shutdown.is_cancelled() {
                            break;
                        }
                        tracing::error!(
                            dir = %self.dir.display(),
                            error = %e,
                            "Failed to run scripts"
                        );
                    }
                }
            }
        }

        tracing::info!("Local scheduler stopped");
    }

    /// Run every script once, sequentially, and replace the stored local
    /// results with the new set. Returns the number of results stored.
    ///
    /// Any execution error aborts the whole cycle before the store is
    /// touched. A script exiting non-zero is not an error.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<usize, ExecutionError> {
        let scripts = list_scripts(&self.dir).await?;

        let mut results = Vec::with_capacity(scripts.len());
        for path in scripts {
            let started_at = Utc::now();
            let t0 = Instant::now();
            let result = self.executor.run(&path, cancel).await?;
            tracing::debug!(
                script = %result.name,
                exit_code = result.exit_code,
                duration_ms = t0.elapsed().as_millis() as u64,
                "Ran script"
            );
            results.push(TimestampedResult::new(result, started_at));
        }

        let count = results.len();
        self.store.replace_local(results).await;
        Ok(count)
    }
}

/// List the executable regular files in `dir`, sorted by file name.
///
/// Entries that are not executable, are not regular files, or cannot be
/// stat'ed are skipped.
pub async fn list_scripts(dir: &Path) -> Result<Vec<PathBuf>, ExecutionError> {
    let read_dir_err = |source| ExecutionError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_err)?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        paths.push(entry.path());
    }
    paths.sort();

    let mut scripts = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() && is_executable(&metadata) => scripts.push(path),
            Ok(_) => {
                tracing::debug!(path = %path.display(), "Skipping non-executable entry");
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
            }
        }
    }
    Ok(scripts)
}
