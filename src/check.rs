use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one executed check script.
///
/// Fields are written in snake_case. PascalCase names (`Name`, `ExitCode`,
/// `Stdout`, `Stderr`, `LastRun`) are also accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// File name of the script, e.g. `disk.sh`.
    #[serde(alias = "Name")]
    pub name: String,
    /// Process exit code; `-1` when the script was killed by a signal.
    #[serde(alias = "ExitCode")]
    pub exit_code: i32,
    #[serde(alias = "Stdout")]
    pub stdout: String,
    #[serde(alias = "Stderr")]
    pub stderr: String,
}

impl CheckResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A [`CheckResult`] plus the wall-clock time its run started.
///
/// This is also the wire format served on `/api/v1/results` and consumed
/// from peers: the result fields are flattened and `last_run` is a Unix
/// timestamp in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedResult {
    #[serde(flatten)]
    pub result: CheckResult,
    #[serde(with = "chrono::serde::ts_seconds", alias = "LastRun")]
    pub last_run: DateTime<Utc>,
}

impl TimestampedResult {
    pub fn new(result: CheckResult, last_run: DateTime<Utc>) -> Self {
        Self { result, last_run }
    }

    pub fn name(&self) -> &str {
        &self.result.name
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// True when every result succeeded. Vacuously true for an empty slice.
pub fn all_successful(results: &[TimestampedResult]) -> bool {
    results.iter().all(TimestampedResult::is_success)
}
