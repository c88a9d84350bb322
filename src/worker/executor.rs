use std::fs::Metadata;
use std::future::Future;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::check::CheckResult;
use crate::error::ExecutionError;

/// Runs one check script to completion or cancellation.
///
/// A process that runs and exits, with any exit code, is a successful call.
/// An [`ExecutionError`] means the script could not be run at all.
pub trait ScriptExecutor: Send + Sync + 'static {
    fn run(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<CheckResult, ExecutionError>> + Send;
}

/// True if any of the owner/group/other execute bits is set.
pub fn is_executable(metadata: &Metadata) -> bool {
    metadata.permissions().mode() & 0o111 != 0
}

/// Executes scripts directly as child processes, capturing stdout/stderr.
///
/// Scripts run without arguments, with stdin closed and the node's
/// environment. There is no sandboxing and no per-script timeout; a
/// cancelled run kills the child.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ScriptExecutor for ProcessExecutor {
    async fn run(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<CheckResult, ExecutionError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| ExecutionError::Stat {
                path: path.to_path_buf(),
                source,
            })?;
        if !is_executable(&metadata) {
            return Err(ExecutionError::NotExecutable(path.to_path_buf()));
        }
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled(path.to_path_buf()));
        }

        let name = script_name(path);

        let child = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        // Dropping the wait future on cancellation drops the child, which kills it.
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(script = %name, "Script cancelled");
                return Err(ExecutionError::Cancelled(path.to_path_buf()));
            }
            output = child.wait_with_output() => output.map_err(|source| ExecutionError::Wait {
                path: path.to_path_buf(),
                source,
            })?,
        };

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(script = %name, exit_code, "Script finished");

        Ok(CheckResult {
            name,
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Check name for a script: its file name.
pub fn script_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
