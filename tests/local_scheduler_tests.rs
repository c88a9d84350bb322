
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use checkmesh::check::CheckResult;
use checkmesh::error::ExecutionError;
use checkmesh::store::ResultStore;
use checkmesh::worker::local::list_scripts;
use checkmesh::worker::{LocalScheduler, ProcessExecutor, ScriptExecutor};
use tokio_util::sync::CancellationToken;

use test_harness::{assert_eventually, check_result, result, write_check, write_script};

const LONG_INTERVAL: Duration = Duration::from_secs(3600);

/// Executor that succeeds for every script except one, and counts calls.
#[derive(Clone, Default)]
struct FakeExecutor {
    fail_on: Option<&'static str>,
    calls: Arc<AtomicUsize>,
}

impl ScriptExecutor for FakeExecutor {
    async fn run(
        &self,
        path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<CheckResult, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if self.fail_on == Some(name.as_str()) {
            return Err(ExecutionError::NotExecutable(path.to_path_buf()));
        }
        Ok(check_result(&name, 0))
    }
}

#[tokio::test]
async fn test_list_scripts_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    write_check(dir.path(), "b.sh", "", "", 0);
    write_check(dir.path(), "a.sh", "", "", 0);
    write_script(dir.path(), "README", "not a script\n", 0o644);
    std::fs::create_dir(dir.path().join("subdir")).unwrap();

    let scripts = list_scripts(dir.path()).await.unwrap();
    let names: Vec<String> = scripts
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec!["a.sh", "b.sh"]);
}

#[tokio::test]
async fn test_cycle_runs_scripts_and_replaces_results() {
    let dir = tempfile::tempdir().unwrap();
    write_check(dir.path(), "good.sh", "fine", "", 0);
    write_check(dir.path(), "bad.sh", "", "boom", 1);
    write_script(dir.path(), "skipped.sh", "#!/bin/sh\nexit 1\n", 0o644);

    let store = ResultStore::default();
    let scheduler = LocalScheduler::new(
        dir.path(),
        LONG_INTERVAL,
        ProcessExecutor::new(),
        store.clone(),
    );

    let before = Utc::now();
    let count = scheduler.run_cycle(&CancellationToken::new()).await.unwrap();
    assert_eq!(count, 2);

    let snapshot = store.snapshot().await;
    let local = snapshot.local();
    assert_eq!(local.len(), 2);

    assert_eq!(local[0].name(), "bad.sh");
    assert_eq!(local[0].result.exit_code, 1);
    assert_eq!(local[0].result.stderr, "boom\n");
    assert_eq!(local[1].name(), "good.sh");
    assert_eq!(local[1].result.stdout, "fine\n");

    // Timestamps are whole-second on the wire but full precision locally.
    assert!(local.iter().all(|r| r.last_run >= before));
    assert!(!snapshot.local_ok());
}

#[tokio::test]
async fn test_empty_directory_gives_empty_results() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::default();
    store.replace_local(vec![result("old.sh", 1)]).await;

    let scheduler = LocalScheduler::new(
        dir.path(),
        LONG_INTERVAL,
        ProcessExecutor::new(),
        store.clone(),
    );
    let count = scheduler.run_cycle(&CancellationToken::new()).await.unwrap();

    assert_eq!(count, 0);
    let snapshot = store.snapshot().await;
    assert!(snapshot.local().is_empty());
    assert!(snapshot.local_ok());
}

#[tokio::test]
async fn test_unreadable_directory_keeps_previous_results() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let store = ResultStore::default();
    store.replace_local(vec![result("previous.sh", 0)]).await;

    let scheduler = LocalScheduler::new(
        &missing,
        LONG_INTERVAL,
        ProcessExecutor::new(),
        store.clone(),
    );
    let err = scheduler.run_cycle(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ExecutionError::ReadDir { .. }), "got {err:?}");

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.local().len(), 1);
    assert_eq!(snapshot.local()[0].name(), "previous.sh");
}

#[tokio::test]
async fn test_execution_error_aborts_whole_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write_check(dir.path(), "a.sh", "", "", 0);
    write_check(dir.path(), "b.sh", "", "", 0);
    write_check(dir.path(), "c.sh", "", "", 0);

    let store = ResultStore::default();
    store.replace_local(vec![result("previous.sh", 0)]).await;

    let executor = FakeExecutor {
        fail_on: Some("b.sh"),
        ..Default::default()
    };
    let calls = executor.calls.clone();
    let scheduler = LocalScheduler::new(dir.path(), LONG_INTERVAL, executor, store.clone());

    assert!(scheduler.run_cycle(&CancellationToken::new()).await.is_err());
    // c.sh is never attempted once b.sh fails.
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.local().len(), 1);
    assert_eq!(snapshot.local()[0].name(), "previous.sh");
}

#[tokio::test]
async fn test_cancelled_cycle_keeps_previous_results() {
    let dir = tempfile::tempdir().unwrap();
    write_check(dir.path(), "good.sh", "", "", 0);

    let store = ResultStore::default();
    store.replace_local(vec![result("previous.sh", 1)]).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let scheduler = LocalScheduler::new(
        dir.path(),
        LONG_INTERVAL,
        ProcessExecutor::new(),
        store.clone(),
    );
    let err = scheduler.run_cycle(&cancel).await.unwrap_err();
    assert!(matches!(err, ExecutionError::Cancelled(_)), "got {err:?}");

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.local()[0].name(), "previous.sh");
}

#[tokio::test]
async fn test_run_executes_immediately_and_stops_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    write_check(dir.path(), "good.sh", "", "", 0);

    let store = ResultStore::default();
    let scheduler = LocalScheduler::new(
        dir.path(),
        LONG_INTERVAL,
        ProcessExecutor::new(),
        store.clone(),
    );

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(scheduler.run(shutdown.clone()));

    assert_eventually(
        || {
            let store = store.clone();
            async move { store.snapshot().await.local().len() == 1 }
        },
        Duration::from_secs(5),
        "first cycle should run without waiting for the interval",
    )
    .await;

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler should stop after shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_run_repeats_on_interval() {
    let dir = tempfile::tempdir().unwrap();
    write_check(dir.path(), "a.sh", "", "", 0);

    let executor = FakeExecutor::default();
    let calls = executor.calls.clone();
    let store = ResultStore::default();
    let scheduler = LocalScheduler::new(dir.path(), Duration::from_millis(50), executor, store);

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(scheduler.run(shutdown.clone()));

    assert_eventually(
        || {
            let calls = calls.clone();
            async move { calls.load(Ordering::SeqCst) >= 3 }
        },
        Duration::from_secs(5),
        "scheduler should keep running cycles",
    )
    .await;

    shutdown.cancel();
    handle.await.unwrap();
}
