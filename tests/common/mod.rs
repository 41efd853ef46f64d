#![allow(dead_code)]

//! Shared helpers for the integration tests.

pub use dagflow_test_utils::init_tracing;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dagflow::{DagflowError, Epoll};

/// What happened while driving the poller.
#[derive(Debug, Default)]
pub struct DriveReport {
    pub dispatches: usize,
    /// Display names of modules whose failure reached the worker.
    pub failures: Vec<String>,
    /// Display names of modules that stopped themselves.
    pub stops: Vec<String>,
}

/// Drive `epoll` on the current thread until `done()` returns true.
///
/// Module failures and stops are recorded, not propagated; any other
/// error panics. Panics when `done` is still false after `max_dispatches`
/// or five seconds, so a wiring mistake fails instead of hanging.
pub fn drive_until(
    epoll: &Arc<Epoll>,
    max_dispatches: usize,
    mut done: impl FnMut() -> bool,
) -> DriveReport {
    let mut report = DriveReport::default();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(
            Instant::now() < deadline,
            "no progress within 5s: {report:?}"
        );
        assert!(
            report.dispatches < max_dispatches,
            "dispatch limit exceeded: {report:?}"
        );
        match epoll.wait_and_dispatch(Some(Duration::from_millis(100))) {
            Ok(true) => report.dispatches += 1,
            Ok(false) => {}
            Err(DagflowError::ModuleFailed { module, .. }) => {
                report.dispatches += 1;
                report.failures.push(module);
            }
            Err(DagflowError::ModuleStopped { module, .. }) => {
                report.dispatches += 1;
                report.stops.push(module);
            }
            Err(err) => panic!("poller error: {err}"),
        }
    }
    report
}

/// Spawn `count` worker threads driving `epoll` until `stop` flips.
///
/// Workers swallow module failures and stops the way a supervising loop
/// would; any other error panics the worker.
pub fn spawn_workers(
    epoll: &Arc<Epoll>,
    count: usize,
    stop: &Arc<AtomicBool>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|idx| {
            let epoll = Arc::clone(epoll);
            let stop = Arc::clone(stop);
            thread::Builder::new()
                .name(format!("worker-{idx}"))
                .spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        match epoll.wait_and_dispatch(Some(Duration::from_millis(50))) {
                            Ok(_) => {}
                            Err(DagflowError::ModuleFailed { .. }) => {}
                            Err(err) if err.is_module_stop() => {}
                            Err(err) => panic!("poller error: {err}"),
                        }
                    }
                })
                .expect("spawn worker thread")
        })
        .collect()
}

/// Wait (without driving) until `done()` is true; for multi-worker tests
/// where dedicated threads do the dispatching.
pub fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached within 5s");
        thread::sleep(Duration::from_millis(5));
    }
}
