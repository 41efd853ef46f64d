//! Scripted module fixtures for pipeline tests.
//!
//! A [`ScriptedModule`] records every body execution into a shared log and
//! can be told to fail or stop on chosen runs, so tests assert ordering
//! laws from log positions the same way they would watch a real pipeline.

use std::collections::HashSet;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use dagflow::{ExecuteError, Module, Relation};

/// Shared execution log: module labels in body-execution order.
pub type ExecLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> ExecLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Number of times `label` appears in the log.
pub fn count(log: &ExecLog, label: &str) -> usize {
    log.lock().unwrap().iter().filter(|entry| *entry == label).count()
}

/// Position of the `k`-th (1-based) occurrence of `label`.
pub fn nth_pos(log: &ExecLog, label: &str, k: usize) -> Option<usize> {
    log.lock()
        .unwrap()
        .iter()
        .enumerate()
        .filter(|(_, entry)| *entry == label)
        .map(|(pos, _)| pos)
        .nth(k - 1)
}

type RunHook = Box<dyn Fn(u64) + Send + Sync>;

/// A module scripted for tests.
pub struct ScriptedModule {
    label: String,
    relations: Vec<Relation>,
    log: ExecLog,
    runs: AtomicU64,
    fail_on: HashSet<u64>,
    stop_on: Option<u64>,
    fd: Option<RawFd>,
    on_run: Option<RunHook>,
}

impl Module for ScriptedModule {
    fn relations(&self) -> Vec<Relation> {
        self.relations.clone()
    }

    fn fd(&self) -> Option<RawFd> {
        self.fd
    }

    fn execute(&self) -> Result<(), ExecuteError> {
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(fd) = self.fd {
            // Drain the byte that made the input fd readable.
            let mut byte = [0u8; 1];
            unsafe { libc::read(fd, byte.as_mut_ptr().cast(), 1) };
        }
        if self.stop_on == Some(run) {
            return Err(ExecuteError::stop(format!("scripted stop on run {run}")));
        }
        self.log.lock().unwrap().push(self.label.clone());
        if let Some(hook) = &self.on_run {
            hook(run);
        }
        if self.fail_on.contains(&run) {
            return Err(ExecuteError::Failure(anyhow!(
                "scripted failure on run {run}"
            )));
        }
        Ok(())
    }
}

/// Builder for [`ScriptedModule`].
pub struct ScriptedModuleBuilder {
    label: String,
    relations: Vec<Relation>,
    log: ExecLog,
    fail_on: HashSet<u64>,
    stop_on: Option<u64>,
    fd: Option<RawFd>,
    on_run: Option<RunHook>,
}

impl ScriptedModuleBuilder {
    pub fn new(label: &str, log: &ExecLog) -> Self {
        Self {
            label: label.to_string(),
            relations: Vec::new(),
            log: Arc::clone(log),
            fail_on: HashSet::new(),
            stop_on: None,
            fd: None,
            on_run: None,
        }
    }

    pub fn relation(mut self, relation: impl Into<Relation>) -> Self {
        self.relations.push(relation.into());
        self
    }

    /// Fail with a generic error on the given (1-based) run.
    pub fn fail_on(mut self, run: u64) -> Self {
        self.fail_on.insert(run);
        self
    }

    /// Raise the stop signal on the given (1-based) run.
    pub fn stop_on(mut self, run: u64) -> Self {
        self.stop_on = Some(run);
        self
    }

    /// Gate execution on the given input fd.
    pub fn fd(mut self, fd: RawFd) -> Self {
        self.fd = Some(fd);
        self
    }

    /// Run a hook inside every (non-skipped, non-stop) body execution.
    pub fn on_run(mut self, hook: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_run = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Arc<ScriptedModule> {
        Arc::new(ScriptedModule {
            label: self.label,
            relations: self.relations,
            log: self.log,
            runs: AtomicU64::new(0),
            fail_on: self.fail_on,
            stop_on: self.stop_on,
            fd: self.fd,
            on_run: self.on_run,
        })
    }
}

/// Convenience for the `(module, display name)` pairs `Pipeline::new`
/// takes.
pub fn entry(module: Arc<ScriptedModule>, name: &str) -> (Arc<dyn Module>, String) {
    (module, name.to_string())
}
