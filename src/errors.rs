// src/errors.rs

//! Crate-wide error types and helpers.

use thiserror::Error;

/// Errors surfaced by pipeline construction and by worker threads driving
/// the poller.
#[derive(Error, Debug)]
pub enum DagflowError {
    /// Two modules expose provides with identical name and value type.
    ///
    /// The message lists every offending pair as `name@module ⇄ name@module`.
    #[error("duplicate provides with identical name and type:\n{0}")]
    DuplicateProvides(String),

    /// A view was constructed with a pattern the regex engine rejects.
    #[error("invalid view pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A module's work function failed. Its direct successors skip their
    /// next run; the error reaches the worker only after neighbor
    /// signalling, so the rest of the graph keeps flowing.
    #[error("module '{module}' failed")]
    ModuleFailed {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    /// A module raised the stop signal and removed itself from the graph.
    /// Worker loops must treat this as non-fatal.
    #[error("module '{module}' stopped: {reason}")]
    ModuleStopped { module: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DagflowError {
    /// Whether this error is a module's self-stop, which a worker loop
    /// should log and carry on from.
    pub fn is_module_stop(&self) -> bool {
        matches!(self, DagflowError::ModuleStopped { .. })
    }
}

/// Outcome of [`Module::execute`](crate::Module::execute) when the module
/// did not succeed.
#[derive(Error, Debug)]
pub enum ExecuteError {
    /// Generic failure. The scheduler marks direct successors to skip
    /// their next run and re-raises the error wrapped with the module's
    /// display name.
    #[error(transparent)]
    Failure(#[from] anyhow::Error),

    /// Distinguished stop signal: the module is deactivated and its edges
    /// severed; the rest of the graph keeps running without it.
    #[error("stop requested: {0}")]
    Stop(String),
}

impl ExecuteError {
    /// Convenience constructor for the stop signal.
    pub fn stop(reason: impl Into<String>) -> Self {
        ExecuteError::Stop(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, DagflowError>;
