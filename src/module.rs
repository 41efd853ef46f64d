// src/module.rs

//! The contract a user component implements to participate in a pipeline.

use std::os::fd::RawFd;

use crate::errors::ExecuteError;
use crate::relation::Relation;

/// A unit of work wired into the graph through its [`Relation`]s.
///
/// The pipeline holds an `Arc` to the module and calls `execute` from
/// worker threads, never from two threads at once for the same module:
/// readiness hands each node to exactly one worker per round.
pub trait Module: Send + Sync {
    /// The relations this module owns, in declaration order.
    fn relations(&self) -> Vec<Relation>;

    /// Optional input descriptor gating execution: the module runs only
    /// when this fd is readable *and* its edges are satisfied.
    ///
    /// Must stay the same descriptor for the module's whole lifetime.
    fn fd(&self) -> Option<RawFd> {
        None
    }

    /// Perform one unit of work.
    fn execute(&self) -> Result<(), ExecuteError>;
}
