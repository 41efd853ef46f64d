// src/poll/mod.rs

//! Readiness-poller contract and the default epoll implementation.
//!
//! The scheduler talks to a [`Poller`] instead of epoll directly. This
//! keeps the multiplexer swappable (tests can interpose their own) while
//! the production implementation lives in [`epoll`].

mod epoll;

pub use epoll::Epoll;

use std::os::fd::RawFd;
use std::sync::Arc;

use crate::errors::Result;

/// Callback invoked on a worker thread when a registered fd is ready.
pub type FdCallback = Arc<dyn Fn(RawFd) -> Result<()> + Send + Sync>;

/// Arming policy for a registered fd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdMode {
    /// Readable, edge-triggered: one dispatch per not-ready → ready
    /// transition.
    EdgeTriggered,
    /// Readable, one-shot: disarmed after a single dispatch until re-armed
    /// with [`Poller::mod_fd`].
    OneShot,
    /// Registered but disarmed; armed later with [`Poller::mod_fd`].
    Disarmed,
}

/// The multiplexer the scheduler registers its descriptors with.
///
/// Implementations dispatch callbacks on whatever threads drive them.
/// `mod_fd` must be callable from inside a running callback: the
/// fd-gating trampoline re-arms a one-shot fd from its own dispatch.
pub trait Poller: Send + Sync {
    fn add_fd(&self, fd: RawFd, callback: FdCallback, mode: FdMode, label: &str) -> Result<()>;

    fn mod_fd(&self, fd: RawFd, mode: FdMode) -> Result<()>;

    /// Remove a registration. With `wait_for_in_flight`, blocks until any
    /// concurrently running callback for this fd has returned.
    fn rm_fd(&self, fd: RawFd, wait_for_in_flight: bool) -> Result<()>;
}
