// src/poll/epoll.rs

//! Default [`Poller`] built on `epoll(7)`.
//!
//! Worker threads drive it by looping on [`Epoll::wait_and_dispatch`]; each
//! call waits for at most one event and runs its callback on the calling
//! thread, so any number of threads can share one instance for load
//! balancing. The epoll descriptor itself is exposed through `AsRawFd` so
//! an instance can be nested into an outer readiness loop.

use std::collections::HashMap;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use super::{FdCallback, FdMode, Poller};
use crate::errors::Result;

struct Registration {
    callback: FdCallback,
    label: String,
}

pub struct Epoll {
    epfd: OwnedFd,
    registry: Mutex<HashMap<RawFd, Arc<Registration>>>,
}

impl Epoll {
    pub fn new() -> io::Result<Self> {
        let raw = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            // Safety: `raw` is a freshly created descriptor we now own.
            epfd: unsafe { OwnedFd::from_raw_fd(raw) },
            registry: Mutex::new(HashMap::new()),
        })
    }

    /// Wait for one ready fd and run its callback on the calling thread.
    ///
    /// Returns `Ok(false)` on timeout, `Ok(true)` after a dispatch. A
    /// callback error propagates to the caller once the dispatch is done.
    pub fn wait_and_dispatch(&self, timeout: Option<Duration>) -> Result<bool> {
        let millis = timeout.map_or(-1, |t| t.as_millis().min(i32::MAX as u128) as i32);
        let mut ev = libc::epoll_event { events: 0, u64: 0 };
        let n = loop {
            let n = unsafe { libc::epoll_wait(self.epfd.as_raw_fd(), &mut ev, 1, millis) };
            if n >= 0 {
                break n;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err.into());
            }
        };
        if n == 0 {
            return Ok(false);
        }
        let fd = ev.u64 as RawFd;
        let registration = self.registry.lock().unwrap().get(&fd).cloned();
        match registration {
            Some(registration) => (registration.callback)(fd).map(|()| true),
            // Removed between wakeup and lookup; nothing left to run.
            None => Ok(true),
        }
    }
}

impl AsRawFd for Epoll {
    fn as_raw_fd(&self) -> RawFd {
        self.epfd.as_raw_fd()
    }
}

fn interest(mode: FdMode) -> u32 {
    match mode {
        FdMode::EdgeTriggered => (libc::EPOLLIN | libc::EPOLLET) as u32,
        FdMode::OneShot => (libc::EPOLLIN | libc::EPOLLONESHOT) as u32,
        FdMode::Disarmed => 0,
    }
}

impl Poller for Epoll {
    fn add_fd(&self, fd: RawFd, callback: FdCallback, mode: FdMode, label: &str) -> Result<()> {
        let mut ev = libc::epoll_event {
            events: interest(mode),
            u64: fd as u64,
        };
        let rc = unsafe { libc::epoll_ctl(self.epfd.as_raw_fd(), libc::EPOLL_CTL_ADD, fd, &mut ev) };
        if rc < 0 {
            return Err(io::Error::last_os_error().into());
        }
        debug!(fd, label, ?mode, "registered fd");
        self.registry.lock().unwrap().insert(
            fd,
            Arc::new(Registration {
                callback,
                label: label.to_string(),
            }),
        );
        Ok(())
    }

    fn mod_fd(&self, fd: RawFd, mode: FdMode) -> Result<()> {
        let mut ev = libc::epoll_event {
            events: interest(mode),
            u64: fd as u64,
        };
        let rc = unsafe { libc::epoll_ctl(self.epfd.as_raw_fd(), libc::EPOLL_CTL_MOD, fd, &mut ev) };
        if rc < 0 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(())
    }

    fn rm_fd(&self, fd: RawFd, wait_for_in_flight: bool) -> Result<()> {
        let mut ev = libc::epoll_event { events: 0, u64: 0 };
        let rc = unsafe { libc::epoll_ctl(self.epfd.as_raw_fd(), libc::EPOLL_CTL_DEL, fd, &mut ev) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            // Tolerate removing an fd that was never (or already) dropped.
            if err.raw_os_error() != Some(libc::ENOENT) {
                return Err(err.into());
            }
        }
        let registration = self.registry.lock().unwrap().remove(&fd);
        if let Some(registration) = registration {
            debug!(fd, label = %registration.label, "unregistered fd");
            if wait_for_in_flight {
                // Dispatch holds a clone only while the callback runs.
                while Arc::strong_count(&registration) > 1 {
                    std::thread::yield_now();
                }
            }
        }
        Ok(())
    }
}
