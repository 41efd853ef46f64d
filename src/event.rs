// src/event.rs

//! Counting semaphore exposed as a readable file descriptor.
//!
//! Backed by `eventfd(2)` with `EFD_SEMAPHORE`: the fd polls readable while
//! the counter is non-zero, and every [`Event::get`] consumes exactly one
//! unit. All operations are non-blocking.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

#[derive(Debug)]
pub struct Event {
    fd: OwnedFd,
}

impl Event {
    pub fn new() -> io::Result<Self> {
        let raw = unsafe {
            libc::eventfd(0, libc::EFD_SEMAPHORE | libc::EFD_NONBLOCK | libc::EFD_CLOEXEC)
        };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // Safety: `raw` is a freshly created descriptor we now own.
        Ok(Self {
            fd: unsafe { OwnedFd::from_raw_fd(raw) },
        })
    }

    /// The underlying descriptor, for poller registration.
    pub fn fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// Increment the counter by `n`, waking pollers.
    pub fn put(&self, n: u64) -> io::Result<()> {
        let buf = n.to_ne_bytes();
        let written =
            unsafe { libc::write(self.fd.as_raw_fd(), buf.as_ptr().cast(), buf.len()) };
        if written != buf.len() as isize {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Consume one unit. Returns `false` if the counter was already zero.
    pub fn get(&self) -> io::Result<bool> {
        let mut buf = [0u8; 8];
        let read =
            unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if read == buf.len() as isize {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock {
            return Ok(false);
        }
        Err(err)
    }
}

impl AsRawFd for Event {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
