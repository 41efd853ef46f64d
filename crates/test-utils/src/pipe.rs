//! Non-blocking pipe helper for fd-gating tests.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

pub struct Pipe {
    read: OwnedFd,
    write: OwnedFd,
}

impl Pipe {
    pub fn new() -> io::Result<Self> {
        let mut fds = [0i32; 2];
        let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK | libc::O_CLOEXEC) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        // Safety: both descriptors are freshly created and owned here.
        Ok(Self {
            read: unsafe { OwnedFd::from_raw_fd(fds[0]) },
            write: unsafe { OwnedFd::from_raw_fd(fds[1]) },
        })
    }

    /// The read end, handed to a module as its input fd.
    pub fn read_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }

    /// Make the read end readable by writing one byte.
    pub fn notify(&self) -> io::Result<()> {
        let byte = [1u8];
        let written = unsafe { libc::write(self.write.as_raw_fd(), byte.as_ptr().cast(), 1) };
        if written != 1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
