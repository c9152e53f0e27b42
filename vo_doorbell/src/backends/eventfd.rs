// src/backends/eventfd.rs

use super::common::DoorbellBackend;
use nix::errno::Errno;
use nix::sys::eventfd::{EfdFlags, EventFd};
use std::io::Result;
use std::os::fd::{AsFd, BorrowedFd};

/// Doorbell on a single non-blocking eventfd counter.
pub struct EventFdDoorbell {
    efd: EventFd,
}

impl EventFdDoorbell {
    pub fn new() -> Result<Self> {
        let flags = EfdFlags::EFD_NONBLOCK | EfdFlags::EFD_CLOEXEC;
        let efd = EventFd::from_flags(flags)?;
        Ok(Self { efd })
    }
}

impl DoorbellBackend for EventFdDoorbell {
    fn ring(&self) -> Result<()> {
        match self.efd.write(1) {
            // EAGAIN: counter saturated, the fd is readable anyway
            Ok(_) | Err(Errno::EAGAIN) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn drain(&self) -> Result<bool> {
        // One read resets the counter to zero.
        match self.efd.read() {
            Ok(count) => Ok(count > 0),
            Err(Errno::EAGAIN) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read_fd(&self) -> BorrowedFd<'_> {
        self.efd.as_fd()
    }
}
