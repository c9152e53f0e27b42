// src/backends/pipe.rs

use super::common::DoorbellBackend;
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::unistd;
use std::io::Result;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

/// Classic self-pipe: one byte written per ring, all bytes read per drain.
pub struct PipeDoorbell {
    read_end: OwnedFd,
    write_end: OwnedFd,
}

impl PipeDoorbell {
    pub fn new() -> Result<Self> {
        let (read_end, write_end) = unistd::pipe()?;
        for fd in [&read_end, &write_end] {
            fcntl(fd, FcntlArg::F_SETFL(OFlag::O_NONBLOCK))?;
            fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
        }
        Ok(Self {
            read_end,
            write_end,
        })
    }
}

impl DoorbellBackend for PipeDoorbell {
    fn ring(&self) -> Result<()> {
        match unistd::write(&self.write_end, &[0u8]) {
            // EAGAIN: pipe buffer full, plenty of unread rings already
            Ok(_) | Err(Errno::EAGAIN) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn drain(&self) -> Result<bool> {
        let mut buf = [0u8; 64];
        let mut drained = false;
        loop {
            match unistd::read(&self.read_end, &mut buf) {
                Ok(0) => return Ok(drained),
                Ok(_) => drained = true,
                Err(Errno::EAGAIN) => return Ok(drained),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_fd(&self) -> BorrowedFd<'_> {
        self.read_end.as_fd()
    }
}
