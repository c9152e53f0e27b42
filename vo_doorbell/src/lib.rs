//! Cross-thread doorbell.
//!
//! A [`Doorbell`] is a payload-free wakeup signal with a pollable read
//! descriptor. Any thread may [`Doorbell::ring`] it; the owning thread
//! polls the descriptor next to its other event sources and calls
//! [`Doorbell::drain`] once woken. Rings are level-triggered and coalesce,
//! so a ring that lands before the owner starts waiting is not lost.

mod backends;

pub use backends::common::{DoorbellBackend, DoorbellStrategy};

use backends::common::AnyDoorbell;
use log::{debug, trace};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::fmt;
use std::io::Result;
use std::os::fd::{AsFd, BorrowedFd};
use std::time::Duration;

/// Longest single sleep [`poll_readable`] will perform.
pub const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Doorbell {
    backend: AnyDoorbell,
    strategy: DoorbellStrategy,
}

impl Doorbell {
    /// Open a doorbell with the platform's preferred strategy.
    pub fn new() -> Result<Self> {
        Self::with_strategy(DoorbellStrategy::preferred())
    }

    pub fn with_strategy(strategy: DoorbellStrategy) -> Result<Self> {
        let backend = AnyDoorbell::open(strategy)?;
        debug!("doorbell opened ({})", strategy.name());
        Ok(Self { backend, strategy })
    }

    pub fn strategy(&self) -> DoorbellStrategy {
        self.strategy
    }

    /// Wake whoever is polling the read descriptor. Safe from any thread.
    pub fn ring(&self) -> Result<()> {
        trace!("doorbell ring");
        self.backend.ring()
    }

    /// Consume pending rings; `true` if there were any.
    pub fn drain(&self) -> Result<bool> {
        self.backend.drain()
    }

    /// Check for a pending ring without blocking or consuming it.
    pub fn is_ringing(&self) -> Result<bool> {
        let ready = poll_readable(&[self.as_fd()], Some(Duration::ZERO))?;
        Ok(ready[0])
    }

    /// Block until rung or until `timeout` passes, then drain.
    ///
    /// Returns `true` if a ring was consumed.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<bool> {
        let ready = poll_readable(&[self.as_fd()], timeout)?;
        if ready[0] {
            self.drain()
        } else {
            Ok(false)
        }
    }
}

impl AsFd for Doorbell {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.backend.read_fd()
    }
}

impl fmt::Debug for Doorbell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Doorbell")
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Convert an optional timeout into a poll timeout.
///
/// `None` blocks indefinitely. Finite values are capped at
/// [`MAX_POLL_TIMEOUT`] and rounded up to whole milliseconds so a short
/// non-zero wait never degenerates into a busy loop.
pub fn poll_timeout(timeout: Option<Duration>) -> PollTimeout {
    match timeout {
        None => PollTimeout::NONE,
        Some(d) => {
            let d = d.min(MAX_POLL_TIMEOUT);
            let mut ms = d.as_millis();
            if Duration::from_millis(ms as u64) < d {
                ms += 1;
            }
            PollTimeout::from(ms as u16)
        }
    }
}

/// Wait until at least one descriptor is readable (or hung up), or the
/// timeout expires. Returns per-descriptor readiness in input order.
///
/// An interrupted wait (EINTR) reports nothing ready.
pub fn poll_readable(fds: &[BorrowedFd<'_>], timeout: Option<Duration>) -> Result<Vec<bool>> {
    let mut pfds: Vec<PollFd> = fds
        .iter()
        .map(|fd| PollFd::new(*fd, PollFlags::POLLIN))
        .collect();

    match poll(&mut pfds, poll_timeout(timeout)) {
        Ok(_) => {}
        Err(Errno::EINTR) => return Ok(vec![false; fds.len()]),
        Err(e) => return Err(e.into()),
    }

    let wake = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
    Ok(pfds
        .iter()
        .map(|p| p.revents().map(|r| r.intersects(wake)).unwrap_or(false))
        .collect())
}
