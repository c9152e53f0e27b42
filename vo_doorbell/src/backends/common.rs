//! src/backends/common.rs

use std::io::Result;
use std::os::fd::BorrowedFd;

#[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
use crate::backends::eventfd::EventFdDoorbell;
#[cfg(feature = "pipe")]
use crate::backends::pipe::PipeDoorbell;

/// Runtime choice of doorbell implementation.
/// Only the variants whose feature is enabled exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorbellStrategy {
    #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
    EventFd,
    #[cfg(feature = "pipe")]
    Pipe,
}

cfg_if::cfg_if! {
    if #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))] {
        const PREFERRED: DoorbellStrategy = DoorbellStrategy::EventFd;
    } else if #[cfg(feature = "pipe")] {
        const PREFERRED: DoorbellStrategy = DoorbellStrategy::Pipe;
    } else {
        compile_error!("vo_doorbell needs the `pipe` feature on targets without eventfd");
    }
}

impl DoorbellStrategy {
    /// eventfd where the platform has it, the self-pipe otherwise.
    pub fn preferred() -> Self {
        PREFERRED
    }

    /// Every strategy compiled into this build.
    pub fn available() -> Vec<Self> {
        let mut strategies = Vec::new();
        #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
        strategies.push(Self::EventFd);
        #[cfg(feature = "pipe")]
        strategies.push(Self::Pipe);
        strategies
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
            Self::EventFd => "eventfd",
            #[cfg(feature = "pipe")]
            Self::Pipe => "pipe",
        }
    }
}

/// What every doorbell implementation provides.
///
/// A ring is level-triggered: the read descriptor stays readable until
/// `drain` consumes it, however many rings happened in between.
pub trait DoorbellBackend: Send + Sync {
    /// Make the read descriptor readable. Never blocks.
    fn ring(&self) -> Result<()>;

    /// Consume all pending rings. Returns `true` if at least one was pending.
    fn drain(&self) -> Result<bool>;

    /// Descriptor to poll for readability.
    fn read_fd(&self) -> BorrowedFd<'_>;
}

/// Enum over the compiled implementations, used instead of `Box<dyn DoorbellBackend>`.
pub(crate) enum AnyDoorbell {
    #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
    EventFd(EventFdDoorbell),
    #[cfg(feature = "pipe")]
    Pipe(PipeDoorbell),
}

impl AnyDoorbell {
    pub(crate) fn open(strategy: DoorbellStrategy) -> Result<Self> {
        match strategy {
            #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
            DoorbellStrategy::EventFd => Ok(Self::EventFd(EventFdDoorbell::new()?)),
            #[cfg(feature = "pipe")]
            DoorbellStrategy::Pipe => Ok(Self::Pipe(PipeDoorbell::new()?)),
        }
    }
}

impl DoorbellBackend for AnyDoorbell {
    fn ring(&self) -> Result<()> {
        match self {
            #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
            Self::EventFd(b) => b.ring(),
            #[cfg(feature = "pipe")]
            Self::Pipe(b) => b.ring(),
        }
    }

    fn drain(&self) -> Result<bool> {
        match self {
            #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
            Self::EventFd(b) => b.drain(),
            #[cfg(feature = "pipe")]
            Self::Pipe(b) => b.drain(),
        }
    }

    fn read_fd(&self) -> BorrowedFd<'_> {
        match self {
            #[cfg(all(feature = "eventfd", any(target_os = "linux", target_os = "android")))]
            Self::EventFd(b) => b.read_fd(),
            #[cfg(feature = "pipe")]
            Self::Pipe(b) => b.read_fd(),
        }
    }
}
