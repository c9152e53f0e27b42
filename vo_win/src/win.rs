//! State shared between a manager and its backend.

use crate::config::GlobalConfig;
use crate::error::Result;
use crate::events::{InputEvent, InputSink, PendingEvents, VoEvents};
use crate::logging::LogChannel;
use crate::backend::api::Wakeup;
use crate::vo_trace;
use std::os::fd::{AsFd, BorrowedFd, RawFd};
use std::sync::Arc;
use std::time::Instant;
use vo_doorbell::{poll_readable, Doorbell};

/// Drawable size as last reported by the backend.
///
/// All zero until the backend has established a drawable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowSize {
    pub w: i32,
    pub h: i32,
    pub monitor_par: f64,
}

/// Source video geometry used by `reconfig_vo`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoParams {
    pub w: i32,
    pub h: i32,
    /// Pixel aspect ratio of the source.
    pub par: f64,
}

impl VideoParams {
    pub fn new(w: i32, h: i32) -> Self {
        Self { w, h, par: 1.0 }
    }

    /// Size the video should be displayed at, stretching one axis for non-square pixels.
    pub fn display_size(&self) -> (i32, i32) {
        if !(self.par.is_finite() && self.par > 0.0) || self.par == 1.0 {
            return (self.w, self.h);
        }
        if self.par > 1.0 {
            ((self.w as f64 * self.par).round() as i32, self.h)
        } else {
            (self.w, (self.h as f64 / self.par).round() as i32)
        }
    }
}

/// Per-instance data a backend reads and updates.
pub struct WinHandle {
    pub log: LogChannel,
    pub global: Arc<GlobalConfig>,
    pub input: Option<Arc<dyn InputSink>>,
    pub driver_name: &'static str,
    pub probing: bool,
    size: WindowSize,
    pending: Arc<PendingEvents>,
    event_fd: Option<RawFd>,
    doorbell: Arc<Doorbell>,
    /// What `wakeup_event_fd` rings; the manager installs the backend's waker.
    waker: Arc<dyn Wakeup>,
}

impl WinHandle {
    pub(crate) fn new(
        log: LogChannel,
        global: Arc<GlobalConfig>,
        input: Option<Arc<dyn InputSink>>,
        driver_name: &'static str,
        probing: bool,
    ) -> Result<Self> {
        let doorbell = Arc::new(Doorbell::new()?);
        Ok(Self {
            log,
            global,
            input,
            driver_name,
            probing,
            size: WindowSize::default(),
            pending: Arc::new(PendingEvents::new()),
            event_fd: None,
            waker: doorbell.clone(),
            doorbell,
        })
    }

    /// Publish the drawable size. Backends call this whenever it changes.
    pub fn set_size(&mut self, w: i32, h: i32) {
        self.size = WindowSize {
            w,
            h,
            monitor_par: self.global.vo.monitor_pixel_aspect,
        };
    }

    pub fn size(&self) -> WindowSize {
        self.size
    }

    pub fn signal_event(&self, events: VoEvents) {
        self.pending.merge(events);
    }

    pub fn pending(&self) -> &Arc<PendingEvents> {
        &self.pending
    }

    pub fn doorbell(&self) -> &Arc<Doorbell> {
        &self.doorbell
    }

    pub fn put_input(&self, event: InputEvent) {
        if let Some(input) = &self.input {
            input.put(event);
        }
    }

    /// Register the backend's readiness descriptor for `wait_event_fd`.
    ///
    /// The descriptor must stay open until it is unregistered with `None`.
    pub fn set_event_fd(&mut self, fd: Option<RawFd>) {
        self.event_fd = fd;
    }

    pub fn event_fd(&self) -> Option<RawFd> {
        self.event_fd
    }

    /// Sleep until the backend descriptor is readable, the doorbell rings,
    /// or `until` passes. One call never sleeps longer than 10 seconds.
    ///
    /// A ring is consumed here, so callers should re-check their sources
    /// after this returns.
    pub fn wait_event_fd(&self, until: Instant) -> Result<()> {
        let timeout = until.saturating_duration_since(Instant::now());
        let mut fds: Vec<BorrowedFd<'_>> = Vec::with_capacity(2);
        fds.push(self.doorbell.as_fd());
        if let Some(raw) = self.event_fd {
            // SAFETY: backends keep the descriptor open while it is registered.
            fds.push(unsafe { BorrowedFd::borrow_raw(raw) });
        }

        let ready = poll_readable(&fds, Some(timeout))?;
        if ready[0] {
            vo_trace!(self.log, "woken by doorbell");
            self.doorbell.drain()?;
        }
        Ok(())
    }

    /// Interrupt the wait of whichever manager owns the event loop.
    ///
    /// For a backend that delegates waiting to a nested manager this rings
    /// the nested manager's doorbell.
    pub fn wakeup_event_fd(&self) {
        self.waker.wakeup();
    }

    pub(crate) fn set_waker(&mut self, waker: Arc<dyn Wakeup>) {
        self.waker = waker;
    }
}
