//! The window manager facade the player talks to.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::backend::api::{Backend, DriverDescriptor, SurfaceVisual, Wakeup};
use crate::backend::find_driver;
use crate::config::GlobalConfig;
use crate::control::{ControlReply, ControlRequest};
use crate::error::{Result, VoError};
use crate::events::{CreateFlags, InputSink, PendingEvents, VoEvents, VoFlags};
use crate::gl::{GlFunctions, GlVersion};
use crate::logging::LogChannel;
use crate::win::{VideoParams, WinHandle, WindowSize};
use crate::{vo_err, vo_trace, vo_verbose};

/// One backend instance plus the bookkeeping around it.
///
/// Dropping the manager runs the backend's `uninit` exactly once.
pub struct VoWin {
    driver: &'static DriverDescriptor,
    handle: WinHandle,
    backend: Box<dyn Backend>,
    waker: Arc<dyn Wakeup>,
}

/// Cloneable handle for waking or signalling a manager from any thread.
#[derive(Clone)]
pub struct WakeHandle {
    pending: Arc<PendingEvents>,
    waker: Arc<dyn Wakeup>,
}

impl WakeHandle {
    pub fn wakeup(&self) {
        self.waker.wakeup();
    }

    /// Queue `events` for the next (or current) `wait_events` and wake it.
    pub fn signal_event(&self, events: VoEvents) {
        self.pending.merge(events);
        self.waker.wakeup();
    }
}

impl fmt::Debug for WakeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeHandle")
            .field("pending", &self.pending.peek())
            .finish()
    }
}

impl VoWin {
    /// Build a manager for `driver` and run its preinit.
    ///
    /// If preinit fails the error is returned and `uninit` is never called.
    pub fn create(
        global: Arc<GlobalConfig>,
        parent_log: &LogChannel,
        input: Option<Arc<dyn InputSink>>,
        flags: CreateFlags,
        driver: &'static DriverDescriptor,
    ) -> Result<Self> {
        let probing = flags.contains(CreateFlags::PROBING);
        let log = parent_log
            .child(driver.name)
            .quieted(probing || parent_log.is_quiet());
        let mut handle = WinHandle::new(log, global, input, driver.name, probing)?;

        let backend = match (driver.preinit)(&mut handle) {
            Ok(backend) => backend,
            Err(e) => {
                vo_err!(handle.log, "could not initialize: {}", e);
                return Err(e);
            }
        };
        let waker = backend.waker(&handle);
        handle.set_waker(waker.clone());

        vo_verbose!(handle.log, "initialized {}", driver.description);
        Ok(Self {
            driver,
            handle,
            backend,
            waker,
        })
    }

    /// Create a manager owned by a backend, sharing the parent's config,
    /// input sink and log channel.
    pub fn create_nested(
        parent: &WinHandle,
        flags: CreateFlags,
        driver: &'static DriverDescriptor,
    ) -> Result<Self> {
        let mut flags = flags;
        if parent.probing {
            flags |= CreateFlags::PROBING;
        }
        Self::create(
            parent.global.clone(),
            &parent.log,
            parent.input.clone(),
            flags,
            driver,
        )
    }

    pub fn create_by_name(
        global: Arc<GlobalConfig>,
        parent_log: &LogChannel,
        input: Option<Arc<dyn InputSink>>,
        flags: CreateFlags,
        name: &str,
    ) -> Result<Self> {
        let driver = find_driver(name).ok_or_else(|| VoError::UnknownDriver(name.to_string()))?;
        Self::create(global, parent_log, input, flags, driver)
    }

    /// Try each driver in order and keep the first one that initializes.
    pub fn probe(
        global: Arc<GlobalConfig>,
        parent_log: &LogChannel,
        input: Option<Arc<dyn InputSink>>,
        flags: CreateFlags,
        drivers: &[&'static DriverDescriptor],
    ) -> Result<Self> {
        for &driver in drivers {
            match Self::create(
                global.clone(),
                parent_log,
                input.clone(),
                flags | CreateFlags::PROBING,
                driver,
            ) {
                Ok(win) => return Ok(win),
                Err(e) => log::debug!(
                    target: parent_log.target(),
                    "driver {} unavailable: {}",
                    driver.name,
                    e
                ),
            }
        }
        Err(VoError::NoBackend)
    }

    /// Tear down a manager. `None` is accepted and ignored.
    pub fn destroy(win: Option<Self>) {
        drop(win);
    }

    pub fn driver(&self) -> &'static DriverDescriptor {
        self.driver
    }

    pub fn handle(&self) -> &WinHandle {
        &self.handle
    }

    pub fn log(&self) -> &LogChannel {
        &self.handle.log
    }

    /// Ensure a `w`x`h` drawable exists.
    pub fn reconfig(&mut self, w: i32, h: i32, flags: VoFlags) -> Result<()> {
        vo_trace!(self.handle.log, "reconfig {}x{} {:?}", w, h, flags);
        self.backend
            .reconfig(&mut self.handle, w, h, flags)
            .inspect_err(|e| vo_err!(self.handle.log, "reconfig failed: {}", e))
    }

    /// Size the drawable for the given video and return the resulting size.
    pub fn reconfig_vo(
        &mut self,
        params: Option<&VideoParams>,
        flags: VoFlags,
    ) -> Result<WindowSize> {
        let params = params.ok_or(VoError::NoVideoParams)?;
        let (w, h) = params.display_size();
        self.reconfig(w, h, flags)?;
        Ok(self.get_size())
    }

    pub fn control(&mut self, request: &mut ControlRequest) -> ControlReply {
        let reply = self.backend.control(&mut self.handle, request);
        vo_trace!(self.handle.log, "control {} -> {:?}", request.name(), reply);
        reply
    }

    pub fn get_size(&self) -> WindowSize {
        self.handle.size()
    }

    /// Queue events for the next `wait_events` and wake any wait in progress.
    pub fn signal_event(&self, events: VoEvents) {
        self.handle.signal_event(events);
        self.waker.wakeup();
    }

    /// Block until the backend reports events, a wakeup arrives, or `until`.
    ///
    /// Queued events make the backend poll without sleeping; they are
    /// returned together with whatever the backend found.
    pub fn wait_events(&mut self, until: Instant) -> Result<VoEvents> {
        let until = if self.handle.pending().peek().is_empty() {
            until
        } else {
            Instant::now()
        };
        let events = self.backend.wait_events(&mut self.handle, until)?;
        Ok(events | self.handle.pending().take())
    }

    /// Interrupt `wait_events`. The only call that may come from another thread
    /// (through [`VoWin::waker`]).
    pub fn wakeup(&self) {
        self.waker.wakeup();
    }

    pub(crate) fn raw_waker(&self) -> Arc<dyn Wakeup> {
        self.waker.clone()
    }

    pub fn waker(&self) -> WakeHandle {
        WakeHandle {
            pending: self.handle.pending().clone(),
            waker: self.waker.clone(),
        }
    }

    /// Negotiate a GL context on the drawable.
    pub fn create_context(&mut self, version: GlVersion, flags: &mut VoFlags) -> Result<()> {
        let driver = self.driver.name;
        let gl = self
            .backend
            .gl()
            .ok_or_else(|| VoError::not_offered(driver, "a GL context"))?;
        gl.create_context(&mut self.handle, version, flags)
    }

    pub fn gl_functions(&mut self) -> Result<&GlFunctions> {
        let driver = self.driver.name;
        let gl = self
            .backend
            .gl()
            .ok_or_else(|| VoError::not_offered(driver, "a GL context"))?;
        gl.gl_functions().ok_or(VoError::NoContext)
    }

    pub fn swap_buffers(&mut self) -> Result<()> {
        let driver = self.driver.name;
        let gl = self
            .backend
            .gl()
            .ok_or_else(|| VoError::not_offered(driver, "a GL context"))?;
        gl.swap_buffers(&mut self.handle)
    }

    /// Ask the backend for a drawable with a specific visual.
    pub fn create_gl_window(
        &mut self,
        visual: Option<SurfaceVisual>,
        flags: VoFlags,
    ) -> Result<u64> {
        let driver = self.driver.name;
        let provider = self
            .backend
            .surface_provider()
            .ok_or_else(|| VoError::not_offered(driver, "GL drawables"))?;
        provider.create_gl_window(&mut self.handle, visual, flags)
    }

    pub fn has_gl(&mut self) -> bool {
        self.backend.gl().is_some()
    }

    /// Borrow the backend as its concrete type.
    pub fn backend_as<T: Backend>(&mut self) -> Option<&mut T> {
        self.backend.as_any_mut().downcast_mut::<T>()
    }
}

impl Drop for VoWin {
    fn drop(&mut self) {
        vo_verbose!(self.handle.log, "uninit");
        self.backend.uninit(&mut self.handle);
        self.handle.set_event_fd(None);
    }
}

impl fmt::Debug for VoWin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoWin")
            .field("driver", &self.driver.name)
            .field("size", &self.handle.size())
            .finish()
    }
}
