// src/backend/api.rs
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use vo_doorbell::Doorbell;

use crate::control::{ControlReply, ControlRequest};
use crate::error::Result;
use crate::events::{VoEvents, VoFlags};
use crate::gl::{GlFunctions, GlVersion};
use crate::win::WinHandle;

/// Creates the backend state for a freshly built handle.
///
/// On failure nothing needs tearing down: `uninit` is never called.
pub type PreinitFn = fn(&mut WinHandle) -> Result<Box<dyn Backend>>;

/// Static, immutable description of one backend kind.
pub struct DriverDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub preinit: PreinitFn,
}

impl fmt::Debug for DriverDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Thread-safe half of a backend: unblocks its `wait_events`.
pub trait Wakeup: Send + Sync {
    fn wakeup(&self);
}

impl Wakeup for Doorbell {
    fn wakeup(&self) {
        if let Err(e) = self.ring() {
            log::warn!("doorbell ring failed: {}", e);
        }
    }
}

/// Operations every backend implements.
///
/// All methods run on the manager's owning thread, between a successful
/// preinit and `uninit`. Only the [`Wakeup`] handle may cross threads.
pub trait Backend: Any {
    /// Release everything preinit and later calls acquired. Called exactly once.
    fn uninit(&mut self, win: &mut WinHandle);

    /// Make sure a drawable of `w`x`h` exists. Publishes the size through
    /// `win.set_size`.
    fn reconfig(&mut self, win: &mut WinHandle, w: i32, h: i32, flags: VoFlags) -> Result<()>;

    fn control(&mut self, win: &mut WinHandle, request: &mut ControlRequest) -> ControlReply;

    /// Block until a backend event, a wakeup, or `until`.
    fn wait_events(&mut self, win: &mut WinHandle, until: Instant) -> Result<VoEvents>;

    /// Handle that interrupts `wait_events` from another thread.
    fn waker(&self, win: &WinHandle) -> Arc<dyn Wakeup> {
        win.doorbell().clone()
    }

    /// GL context capability, if this backend offers one.
    fn gl(&mut self) -> Option<&mut dyn GlBackend> {
        None
    }

    /// Drawable creation for a given visual, for backends that host a GL layer.
    fn surface_provider(&mut self) -> Option<&mut dyn GlSurfaceProvider> {
        None
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub trait GlBackend {
    /// Negotiate a context and bind it to the drawable. Clears ALPHA/STEREO
    /// in `flags` when they could not be provided. A no-op once a context exists.
    fn create_context(
        &mut self,
        win: &mut WinHandle,
        version: GlVersion,
        flags: &mut VoFlags,
    ) -> Result<()>;

    fn gl_functions(&self) -> Option<&GlFunctions>;

    fn swap_buffers(&mut self, win: &mut WinHandle) -> Result<()>;
}

/// Visual a drawable must be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceVisual {
    pub id: u32,
    pub depth: u8,
}

pub trait GlSurfaceProvider {
    /// Create (or recreate) the drawable. `None` uses the parent's visual.
    /// Returns the drawable id.
    fn create_gl_window(
        &mut self,
        win: &mut WinHandle,
        visual: Option<SurfaceVisual>,
        flags: VoFlags,
    ) -> Result<u64>;
}
