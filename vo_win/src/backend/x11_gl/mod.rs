// src/backend/x11_gl/mod.rs
pub mod context;
pub mod fbconfig;
pub mod glx_api;
pub mod xlib_glx;

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use self::context::GlxState;
use self::glx_api::{GlxApi, VisualInfo};
use self::xlib_glx::XlibGlx;
use crate::backend::api::{Backend, DriverDescriptor, GlBackend, SurfaceVisual, Wakeup};
use crate::backend::x11::X11_WINDOW_DRIVER;
use crate::control::{ControlReply, ControlRequest};
use crate::error::Result;
use crate::events::{CreateFlags, VoEvents, VoFlags};
use crate::gl::{GlFunctions, GlVersion};
use crate::manager::VoWin;
use crate::win::WinHandle;
use crate::vo_verbose;

pub static X11_GL_DRIVER: DriverDescriptor = DriverDescriptor {
    name: "x11",
    description: "X11/GLX OpenGL context",
    preinit,
};

fn preinit(win: &mut WinHandle) -> Result<Box<dyn Backend>> {
    let inner = VoWin::create_nested(win, CreateFlags::empty(), &X11_WINDOW_DRIVER)?;
    let api = XlibGlx::open(win.global.vo.x11_display.as_deref())?;
    Ok(Box::new(X11GlBackend::new(inner, Box::new(api))))
}

/// GLX context layered on a nested window manager that owns the drawable.
pub struct X11GlBackend {
    inner: VoWin,
    api: Box<dyn GlxApi>,
    state: GlxState,
}

impl X11GlBackend {
    /// `inner` must offer GL drawables (`create_gl_window`).
    pub fn new(inner: VoWin, api: Box<dyn GlxApi>) -> Self {
        Self {
            inner,
            api,
            state: GlxState::default(),
        }
    }

    pub fn state(&self) -> &GlxState {
        &self.state
    }

    pub fn inner(&mut self) -> &mut VoWin {
        &mut self.inner
    }

    fn sync_size(&self, win: &mut WinHandle) {
        let size = self.inner.get_size();
        win.set_size(size.w, size.h);
    }
}

impl Backend for X11GlBackend {
    fn uninit(&mut self, win: &mut WinHandle) {
        self.state.release(self.api.as_ref());
        vo_verbose!(win.log, "GLX state released");
    }

    fn reconfig(&mut self, win: &mut WinHandle, w: i32, h: i32, flags: VoFlags) -> Result<()> {
        self.inner.reconfig(w, h, flags)?;
        self.sync_size(win);
        Ok(())
    }

    fn control(&mut self, _win: &mut WinHandle, request: &mut ControlRequest) -> ControlReply {
        if let ControlRequest::GetBitDepth(slot) = request {
            if let Some(depth) = self.state.depth {
                *slot = Some(depth);
                return ControlReply::True;
            }
        }
        self.inner.control(request)
    }

    fn wait_events(&mut self, win: &mut WinHandle, until: Instant) -> Result<VoEvents> {
        let events = self.inner.wait_events(until)?;
        if events.contains(VoEvents::RESIZE) {
            self.sync_size(win);
        }
        Ok(events)
    }

    fn waker(&self, _win: &WinHandle) -> Arc<dyn Wakeup> {
        self.inner.raw_waker()
    }

    fn gl(&mut self) -> Option<&mut dyn GlBackend> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl GlBackend for X11GlBackend {
    fn create_context(
        &mut self,
        win: &mut WinHandle,
        version: GlVersion,
        flags: &mut VoFlags,
    ) -> Result<()> {
        if self.state.has_context() {
            return Ok(());
        }
        let inner = &mut self.inner;
        self.state.negotiate(
            self.api.as_ref(),
            &win.log,
            version,
            flags,
            &mut |visual: Option<&VisualInfo>, flags: VoFlags| {
                let visual = visual.map(|v| SurfaceVisual {
                    id: v.id,
                    depth: u8::try_from(v.depth).unwrap_or(0),
                });
                inner.create_gl_window(visual, flags)
            },
        )?;
        self.sync_size(win);
        Ok(())
    }

    fn gl_functions(&self) -> Option<&GlFunctions> {
        self.state.gl.as_ref()
    }

    fn swap_buffers(&mut self, _win: &mut WinHandle) -> Result<()> {
        self.state.swap_buffers(self.api.as_ref())
    }
}
