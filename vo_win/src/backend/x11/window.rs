// src/backend/x11/window.rs
use std::any::Any;
use std::os::fd::AsRawFd;
use std::sync::Arc;
use std::time::Instant;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ColormapAlloc, ConfigureWindowAux, ConnectionExt as _,
    CreateWindowAux, EventMask, PropMode, Visualid, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::x11_utils::Serialize;

use super::event_source::{map_event, X11EventSource};
use super::Atoms;
use crate::backend::api::{Backend, GlSurfaceProvider, SurfaceVisual};
use crate::control::{ControlReply, ControlRequest};
use crate::error::Result;
use crate::events::{VoEvents, VoFlags};
use crate::win::WinHandle;
use crate::{vo_info, vo_trace, vo_verbose, vo_warn};

fn window_events() -> EventMask {
    EventMask::EXPOSURE
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::PROPERTY_CHANGE
        | EventMask::FOCUS_CHANGE
        | EventMask::KEY_PRESS
        | EventMask::KEY_RELEASE
        | EventMask::BUTTON_PRESS
        | EventMask::BUTTON_RELEASE
        | EventMask::POINTER_MOTION
}

// EWMH _NET_WM_STATE actions
const NET_WM_STATE_REMOVE: u32 = 0;
const NET_WM_STATE_ADD: u32 = 1;

/// Largest width or height the core protocol can express.
pub const MAX_WINDOW_SIZE: i32 = u16::MAX as i32;

/// Clamp a requested size into `1..=MAX_WINDOW_SIZE` on both axes.
pub fn clamp_window_size(w: i32, h: i32) -> (i32, i32) {
    (w.clamp(1, MAX_WINDOW_SIZE), h.clamp(1, MAX_WINDOW_SIZE))
}

pub(crate) fn preinit(win: &mut WinHandle) -> Result<Box<dyn Backend>> {
    let backend = X11WindowBackend::connect(win)?;
    Ok(Box::new(backend))
}

/// A single top-level X11 window on an x11rb connection.
///
/// Window sizes are limited to 1x1 ..= 65535x65535; requests outside that
/// range are clamped and the clamped size is what `get_size` reports.
pub struct X11WindowBackend {
    conn: Arc<RustConnection>,
    root: Window,
    root_visual: Visualid,
    root_depth: u8,
    atoms: Atoms,
    event_source: X11EventSource<RustConnection>,

    window: Option<Window>,
    colormap: Option<u32>,
    size: (i32, i32),
    title: String,
}

impl X11WindowBackend {
    pub fn connect(win: &mut WinHandle) -> Result<Self> {
        let display = win.global.vo.x11_display.clone();
        let (raw_conn, screen_num) = RustConnection::connect(display.as_deref())?;
        let conn = Arc::new(raw_conn);
        let screen = conn.setup().roots[screen_num].clone();

        let atoms = Atoms::new(conn.as_ref())?.reply()?;
        let event_source = X11EventSource::new(conn.clone());

        win.set_event_fd(Some(conn.stream().as_raw_fd()));
        vo_verbose!(
            win.log,
            "connected to {} (screen {}, {}x{})",
            display.as_deref().unwrap_or("$DISPLAY"),
            screen_num,
            screen.width_in_pixels,
            screen.height_in_pixels
        );

        Ok(Self {
            conn,
            root: screen.root,
            root_visual: screen.root_visual,
            root_depth: screen.root_depth,
            atoms,
            event_source,
            window: None,
            colormap: None,
            size: (0, 0),
            title: win.global.vo.title.clone(),
        })
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    fn create_window(
        &mut self,
        win: &mut WinHandle,
        visual: Option<SurfaceVisual>,
        size: (i32, i32),
        flags: VoFlags,
    ) -> Result<Window> {
        self.destroy_window();
        let (w, h) = clamp_window_size(size.0, size.1);

        let (visual_id, depth) = match visual {
            Some(v) => (v.id, v.depth),
            None => (self.root_visual, self.root_depth),
        };

        let colormap = self.conn.generate_id()?;
        self.conn
            .create_colormap(ColormapAlloc::NONE, colormap, self.root, visual_id)?;

        let window = self.conn.generate_id()?;
        // border_pixel is required when the depth differs from the root's
        let aux = CreateWindowAux::new()
            .background_pixel(0)
            .border_pixel(0)
            .colormap(colormap)
            .event_mask(window_events());
        self.conn.create_window(
            depth,
            window,
            self.root,
            0,
            0,
            w as u16,
            h as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            visual_id,
            &aux,
        )?;
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[self.atoms.WM_DELETE_WINDOW],
        )?;

        self.window = Some(window);
        self.colormap = Some(colormap);
        let title = self.title.clone();
        self.apply_title(window, &title)?;

        if !flags.contains(VoFlags::HIDDEN) {
            self.conn.map_window(window)?;
        }
        self.conn.flush()?;
        // Round trip so other connections (GLX) can already use the window.
        self.conn.get_input_focus()?.reply()?;

        self.size = (w, h);
        win.set_size(w, h);
        vo_verbose!(
            win.log,
            "created window 0x{:x} {}x{} visual 0x{:x} depth {}",
            window,
            w,
            h,
            visual_id,
            depth
        );
        Ok(window)
    }

    fn destroy_window(&mut self) {
        if let Some(window) = self.window.take() {
            let _ = self.conn.destroy_window(window);
        }
        if let Some(colormap) = self.colormap.take() {
            let _ = self.conn.free_colormap(colormap);
        }
        let _ = self.conn.flush();
    }

    fn apply_title(&self, window: Window, title: &str) -> Result<()> {
        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
            title.as_bytes(),
        )?;
        Ok(())
    }

    fn set_fullscreen(&self, window: Window, on: bool) -> Result<()> {
        let action = if on {
            NET_WM_STATE_ADD
        } else {
            NET_WM_STATE_REMOVE
        };
        let data = [action, self.atoms._NET_WM_STATE_FULLSCREEN, 0, 1, 0];
        let event = ClientMessageEvent::new(32, window, self.atoms._NET_WM_STATE, data);
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event.serialize(),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    /// Handle everything already queued on the connection.
    fn drain_events(&mut self, win: &mut WinHandle) -> Result<VoEvents> {
        let mut events = VoEvents::empty();
        while let Some(ev) = self.event_source.poll_next()? {
            let Some(window) = self.window else {
                continue;
            };
            let mapped = map_event(&self.atoms, &ev, window, self.size);
            if let Some((w, h)) = mapped.size {
                self.size = (w, h);
                win.set_size(w, h);
            }
            if let Some(input) = mapped.input {
                win.put_input(input);
            }
            events |= mapped.events;
        }
        Ok(events)
    }
}

impl Backend for X11WindowBackend {
    fn uninit(&mut self, win: &mut WinHandle) {
        self.destroy_window();
        win.set_event_fd(None);
        vo_trace!(win.log, "x11 window backend released");
    }

    fn reconfig(&mut self, win: &mut WinHandle, w: i32, h: i32, flags: VoFlags) -> Result<()> {
        let size = clamp_window_size(w, h);

        let Some(window) = self.window else {
            self.create_window(win, None, size, flags)?;
            return Ok(());
        };

        if size != self.size {
            let aux = ConfigureWindowAux::new()
                .width(size.0 as u32)
                .height(size.1 as u32);
            self.conn.configure_window(window, &aux)?;
            self.size = size;
        }
        if !flags.contains(VoFlags::HIDDEN) {
            self.conn.map_window(window)?;
        }
        self.conn.flush()?;
        win.set_size(size.0, size.1);
        Ok(())
    }

    fn control(&mut self, win: &mut WinHandle, request: &mut ControlRequest) -> ControlReply {
        match request {
            ControlRequest::SetTitle(title) => {
                self.title = title.clone();
                match self.window {
                    Some(window) => match self.apply_title(window, title) {
                        Ok(()) => ControlReply::from(self.conn.flush().is_ok()),
                        Err(e) => {
                            vo_warn!(win.log, "could not set title: {}", e);
                            ControlReply::False
                        }
                    },
                    None => ControlReply::True,
                }
            }
            ControlRequest::Fullscreen(on) => {
                let Some(window) = self.window else {
                    return ControlReply::False;
                };
                match self.set_fullscreen(window, *on) {
                    Ok(()) => {
                        vo_info!(win.log, "fullscreen {}", if *on { "on" } else { "off" });
                        ControlReply::True
                    }
                    Err(e) => {
                        vo_warn!(win.log, "fullscreen request failed: {}", e);
                        ControlReply::False
                    }
                }
            }
            ControlRequest::GetWindowSize(slot) => {
                if self.window.is_none() {
                    return ControlReply::False;
                }
                *slot = Some(self.size);
                ControlReply::True
            }
            ControlRequest::GetBitDepth(_) => ControlReply::NotImplemented,
        }
    }

    fn wait_events(&mut self, win: &mut WinHandle, until: Instant) -> Result<VoEvents> {
        let mut events = self.drain_events(win)?;
        let until = if events.is_empty() {
            until
        } else {
            Instant::now()
        };
        win.wait_event_fd(until)?;
        events |= self.drain_events(win)?;
        Ok(events)
    }

    fn surface_provider(&mut self) -> Option<&mut dyn GlSurfaceProvider> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl GlSurfaceProvider for X11WindowBackend {
    fn create_gl_window(
        &mut self,
        win: &mut WinHandle,
        visual: Option<SurfaceVisual>,
        flags: VoFlags,
    ) -> Result<u64> {
        let size = match win.size() {
            s if s.w > 0 && s.h > 0 => (s.w, s.h),
            _ => (win.global.vo.width as i32, win.global.vo.height as i32),
        };
        let window = self.create_window(win, visual, size, flags)?;
        Ok(u64::from(window))
    }
}
