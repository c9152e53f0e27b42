// src/backend/x11/event_source.rs
use std::sync::Arc;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::Window;
use x11rb::protocol::Event as XEvent;

use crate::backend::x11::Atoms;
use crate::error::Result;
use crate::events::{InputEvent, VoEvents};

/// What one X event means for the manager.
#[derive(Debug, Default, PartialEq)]
pub struct MappedEvent {
    pub events: VoEvents,
    pub input: Option<InputEvent>,
    /// New drawable size, when it changed.
    pub size: Option<(i32, i32)>,
}

pub struct X11EventSource<C: Connection> {
    conn: Arc<C>,
}

impl<C: Connection> X11EventSource<C> {
    pub fn new(conn: Arc<C>) -> Self {
        Self { conn }
    }

    /// Next queued event, without blocking.
    pub fn poll_next(&self) -> Result<Option<XEvent>> {
        Ok(self.conn.poll_for_event()?)
    }
}

/// Translate an event addressed to `window`, whose current size is `size`.
/// Events for other windows map to nothing.
pub fn map_event(atoms: &Atoms, ev: &XEvent, window: Window, size: (i32, i32)) -> MappedEvent {
    let mut out = MappedEvent::default();
    match ev {
        XEvent::ConfigureNotify(e) if e.window == window => {
            let new_size = (i32::from(e.width), i32::from(e.height));
            if new_size != size {
                out.events |= VoEvents::RESIZE;
                out.size = Some(new_size);
            }
        }
        XEvent::Expose(e) if e.window == window && e.count == 0 => {
            out.events |= VoEvents::EXPOSE;
        }
        XEvent::ClientMessage(e) if e.window == window => {
            let data32 = e.data.as_data32();
            if e.type_ == atoms.WM_PROTOCOLS
                && e.format == 32
                && data32[0] == atoms.WM_DELETE_WINDOW
            {
                out.events |= VoEvents::CLOSE;
                out.input = Some(InputEvent::CloseWin);
            }
        }
        XEvent::FocusIn(e) if e.event == window => out.events |= VoEvents::FOCUS,
        XEvent::FocusOut(e) if e.event == window => out.events |= VoEvents::FOCUS,
        XEvent::MapNotify(e) if e.window == window => out.events |= VoEvents::WIN_STATE,
        XEvent::UnmapNotify(e) if e.window == window => out.events |= VoEvents::WIN_STATE,
        XEvent::PropertyNotify(e) if e.window == window && e.atom == atoms._NET_WM_STATE => {
            out.events |= VoEvents::WIN_STATE;
        }
        XEvent::KeyPress(e) if e.event == window => {
            out.input = Some(InputEvent::Key {
                keycode: e.detail,
                state: u16::from(e.state),
                pressed: true,
            });
        }
        XEvent::KeyRelease(e) if e.event == window => {
            out.input = Some(InputEvent::Key {
                keycode: e.detail,
                state: u16::from(e.state),
                pressed: false,
            });
        }
        XEvent::ButtonPress(e) if e.event == window => {
            out.input = Some(InputEvent::MouseButton {
                button: e.detail,
                state: u16::from(e.state),
                pressed: true,
            });
        }
        XEvent::ButtonRelease(e) if e.event == window => {
            out.input = Some(InputEvent::MouseButton {
                button: e.detail,
                state: u16::from(e.state),
                pressed: false,
            });
        }
        XEvent::MotionNotify(e) if e.event == window => {
            out.input = Some(InputEvent::MouseMove {
                x: i32::from(e.event_x),
                y: i32::from(e.event_y),
            });
        }
        _ => {}
    }
    out
}
