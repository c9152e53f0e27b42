// src/backend/x11/mod.rs
pub mod event_source;
pub mod window;

pub use window::X11WindowBackend;

use crate::backend::api::DriverDescriptor;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,

        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,

        UTF8_STRING,
    }
}

/// Plain X11 window without a graphics context. The GLX backend hosts one of these.
pub static X11_WINDOW_DRIVER: DriverDescriptor = DriverDescriptor {
    name: "x11-window",
    description: "X11 window",
    preinit: window::preinit,
};
