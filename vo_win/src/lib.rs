//! Video output windowing.
//!
//! A [`VoWin`] owns one backend instance (chosen from a static
//! [`DriverDescriptor`]) and gives the player a uniform way to size a
//! drawable, wait for window events, and optionally obtain a GL context.
//! The X11/GLX backend (`"x11"`) layers context negotiation on a plain X11
//! window backend (`"x11-window"`).

pub mod backend;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod gl;
pub mod logging;
pub mod manager;
pub mod win;

pub use backend::api::{
    Backend, DriverDescriptor, GlBackend, GlSurfaceProvider, SurfaceVisual, Wakeup,
};
pub use backend::{find_driver, DRIVERS};
pub use config::{GlobalConfig, LoggingConfig, VoOptions};
pub use control::{ControlReply, ControlRequest};
pub use error::{Result, VoError};
pub use events::{CreateFlags, InputEvent, InputSink, PendingEvents, VoEvents, VoFlags};
pub use gl::{GlCaps, GlFunctions, GlVersion};
pub use logging::{initialize_logging, LogChannel};
pub use manager::{VoWin, WakeHandle};
pub use win::{VideoParams, WinHandle, WindowSize};
