// src/events.rs
use bitflags::bitflags;
use std::sync::atomic::{AtomicU32, Ordering};

bitflags! {
    /// Event kinds reported by `wait_events`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VoEvents: u32 {
        const RESIZE    = 1 << 0;
        const EXPOSE    = 1 << 1;
        const CLOSE     = 1 << 2;
        const FOCUS     = 1 << 3;
        const WIN_STATE = 1 << 4;
    }
}

bitflags! {
    /// Flags for `reconfig` and context creation.
    ///
    /// Context creation clears ALPHA/STEREO when they cannot be provided.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VoFlags: u32 {
        const ALPHA    = 1 << 0;
        const STEREO   = 1 << 1;
        const GL_DEBUG = 1 << 2;
        const HIDDEN   = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CreateFlags: u32 {
        /// Autoprobing: failures are expected, keep error logs quiet.
        const PROBING = 1 << 0;
    }
}

/// Events queued by `signal_event`, drained by the next wait.
#[derive(Debug, Default)]
pub struct PendingEvents(AtomicU32);

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, events: VoEvents) {
        self.0.fetch_or(events.bits(), Ordering::AcqRel);
    }

    pub fn peek(&self) -> VoEvents {
        VoEvents::from_bits_truncate(self.0.load(Ordering::Acquire))
    }

    /// Return everything queued and reset to empty.
    pub fn take(&self) -> VoEvents {
        VoEvents::from_bits_truncate(self.0.swap(0, Ordering::AcqRel))
    }
}

/// User input forwarded from a backend to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key {
        keycode: u8,
        state: u16,
        pressed: bool,
    },
    MouseButton {
        button: u8,
        state: u16,
        pressed: bool,
    },
    MouseMove {
        x: i32,
        y: i32,
    },
    /// The user asked to close the window.
    CloseWin,
}

/// Forwarding target for input events. Backends call it from the thread
/// that runs `wait_events`.
pub trait InputSink: Send + Sync {
    fn put(&self, event: InputEvent);
}

impl InputSink for crossbeam_channel::Sender<InputEvent> {
    fn put(&self, event: InputEvent) {
        // The receiver going away just means nobody listens anymore.
        let _ = self.send(event);
    }
}
