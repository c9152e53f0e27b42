// src/control.rs

/// Requests for the generic `control` channel.
///
/// Query variants carry an output slot the backend fills in when it
/// answers `ControlReply::True`.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlRequest {
    /// Per-channel (red, green, blue) color depth of the drawable.
    GetBitDepth(Option<[i32; 3]>),
    SetTitle(String),
    Fullscreen(bool),
    /// Current drawable size in pixels.
    GetWindowSize(Option<(i32, i32)>),
}

impl ControlRequest {
    pub fn bit_depth() -> Self {
        Self::GetBitDepth(None)
    }

    pub fn window_size() -> Self {
        Self::GetWindowSize(None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetBitDepth(_) => "get-bit-depth",
            Self::SetTitle(_) => "set-title",
            Self::Fullscreen(_) => "fullscreen",
            Self::GetWindowSize(_) => "get-window-size",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    True,
    False,
    /// The backend does not handle this request.
    NotImplemented,
}

impl ControlReply {
    pub fn is_true(self) -> bool {
        self == Self::True
    }
}

impl From<bool> for ControlReply {
    fn from(ok: bool) -> Self {
        if ok {
            Self::True
        } else {
            Self::False
        }
    }
}
