//! Error types for window creation, context negotiation and configuration.

/// Errors surfaced by managers, backends and configuration loading.
///
/// Capability degradation (no alpha, no stereo, indirect context) is not an
/// error: it is logged and reported by clearing the caller's flag.
#[derive(Debug, thiserror::Error)]
pub enum VoError {
    #[error("backend '{driver}' failed to initialize: {message}")]
    Init { driver: String, message: String },

    #[error("backend '{driver}' does not offer {capability}")]
    CapabilityNotOffered {
        driver: String,
        capability: &'static str,
    },

    #[error("no rendering context has been created")]
    NoContext,

    #[error("GLX version {major}.{minor} is too old, 1.3 or newer required")]
    GlxVersion { major: i32, minor: i32 },

    #[error("no framebuffer configuration matches the requested attributes")]
    NoFbConfig,

    #[error("no visual available for a legacy context")]
    NoVisual,

    #[error("could not create rendering context: {0}")]
    ContextCreation(String),

    #[error("could not make the rendering context current")]
    MakeCurrent,

    #[error("no video parameters to size the window from")]
    NoVideoParams,

    #[error("no driver named '{0}'")]
    UnknownDriver(String),

    #[error("no usable video output window backend")]
    NoBackend,

    #[cfg(feature = "backend-x11")]
    #[error("X11 connect error: {0}")]
    X11Connect(#[from] x11rb::errors::ConnectError),

    #[cfg(feature = "backend-x11")]
    #[error("X11 connection error: {0}")]
    X11Connection(#[from] x11rb::errors::ConnectionError),

    #[cfg(feature = "backend-x11")]
    #[error("X11 request failed: {0}")]
    X11Reply(#[from] x11rb::errors::ReplyError),

    #[cfg(feature = "backend-x11")]
    #[error("X11 request failed: {0}")]
    X11ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),

    #[error("failed to load {0}")]
    LibraryLoad(String),

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("configuration parse error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },

    #[error("logger error: {source}")]
    Logger {
        #[from]
        source: flexi_logger::FlexiLoggerError,
    },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, VoError>;

impl VoError {
    pub fn init<D: Into<String>, S: Into<String>>(driver: D, message: S) -> Self {
        Self::Init {
            driver: driver.into(),
            message: message.into(),
        }
    }

    pub fn not_offered<D: Into<String>>(driver: D, capability: &'static str) -> Self {
        Self::CapabilityNotOffered {
            driver: driver.into(),
            capability,
        }
    }

    pub fn context<S: Into<String>>(message: S) -> Self {
        Self::ContextCreation(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<toml::ser::Error> for VoError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(format!("failed to serialize config: {}", err))
    }
}
