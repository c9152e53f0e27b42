//! GL version requests and the resolved GL function table.

use crate::error::VoError;
use crate::logging::LogChannel;
use crate::{vo_trace, vo_verbose};
use bitflags::bitflags;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Requested context version, ordered by (major, minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlVersion {
    pub major: u8,
    pub minor: u8,
}

impl GlVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// First version that can be requested through attribute-based creation.
    pub const MODERN: GlVersion = GlVersion::new(3, 0);
}

impl Default for GlVersion {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

impl fmt::Display for GlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for GlVersion {
    type Err = VoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || VoError::config(format!("invalid GL version '{}', expected major.minor", s));
        let (major, minor) = s.trim().split_once('.').ok_or_else(bad)?;
        let major = major.parse().map_err(|_| bad())?;
        let minor = minor.parse().map_err(|_| bad())?;
        Ok(Self { major, minor })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GlCaps: u32 {
        /// Hardware (direct) rendering.
        const NO_SW         = 1 << 0;
        const FRAMEBUFFER   = 1 << 1;
        const DEBUG_OUTPUT  = 1 << 2;
        const SWAP_CONTROL  = 1 << 3;
    }
}

/// Entry points looked up after a context is bound.
const ENTRY_POINTS: &[&str] = &[
    "glGetString",
    "glGetIntegerv",
    "glViewport",
    "glClear",
    "glClearColor",
    "glFlush",
    "glFinish",
    "glGenFramebuffers",
    "glBindFramebuffer",
    "glDeleteFramebuffers",
    "glDebugMessageCallback",
    "glXSwapIntervalEXT",
    "glXSwapIntervalMESA",
    "glXSwapIntervalSGI",
];

/// Swap-interval entry points paired with the GLX extension that makes them usable.
const SWAP_CONTROL: &[(&str, &str)] = &[
    ("glXSwapIntervalEXT", "GLX_EXT_swap_control"),
    ("glXSwapIntervalMESA", "GLX_MESA_swap_control"),
    ("glXSwapIntervalSGI", "GLX_SGI_swap_control"),
];

/// True if `name` appears as a whole token in a space-separated extension list.
pub fn has_extension(extensions: &str, name: &str) -> bool {
    extensions.split_ascii_whitespace().any(|ext| ext == name)
}

/// Function table for the current context.
///
/// Addresses are opaque; callers cast them to the proper `extern "C"` types.
#[derive(Debug, Clone, Default)]
pub struct GlFunctions {
    extensions: String,
    procs: HashMap<&'static str, usize>,
    caps: GlCaps,
}

impl GlFunctions {
    pub fn load<F>(resolve: F, platform_extensions: &str, log: &LogChannel) -> Self
    where
        F: Fn(&str) -> Option<usize>,
    {
        let mut procs = HashMap::new();
        for &name in ENTRY_POINTS {
            match resolve(name) {
                Some(addr) if addr != 0 => {
                    procs.insert(name, addr);
                }
                _ => vo_trace!(log, "GL entry point {} not available", name),
            }
        }

        let mut caps = GlCaps::NO_SW;
        if procs.contains_key("glGenFramebuffers") && procs.contains_key("glBindFramebuffer") {
            caps |= GlCaps::FRAMEBUFFER;
        }
        if procs.contains_key("glDebugMessageCallback") {
            caps |= GlCaps::DEBUG_OUTPUT;
        }
        if SWAP_CONTROL
            .iter()
            .any(|(func, ext)| procs.contains_key(func) && has_extension(platform_extensions, ext))
        {
            caps |= GlCaps::SWAP_CONTROL;
        }

        vo_verbose!(log, "loaded {} GL functions, caps {:?}", procs.len(), caps);
        Self {
            extensions: platform_extensions.to_string(),
            procs,
            caps,
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.procs.get(name).copied()
    }

    pub fn extensions(&self) -> &str {
        &self.extensions
    }

    pub fn caps(&self) -> GlCaps {
        self.caps
    }

    pub fn has_extension(&self, name: &str) -> bool {
        has_extension(&self.extensions, name)
    }

    pub(crate) fn clear_caps(&mut self, caps: GlCaps) {
        self.caps.remove(caps);
    }
}
