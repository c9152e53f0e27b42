//! The GLX calls context negotiation needs, behind a trait.
//!
//! [`super::xlib_glx::XlibGlx`] forwards to libGL; tests substitute a
//! scripted implementation.

use std::os::raw::c_int;

// glx.h
pub const GLX_NONE: c_int = 0;
pub const GLX_FALSE: c_int = 0;
pub const GLX_TRUE: c_int = 1;
pub const GLX_DOUBLEBUFFER: c_int = 5;
pub const GLX_STEREO: c_int = 6;
pub const GLX_RED_SIZE: c_int = 8;
pub const GLX_GREEN_SIZE: c_int = 9;
pub const GLX_BLUE_SIZE: c_int = 10;
pub const GLX_ALPHA_SIZE: c_int = 11;
pub const GLX_X_VISUAL_TYPE: c_int = 0x22;
pub const GLX_TRUE_COLOR: c_int = 0x8002;
pub const GLX_X_RENDERABLE: c_int = 0x8012;

// GLX_ARB_create_context / GLX_ARB_create_context_profile
pub const GLX_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
pub const GLX_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
pub const GLX_CONTEXT_FLAGS_ARB: c_int = 0x2094;
pub const GLX_CONTEXT_PROFILE_MASK_ARB: c_int = 0x9126;
pub const GLX_CONTEXT_DEBUG_BIT_ARB: c_int = 0x0001;
pub const GLX_CONTEXT_CORE_PROFILE_BIT_ARB: c_int = 0x0001;

pub const ARB_CREATE_CONTEXT_EXT: &str = "GLX_ARB_create_context";
pub const CREATE_CONTEXT_ATTRIBS_FN: &str = "glXCreateContextAttribsARB";

/// Opaque framebuffer configuration handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FbConfig(pub usize);

/// Opaque rendering context handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub usize);

/// X visual derived from a framebuffer configuration.
///
/// Must be handed back to [`GlxApi::free_visual`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualInfo {
    pub id: u32,
    pub depth: i32,
    pub red_mask: u64,
    pub green_mask: u64,
    pub blue_mask: u64,
    /// Implementation-owned pointer or key.
    pub handle: usize,
}

pub trait GlxApi {
    /// GLX (major, minor), or `None` if the query fails.
    fn query_version(&self) -> Option<(i32, i32)>;

    /// Configurations matching a `GLX_NONE`-terminated attribute list, best first.
    fn choose_fb_configs(&self, attribs: &[c_int]) -> Vec<FbConfig>;

    fn fb_config_attrib(&self, fbc: FbConfig, attrib: c_int) -> Option<c_int>;

    fn visual_for(&self, fbc: FbConfig) -> Option<VisualInfo>;

    fn free_visual(&self, visual: &VisualInfo);

    /// Space-separated GLX extension list for the screen.
    fn extensions(&self) -> String;

    fn proc_address(&self, name: &str) -> Option<usize>;

    /// `glXCreateContextAttribsARB`; the caller has already checked it resolves.
    fn create_context_attribs(&self, fbc: FbConfig, attribs: &[c_int]) -> Option<ContextHandle>;

    /// Visual-based `glXCreateContext`, direct rendering preferred.
    fn create_legacy_context(&self, visual: &VisualInfo) -> Option<ContextHandle>;

    /// Bind `context` to `drawable`; `None`/`None` releases the current context.
    fn make_current(&self, drawable: Option<u64>, context: Option<ContextHandle>) -> bool;

    fn destroy_context(&self, context: ContextHandle);

    fn is_direct(&self, context: ContextHandle) -> bool;

    fn swap_buffers(&self, drawable: u64);
}
