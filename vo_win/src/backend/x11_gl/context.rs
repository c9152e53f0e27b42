//! GLX context negotiation.
//!
//! Tiers, in order: alpha config, stereo config, base config; then a
//! versioned core-profile context through GLX_ARB_create_context, falling
//! back to a visual-based legacy context.

use std::os::raw::c_int;

use super::fbconfig::{select_fb_config, FbAttribs};
use super::glx_api::*;
use crate::error::{Result, VoError};
use crate::events::VoFlags;
use crate::gl::{has_extension, GlCaps, GlFunctions, GlVersion};
use crate::logging::LogChannel;
use crate::{vo_err, vo_fatal, vo_verbose, vo_warn};

/// Creates the drawable for the chosen visual and returns its id.
pub type MakeWindow<'a> = dyn FnMut(Option<&VisualInfo>, VoFlags) -> Result<u64> + 'a;

/// Everything negotiated for one manager. Filled in step by step; the
/// context is created at most once.
#[derive(Debug, Default)]
pub struct GlxState {
    pub fbc: Option<FbConfig>,
    pub visual: Option<VisualInfo>,
    pub context: Option<ContextHandle>,
    pub window: Option<u64>,
    /// Red, green, blue bits of the most recently chosen configuration.
    pub depth: Option<[i32; 3]>,
    pub gl: Option<GlFunctions>,
}

impl GlxState {
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Produce a current context on a new drawable.
    ///
    /// ALPHA and STEREO are removed from `flags` when no configuration
    /// offers them. Returns immediately if a context already exists.
    pub fn negotiate(
        &mut self,
        api: &dyn GlxApi,
        log: &LogChannel,
        version: GlVersion,
        flags: &mut VoFlags,
        make_window: &mut MakeWindow<'_>,
    ) -> Result<()> {
        if self.context.is_some() {
            return Ok(());
        }
        // Leftovers of an earlier failed attempt.
        self.release(api);

        // FBConfigs were added in GLX 1.3.
        let (major, minor) = api.query_version().unwrap_or((0, 0));
        if (major, minor) < (1, 3) {
            vo_err!(log, "GLX version {}.{} older than 1.3", major, minor);
            return Err(VoError::GlxVersion { major, minor });
        }
        vo_verbose!(log, "GLX version {}.{}", major, minor);

        let fbc = Self::choose_config(api, log, flags)?;
        self.fbc = Some(fbc);

        self.visual = api.visual_for(fbc);
        match &self.visual {
            Some(v) => vo_verbose!(log, "GLX chose visual with ID 0x{:x}", v.id),
            None => vo_warn!(log, "selected GLX FB config has no associated X visual"),
        }
        self.depth = Some(
            [GLX_RED_SIZE, GLX_GREEN_SIZE, GLX_BLUE_SIZE]
                .map(|attrib| api.fb_config_attrib(fbc, attrib).unwrap_or(0)),
        );

        let window = make_window(self.visual.as_ref(), *flags)?;
        self.window = Some(window);

        let mut bound = false;
        if version >= GlVersion::MODERN {
            bound = self.create_modern(api, log, version, flags.contains(VoFlags::GL_DEBUG));
        }
        if !bound {
            self.create_legacy(api, log)?;
        }
        Ok(())
    }

    fn choose_config(api: &dyn GlxApi, log: &LogChannel, flags: &mut VoFlags) -> Result<FbConfig> {
        let mut attribs = FbAttribs::base();
        let mut fbc = None;

        if flags.contains(VoFlags::ALPHA) {
            attribs.set(GLX_ALPHA_SIZE, 1);
            fbc = select_fb_config(api, &attribs, true);
            if fbc.is_none() {
                vo_verbose!(log, "no framebuffer config with alpha, continuing without");
                attribs.set(GLX_ALPHA_SIZE, 0);
                flags.remove(VoFlags::ALPHA);
            }
        }

        if flags.contains(VoFlags::STEREO) {
            attribs.set(GLX_STEREO, GLX_TRUE);
            fbc = select_fb_config(api, &attribs, flags.contains(VoFlags::ALPHA));
            if fbc.is_none() {
                vo_warn!(log, "could not find a stereo visual, 3D will probably not work");
                attribs.set(GLX_STEREO, GLX_FALSE);
                flags.remove(VoFlags::STEREO);
            }
        }

        if fbc.is_none() {
            fbc = select_fb_config(api, &attribs, flags.contains(VoFlags::ALPHA));
        }
        fbc.ok_or_else(|| {
            vo_err!(log, "no GLX support present");
            VoError::NoFbConfig
        })
    }

    /// Attribute-based core profile context. `false` means: try the legacy path.
    fn create_modern(
        &mut self,
        api: &dyn GlxApi,
        log: &LogChannel,
        version: GlVersion,
        debug: bool,
    ) -> bool {
        let (Some(fbc), Some(window)) = (self.fbc, self.window) else {
            return false;
        };
        let have_ext = has_extension(&api.extensions(), ARB_CREATE_CONTEXT_EXT);
        if !have_ext || api.proc_address(CREATE_CONTEXT_ATTRIBS_FN).is_none() {
            vo_verbose!(log, "{} unavailable", ARB_CREATE_CONTEXT_EXT);
            return false;
        }

        let attribs: [c_int; 9] = [
            GLX_CONTEXT_MAJOR_VERSION_ARB,
            c_int::from(version.major),
            GLX_CONTEXT_MINOR_VERSION_ARB,
            c_int::from(version.minor),
            GLX_CONTEXT_PROFILE_MASK_ARB,
            GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
            GLX_CONTEXT_FLAGS_ARB,
            if debug { GLX_CONTEXT_DEBUG_BIT_ARB } else { 0 },
            GLX_NONE,
        ];
        let Some(context) = api.create_context_attribs(fbc, &attribs) else {
            vo_warn!(log, "could not create GL {} context, retrying with legacy context", version);
            return false;
        };

        if !api.make_current(Some(window), Some(context)) {
            vo_fatal!(log, "could not set GLX context");
            api.destroy_context(context);
            return false;
        }

        vo_verbose!(log, "created GL {} core profile context", version);
        self.finish(api, log, context);
        true
    }

    fn create_legacy(&mut self, api: &dyn GlxApi, log: &LogChannel) -> Result<()> {
        let window = self.window.ok_or(VoError::NoContext)?;
        let Some(visual) = &self.visual else {
            vo_fatal!(log, "can't create a legacy GLX context without X visual");
            return Err(VoError::NoVisual);
        };

        let Some(context) = api.create_legacy_context(visual) else {
            vo_fatal!(log, "could not create GLX context");
            return Err(VoError::context("glXCreateContext failed"));
        };

        if !api.make_current(Some(window), Some(context)) {
            vo_fatal!(log, "could not set GLX context");
            api.destroy_context(context);
            return Err(VoError::MakeCurrent);
        }

        vo_verbose!(log, "created legacy GLX context");
        self.finish(api, log, context);
        Ok(())
    }

    fn finish(&mut self, api: &dyn GlxApi, log: &LogChannel, context: ContextHandle) {
        let extensions = api.extensions();
        let mut gl = GlFunctions::load(|name| api.proc_address(name), &extensions, log);
        if !api.is_direct(context) {
            vo_warn!(log, "rendering context is indirect");
            gl.clear_caps(GlCaps::NO_SW);
        }
        self.context = Some(context);
        self.gl = Some(gl);
    }

    pub fn swap_buffers(&self, api: &dyn GlxApi) -> Result<()> {
        match (self.context, self.window) {
            (Some(_), Some(window)) => {
                api.swap_buffers(window);
                Ok(())
            }
            _ => Err(VoError::NoContext),
        }
    }

    /// Free the visual and destroy the context, unbinding it first.
    pub fn release(&mut self, api: &dyn GlxApi) {
        if let Some(visual) = self.visual.take() {
            api.free_visual(&visual);
        }
        if let Some(context) = self.context.take() {
            api.make_current(None, None);
            api.destroy_context(context);
        }
        self.gl = None;
        self.fbc = None;
        self.window = None;
    }
}
