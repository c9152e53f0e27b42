//! Framebuffer configuration attributes and selection.

use std::os::raw::c_int;

use super::glx_api::*;

/// Key/value GLX attribute list, `GLX_NONE` terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FbAttribs(Vec<c_int>);

impl FbAttribs {
    /// Double-buffered true-color, at least one bit per color channel,
    /// no alpha, no stereo.
    #[rustfmt::skip]
    pub fn base() -> Self {
        Self(vec![
            GLX_STEREO, GLX_FALSE,
            GLX_X_RENDERABLE, GLX_TRUE,
            GLX_X_VISUAL_TYPE, GLX_TRUE_COLOR,
            GLX_RED_SIZE, 1,
            GLX_GREEN_SIZE, 1,
            GLX_BLUE_SIZE, 1,
            GLX_ALPHA_SIZE, 0,
            GLX_DOUBLEBUFFER, GLX_TRUE,
            GLX_NONE,
        ])
    }

    /// Overwrite the value of an attribute already in the list.
    pub fn set(&mut self, name: c_int, value: c_int) {
        for pair in self.0.chunks_exact_mut(2) {
            if pair[0] == GLX_NONE {
                break;
            }
            if pair[0] == name {
                pair[1] = value;
                break;
            }
        }
    }

    pub fn get(&self, name: c_int) -> Option<c_int> {
        self.0
            .chunks_exact(2)
            .take_while(|pair| pair[0] != GLX_NONE)
            .find(|pair| pair[0] == name)
            .map(|pair| pair[1])
    }

    pub fn as_slice(&self) -> &[c_int] {
        &self.0
    }
}

/// Whether a visual has bits beyond its RGB masks, which can only be alpha.
///
/// Assumes channels of at most 8 bits packed into at most 32 bits: 24-bit
/// visuals are usually padded to 32 bits without being alpha-capable, so
/// only the declared depth counts. Depths of 0 or above 32 are rejected.
pub fn visual_has_alpha(visual: &VisualInfo) -> bool {
    let mask: u64 = match visual.depth {
        32 => u64::from(u32::MAX),
        d @ 1..=31 => (1u64 << d) - 1,
        _ => return false,
    };
    mask & !(visual.red_mask | visual.green_mask | visual.blue_mask) != 0
}

/// Pick a configuration for `attribs`.
///
/// The first (best-ranked) match wins, unless `alpha` is requested: then the
/// first match whose visual really has alpha bits takes precedence.
pub fn select_fb_config(api: &dyn GlxApi, attribs: &FbAttribs, alpha: bool) -> Option<FbConfig> {
    let configs = api.choose_fb_configs(attribs.as_slice());
    let mut chosen = *configs.first()?;

    if alpha {
        for &fbc in &configs {
            let Some(visual) = api.visual_for(fbc) else {
                continue;
            };
            let has_alpha = visual_has_alpha(&visual);
            api.free_visual(&visual);
            if has_alpha {
                chosen = fbc;
                break;
            }
        }
    }
    Some(chosen)
}
