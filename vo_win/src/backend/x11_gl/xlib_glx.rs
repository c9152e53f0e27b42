//! libX11/libGL loaded at runtime through `x11-dl`.

use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_void};
use std::ptr;

use x11_dl::glx::{self, Glx};
use x11_dl::xlib::{self, Xlib};

use super::glx_api::{
    ContextHandle, FbConfig, GlxApi, VisualInfo, CREATE_CONTEXT_ATTRIBS_FN,
};
use crate::error::{Result, VoError};

type CreateContextAttribsArb = unsafe extern "C" fn(
    *mut xlib::Display,
    glx::GLXFBConfig,
    glx::GLXContext,
    xlib::Bool,
    *const c_int,
) -> glx::GLXContext;

// Context creation with unsupported attributes raises X errors; the
// default Xlib handler would terminate the process.
unsafe extern "C" fn ignore_x_error(_: *mut xlib::Display, _: *mut xlib::XErrorEvent) -> c_int {
    0
}

/// Own Xlib display connection used for all GLX calls. Window ids are
/// server-global, so drawables created on the x11rb connection work here.
pub struct XlibGlx {
    xlib: Xlib,
    glx: Glx,
    display: *mut xlib::Display,
    screen: c_int,
}

impl XlibGlx {
    pub fn open(display_name: Option<&str>) -> Result<Self> {
        let xlib = Xlib::open().map_err(|e| VoError::LibraryLoad(format!("libX11: {}", e)))?;
        let glx = Glx::open().map_err(|e| VoError::LibraryLoad(format!("libGL: {}", e)))?;

        let name = display_name
            .map(CString::new)
            .transpose()
            .map_err(|_| VoError::config("display name contains a NUL byte"))?;
        let name_ptr = name.as_ref().map_or(ptr::null(), |n| n.as_ptr());

        let display = unsafe { (xlib.XOpenDisplay)(name_ptr) };
        if display.is_null() {
            return Err(VoError::init("x11", "cannot open X display for GLX"));
        }
        let screen = unsafe { (xlib.XDefaultScreen)(display) };

        Ok(Self {
            xlib,
            glx,
            display,
            screen,
        })
    }

    fn create_context_attribs_fn(&self) -> Option<CreateContextAttribsArb> {
        let addr = self.proc_address(CREATE_CONTEXT_ATTRIBS_FN)?;
        // SAFETY: the symbol has this signature per GLX_ARB_create_context.
        Some(unsafe { std::mem::transmute::<usize, CreateContextAttribsArb>(addr) })
    }
}

impl GlxApi for XlibGlx {
    fn query_version(&self) -> Option<(i32, i32)> {
        let (mut major, mut minor) = (0, 0);
        let ok = unsafe { (self.glx.glXQueryVersion)(self.display, &mut major, &mut minor) };
        (ok != 0).then_some((major, minor))
    }

    fn choose_fb_configs(&self, attribs: &[c_int]) -> Vec<FbConfig> {
        let mut count: c_int = 0;
        let configs = unsafe {
            (self.glx.glXChooseFBConfig)(self.display, self.screen, attribs.as_ptr(), &mut count)
        };
        if configs.is_null() {
            return Vec::new();
        }
        let list = (0..count.max(0) as usize)
            .map(|i| FbConfig(unsafe { *configs.add(i) } as usize))
            .collect();
        unsafe { (self.xlib.XFree)(configs as *mut c_void) };
        list
    }

    fn fb_config_attrib(&self, fbc: FbConfig, attrib: c_int) -> Option<c_int> {
        let mut value: c_int = 0;
        let rc = unsafe {
            (self.glx.glXGetFBConfigAttrib)(
                self.display,
                fbc.0 as glx::GLXFBConfig,
                attrib,
                &mut value,
            )
        };
        (rc == 0).then_some(value)
    }

    fn visual_for(&self, fbc: FbConfig) -> Option<VisualInfo> {
        let vi =
            unsafe { (self.glx.glXGetVisualFromFBConfig)(self.display, fbc.0 as glx::GLXFBConfig) };
        if vi.is_null() {
            return None;
        }
        let v = unsafe { &*vi };
        Some(VisualInfo {
            id: v.visualid as u32,
            depth: v.depth,
            red_mask: v.red_mask as u64,
            green_mask: v.green_mask as u64,
            blue_mask: v.blue_mask as u64,
            handle: vi as usize,
        })
    }

    fn free_visual(&self, visual: &VisualInfo) {
        if visual.handle != 0 {
            unsafe { (self.xlib.XFree)(visual.handle as *mut c_void) };
        }
    }

    fn extensions(&self) -> String {
        let s = unsafe { (self.glx.glXQueryExtensionsString)(self.display, self.screen) };
        if s.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()
    }

    fn proc_address(&self, name: &str) -> Option<usize> {
        let name = CString::new(name).ok()?;
        let f = unsafe { (self.glx.glXGetProcAddress)(name.as_ptr() as *const u8) }?;
        Some(f as usize)
    }

    fn create_context_attribs(&self, fbc: FbConfig, attribs: &[c_int]) -> Option<ContextHandle> {
        let create = self.create_context_attribs_fn()?;
        let context = unsafe {
            let previous = (self.xlib.XSetErrorHandler)(Some(ignore_x_error));
            let context = create(
                self.display,
                fbc.0 as glx::GLXFBConfig,
                ptr::null_mut(),
                xlib::True,
                attribs.as_ptr(),
            );
            (self.xlib.XSync)(self.display, xlib::False);
            (self.xlib.XSetErrorHandler)(previous);
            context
        };
        (!context.is_null()).then(|| ContextHandle(context as usize))
    }

    fn create_legacy_context(&self, visual: &VisualInfo) -> Option<ContextHandle> {
        let context = unsafe {
            (self.glx.glXCreateContext)(
                self.display,
                visual.handle as *mut xlib::XVisualInfo,
                ptr::null_mut(),
                xlib::True,
            )
        };
        (!context.is_null()).then(|| ContextHandle(context as usize))
    }

    fn make_current(&self, drawable: Option<u64>, context: Option<ContextHandle>) -> bool {
        let drawable = drawable.unwrap_or(0) as glx::GLXDrawable;
        let context = context.map_or(ptr::null_mut(), |c| c.0 as glx::GLXContext);
        unsafe { (self.glx.glXMakeCurrent)(self.display, drawable, context) != 0 }
    }

    fn destroy_context(&self, context: ContextHandle) {
        unsafe { (self.glx.glXDestroyContext)(self.display, context.0 as glx::GLXContext) };
    }

    fn is_direct(&self, context: ContextHandle) -> bool {
        unsafe { (self.glx.glXIsDirect)(self.display, context.0 as glx::GLXContext) != 0 }
    }

    fn swap_buffers(&self, drawable: u64) {
        unsafe { (self.glx.glXSwapBuffers)(self.display, drawable as glx::GLXDrawable) };
    }
}

impl Drop for XlibGlx {
    fn drop(&mut self) {
        unsafe { (self.xlib.XCloseDisplay)(self.display) };
    }
}
