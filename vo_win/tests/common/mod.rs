//! Mock drivers and a scripted GLX for the integration tests.
#![allow(dead_code)]

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::time::Instant;

use vo_win::{
    Backend, ControlReply, ControlRequest, CreateFlags, DriverDescriptor, GlSurfaceProvider,
    GlobalConfig, LogChannel, Result, SurfaceVisual, VoError, VoEvents, VoFlags, VoWin,
    WinHandle,
};

thread_local! {
    static PREINIT_CALLS: Cell<u32> = const { Cell::new(0) };
    static UNINIT_CALLS: Cell<u32> = const { Cell::new(0) };
}

pub fn preinit_calls() -> u32 {
    PREINIT_CALLS.with(Cell::get)
}

pub fn uninit_calls() -> u32 {
    UNINIT_CALLS.with(Cell::get)
}

pub fn config() -> Arc<GlobalConfig> {
    Arc::new(GlobalConfig::default())
}

pub fn create(driver: &'static DriverDescriptor) -> Result<VoWin> {
    VoWin::create(
        config(),
        &LogChannel::default(),
        None,
        CreateFlags::empty(),
        driver,
    )
}

/// Backend without a real window: waits on the doorbell only.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub window: Option<u64>,
    pub size: (i32, i32),
    pub title: Option<String>,
    /// Returned (and cleared) by the next `wait_events`.
    pub queued: VoEvents,
    /// Applied by the next `wait_events` as a resize.
    pub resize_to: Option<(i32, i32)>,
    pub last_visual: Option<SurfaceVisual>,
    pub windows_created: u32,
}

fn mock_preinit(_win: &mut WinHandle) -> Result<Box<dyn Backend>> {
    PREINIT_CALLS.with(|c| c.set(c.get() + 1));
    Ok(Box::new(MockBackend::default()))
}

fn failing_preinit(_win: &mut WinHandle) -> Result<Box<dyn Backend>> {
    PREINIT_CALLS.with(|c| c.set(c.get() + 1));
    Err(VoError::init("failing", "no display"))
}

pub static MOCK_DRIVER: DriverDescriptor = DriverDescriptor {
    name: "mock",
    description: "mock window",
    preinit: mock_preinit,
};

pub static FAILING_DRIVER: DriverDescriptor = DriverDescriptor {
    name: "failing",
    description: "always fails to initialize",
    preinit: failing_preinit,
};

impl MockBackend {
    fn publish(&mut self, win: &mut WinHandle, size: (i32, i32)) {
        self.size = (size.0.max(1), size.1.max(1));
        win.set_size(self.size.0, self.size.1);
    }
}

impl Backend for MockBackend {
    fn uninit(&mut self, _win: &mut WinHandle) {
        UNINIT_CALLS.with(|c| c.set(c.get() + 1));
    }

    fn reconfig(&mut self, win: &mut WinHandle, w: i32, h: i32, _flags: VoFlags) -> Result<()> {
        if self.window.is_none() {
            self.window = Some(0x40_0001);
            self.windows_created += 1;
        }
        self.publish(win, (w, h));
        Ok(())
    }

    fn control(&mut self, _win: &mut WinHandle, request: &mut ControlRequest) -> ControlReply {
        match request {
            ControlRequest::SetTitle(title) => {
                self.title = Some(title.clone());
                ControlReply::True
            }
            ControlRequest::GetWindowSize(slot) => {
                if self.window.is_none() {
                    return ControlReply::False;
                }
                *slot = Some(self.size);
                ControlReply::True
            }
            _ => ControlReply::NotImplemented,
        }
    }

    fn wait_events(&mut self, win: &mut WinHandle, until: Instant) -> Result<VoEvents> {
        let mut events = std::mem::take(&mut self.queued);
        if let Some(size) = self.resize_to.take() {
            self.publish(win, size);
            events |= VoEvents::RESIZE;
        }
        let until = if events.is_empty() {
            until
        } else {
            Instant::now()
        };
        win.wait_event_fd(until)?;
        Ok(events)
    }

    fn surface_provider(&mut self) -> Option<&mut dyn GlSurfaceProvider> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl GlSurfaceProvider for MockBackend {
    fn create_gl_window(
        &mut self,
        win: &mut WinHandle,
        visual: Option<SurfaceVisual>,
        _flags: VoFlags,
    ) -> Result<u64> {
        self.windows_created += 1;
        let window = 0x40_0000 + u64::from(self.windows_created);
        self.window = Some(window);
        self.last_visual = visual;
        let size = (
            win.global.vo.width as i32,
            win.global.vo.height as i32,
        );
        self.publish(win, size);
        Ok(window)
    }
}

#[cfg(feature = "backend-x11")]
pub use self::glx::*;

#[cfg(feature = "backend-x11")]
mod glx {
    use super::*;
    use std::os::raw::c_int;
    use std::rc::Rc;
    use vo_win::backend::x11_gl::glx_api::*;
    use vo_win::backend::x11_gl::X11GlBackend;

    /// One simulated framebuffer configuration.
    #[derive(Debug, Clone)]
    pub struct FakeConfig {
        pub rgb: [i32; 3],
        pub alpha_bits: i32,
        pub stereo: bool,
        /// (visual id, depth, red, green, blue masks)
        pub visual: Option<(u32, i32, u64, u64, u64)>,
    }

    impl FakeConfig {
        pub fn rgb888(visual_id: u32) -> Self {
            Self {
                rgb: [8, 8, 8],
                alpha_bits: 0,
                stereo: false,
                visual: Some((visual_id, 24, 0xff0000, 0x00ff00, 0x0000ff)),
            }
        }

        pub fn with_alpha(mut self, bits: i32) -> Self {
            self.alpha_bits = bits;
            self
        }

        pub fn with_stereo(mut self) -> Self {
            self.stereo = true;
            self
        }

        pub fn without_visual(mut self) -> Self {
            self.visual = None;
            self
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum GlxCall {
        CreateModern(Vec<c_int>),
        CreateLegacy(u32),
        MakeCurrent(Option<u64>, Option<ContextHandle>),
        Destroy(ContextHandle),
        Swap(u64),
    }

    /// What the fake saw; shared with the test after the fake is moved into a backend.
    #[derive(Debug, Default)]
    pub struct GlxRecord {
        pub calls: RefCell<Vec<GlxCall>>,
        pub live_visuals: Cell<i32>,
        pub current: Cell<Option<ContextHandle>>,
        pub destroyed_while_current: Cell<u32>,
    }

    impl GlxRecord {
        pub fn calls(&self) -> Vec<GlxCall> {
            self.calls.borrow().clone()
        }

        pub fn count(&self, pred: impl Fn(&GlxCall) -> bool) -> usize {
            self.calls.borrow().iter().filter(|c| pred(c)).count()
        }
    }

    pub struct FakeGlx {
        pub version: Option<(i32, i32)>,
        pub configs: Vec<FakeConfig>,
        pub extensions: String,
        pub has_attribs_fn: bool,
        pub modern_fails: bool,
        pub legacy_fails: bool,
        pub make_current_fails: bool,
        pub direct: bool,
        pub record: Rc<GlxRecord>,
    }

    impl Default for FakeGlx {
        fn default() -> Self {
            Self {
                version: Some((1, 4)),
                configs: vec![FakeConfig::rgb888(0x21)],
                extensions: "GLX_ARB_create_context GLX_ARB_create_context_profile \
                             GLX_EXT_swap_control"
                    .to_string(),
                has_attribs_fn: true,
                modern_fails: false,
                legacy_fails: false,
                make_current_fails: false,
                direct: true,
                record: Rc::new(GlxRecord::default()),
            }
        }
    }

    fn attrib(attribs: &[c_int], name: c_int) -> Option<c_int> {
        attribs
            .chunks_exact(2)
            .take_while(|pair| pair[0] != GLX_NONE)
            .find(|pair| pair[0] == name)
            .map(|pair| pair[1])
    }

    impl GlxApi for FakeGlx {
        fn query_version(&self) -> Option<(i32, i32)> {
            self.version
        }

        fn choose_fb_configs(&self, attribs: &[c_int]) -> Vec<FbConfig> {
            let want_alpha = attrib(attribs, GLX_ALPHA_SIZE).unwrap_or(0);
            let want_stereo = attrib(attribs, GLX_STEREO).unwrap_or(GLX_FALSE) == GLX_TRUE;
            self.configs
                .iter()
                .enumerate()
                .filter(|(_, c)| c.alpha_bits >= want_alpha && c.stereo == want_stereo)
                .map(|(i, _)| FbConfig(i))
                .collect()
        }

        fn fb_config_attrib(&self, fbc: FbConfig, attrib: c_int) -> Option<c_int> {
            let config = self.configs.get(fbc.0)?;
            match attrib {
                GLX_RED_SIZE => Some(config.rgb[0]),
                GLX_GREEN_SIZE => Some(config.rgb[1]),
                GLX_BLUE_SIZE => Some(config.rgb[2]),
                GLX_ALPHA_SIZE => Some(config.alpha_bits),
                _ => None,
            }
        }

        fn visual_for(&self, fbc: FbConfig) -> Option<VisualInfo> {
            let (id, depth, r, g, b) = self.configs.get(fbc.0)?.visual?;
            self.record.live_visuals.set(self.record.live_visuals.get() + 1);
            Some(VisualInfo {
                id,
                depth,
                red_mask: r,
                green_mask: g,
                blue_mask: b,
                handle: 0x1000 + fbc.0,
            })
        }

        fn free_visual(&self, _visual: &VisualInfo) {
            self.record.live_visuals.set(self.record.live_visuals.get() - 1);
        }

        fn extensions(&self) -> String {
            self.extensions.clone()
        }

        fn proc_address(&self, name: &str) -> Option<usize> {
            if name == CREATE_CONTEXT_ATTRIBS_FN {
                return self.has_attribs_fn.then_some(0x1);
            }
            Some(0x2000)
        }

        fn create_context_attribs(&self, _fbc: FbConfig, attribs: &[c_int]) -> Option<ContextHandle> {
            self.record
                .calls
                .borrow_mut()
                .push(GlxCall::CreateModern(attribs.to_vec()));
            (!self.modern_fails).then_some(ContextHandle(1))
        }

        fn create_legacy_context(&self, visual: &VisualInfo) -> Option<ContextHandle> {
            self.record
                .calls
                .borrow_mut()
                .push(GlxCall::CreateLegacy(visual.id));
            (!self.legacy_fails).then_some(ContextHandle(2))
        }

        fn make_current(&self, drawable: Option<u64>, context: Option<ContextHandle>) -> bool {
            self.record
                .calls
                .borrow_mut()
                .push(GlxCall::MakeCurrent(drawable, context));
            if context.is_some() && self.make_current_fails {
                return false;
            }
            self.record.current.set(context);
            true
        }

        fn destroy_context(&self, context: ContextHandle) {
            if self.record.current.get() == Some(context) {
                self.record
                    .destroyed_while_current
                    .set(self.record.destroyed_while_current.get() + 1);
            }
            self.record.calls.borrow_mut().push(GlxCall::Destroy(context));
        }

        fn is_direct(&self, _context: ContextHandle) -> bool {
            self.direct
        }

        fn swap_buffers(&self, drawable: u64) {
            self.record.calls.borrow_mut().push(GlxCall::Swap(drawable));
        }
    }

    thread_local! {
        static NEXT_GLX: RefCell<Option<FakeGlx>> = const { RefCell::new(None) };
    }

    fn mock_gl_preinit(win: &mut WinHandle) -> Result<Box<dyn Backend>> {
        let inner = VoWin::create_nested(win, CreateFlags::empty(), &MOCK_DRIVER)?;
        let glx = NEXT_GLX.with(|g| g.borrow_mut().take()).unwrap_or_default();
        Ok(Box::new(X11GlBackend::new(inner, Box::new(glx))))
    }

    /// GLX backend over a mock window and the scripted GLX.
    pub static MOCK_GL_DRIVER: DriverDescriptor = DriverDescriptor {
        name: "mock-gl",
        description: "GLX over a mock window",
        preinit: mock_gl_preinit,
    };

    /// Create a manager on `MOCK_GL_DRIVER` that uses `glx`.
    pub fn create_gl(glx: FakeGlx) -> (VoWin, Rc<GlxRecord>) {
        let record = glx.record.clone();
        NEXT_GLX.with(|g| *g.borrow_mut() = Some(glx));
        let win = create(&MOCK_GL_DRIVER).expect("mock GL driver initializes");
        (win, record)
    }

    pub fn inner_mock(win: &mut VoWin) -> &mut MockBackend {
        win.backend_as::<X11GlBackend>()
            .expect("GLX backend")
            .inner()
            .backend_as::<MockBackend>()
            .expect("mock window backend")
    }
}
