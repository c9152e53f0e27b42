//! Integration tests for the window manager facade

mod common;

use std::thread;
use std::time::{Duration, Instant};

use common::*;
use vo_win::{
    ControlReply, ControlRequest, CreateFlags, GlVersion, GlobalConfig, InputEvent, LogChannel,
    VideoParams, VoError, VoEvents, VoFlags, VoWin,
};

fn soon() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

#[test]
fn test_failed_preinit_never_uninits() {
    let err = create(&FAILING_DRIVER).unwrap_err();
    assert!(matches!(err, VoError::Init { .. }));
    assert_eq!(preinit_calls(), 1);
    assert_eq!(uninit_calls(), 0);
}

#[test]
fn test_destroy_uninits_once() {
    let win = create(&MOCK_DRIVER).unwrap();
    assert_eq!(win.driver().name, "mock");
    VoWin::destroy(Some(win));
    assert_eq!(uninit_calls(), 1);

    VoWin::destroy(None);
    assert_eq!(uninit_calls(), 1);
}

#[test]
fn test_drop_uninits_once() {
    {
        let mut win = create(&MOCK_DRIVER).unwrap();
        win.reconfig(100, 100, VoFlags::empty()).unwrap();
    }
    assert_eq!(uninit_calls(), 1);
}

#[test]
fn test_create_by_name_rejects_unknown() {
    let err = VoWin::create_by_name(
        config(),
        &LogChannel::default(),
        None,
        CreateFlags::empty(),
        "no-such-driver",
    )
    .unwrap_err();
    assert!(matches!(err, VoError::UnknownDriver(name) if name == "no-such-driver"));
}

#[test]
fn test_probe_skips_failing_drivers() {
    let win = VoWin::probe(
        config(),
        &LogChannel::default(),
        None,
        CreateFlags::empty(),
        &[&FAILING_DRIVER, &MOCK_DRIVER],
    )
    .unwrap();
    assert_eq!(win.driver().name, "mock");
    assert!(win.log().is_quiet());
    assert_eq!(win.log().target(), "vo/mock");
    assert_eq!(preinit_calls(), 2);
}

#[test]
fn test_probe_without_working_driver() {
    let err = VoWin::probe(
        config(),
        &LogChannel::default(),
        None,
        CreateFlags::empty(),
        &[&FAILING_DRIVER],
    )
    .unwrap_err();
    assert!(matches!(err, VoError::NoBackend));
    assert_eq!(uninit_calls(), 0);
}

#[test]
fn test_direct_creation_is_not_quiet() {
    let win = create(&MOCK_DRIVER).unwrap();
    assert!(!win.log().is_quiet());
    assert!(!win.handle().probing);
}

#[test]
fn test_backend_events_merge_with_signalled_ones() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    win.backend_as::<MockBackend>().unwrap().queued = VoEvents::EXPOSE;
    win.signal_event(VoEvents::CLOSE);

    let events = win.wait_events(soon()).unwrap();
    assert_eq!(events, VoEvents::EXPOSE | VoEvents::CLOSE);
}

#[test]
fn test_pending_events_return_without_sleeping() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    // No doorbell ring: only the pending set says there is work.
    win.handle().signal_event(VoEvents::RESIZE);

    let start = Instant::now();
    let events = win.wait_events(Instant::now() + Duration::from_secs(10)).unwrap();
    assert_eq!(events, VoEvents::RESIZE);
    assert!(start.elapsed() < Duration::from_secs(2));

    // Delivered once.
    let events = win.wait_events(Instant::now()).unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_wait_returns_at_deadline() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    let start = Instant::now();
    let events = win
        .wait_events(Instant::now() + Duration::from_millis(30))
        .unwrap();
    assert!(events.is_empty());
    assert!(start.elapsed() >= Duration::from_millis(25));
}

#[test]
fn test_expired_deadline_returns_immediately() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    let past = Instant::now();
    thread::sleep(Duration::from_millis(5));
    let start = Instant::now();
    assert!(win.wait_events(past).unwrap().is_empty());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_wakeup_from_another_thread() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    let waker = win.waker();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        waker.wakeup();
    });

    let start = Instant::now();
    let events = win.wait_events(Instant::now() + Duration::from_secs(10)).unwrap();
    assert!(events.is_empty());
    assert!(start.elapsed() < Duration::from_secs(5));
    t.join().unwrap();
}

#[test]
fn test_wakeup_before_wait_is_not_lost() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    win.wakeup();
    let start = Instant::now();
    win.wait_events(Instant::now() + Duration::from_secs(10)).unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_signal_event_from_another_thread() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    let waker = win.waker();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        waker.signal_event(VoEvents::CLOSE);
    });

    // The wait that gets interrupted also returns the signalled event.
    let start = Instant::now();
    let events = win.wait_events(Instant::now() + Duration::from_secs(10)).unwrap();
    assert_eq!(events, VoEvents::CLOSE);
    assert!(start.elapsed() < Duration::from_secs(5));
    t.join().unwrap();
}

#[test]
fn test_backend_resize_is_published() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    win.reconfig(640, 480, VoFlags::empty()).unwrap();
    win.backend_as::<MockBackend>().unwrap().resize_to = Some((800, 600));

    let events = win.wait_events(soon()).unwrap();
    assert!(events.contains(VoEvents::RESIZE));
    let size = win.get_size();
    assert_eq!((size.w, size.h), (800, 600));
}

#[test]
fn test_reconfig_enforces_minimum_size() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    win.reconfig(0, -5, VoFlags::empty()).unwrap();
    let size = win.get_size();
    assert_eq!((size.w, size.h), (1, 1));
    assert_eq!(size.monitor_par, 1.0);
}

#[test]
fn test_reconfig_vo() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    assert!(matches!(
        win.reconfig_vo(None, VoFlags::empty()),
        Err(VoError::NoVideoParams)
    ));

    let params = VideoParams {
        w: 720,
        h: 576,
        par: 16.0 / 15.0,
    };
    let size = win.reconfig_vo(Some(&params), VoFlags::empty()).unwrap();
    assert_eq!((size.w, size.h), (768, 576));

    let size = win
        .reconfig_vo(Some(&VideoParams::new(320, 240)), VoFlags::empty())
        .unwrap();
    assert_eq!((size.w, size.h), (320, 240));
    assert_eq!(win.backend_as::<MockBackend>().unwrap().windows_created, 1);
}

#[test]
fn test_control_requests() {
    let mut win = create(&MOCK_DRIVER).unwrap();

    let mut query = ControlRequest::window_size();
    assert_eq!(win.control(&mut query), ControlReply::False);

    win.reconfig(300, 200, VoFlags::empty()).unwrap();
    let mut query = ControlRequest::window_size();
    assert_eq!(win.control(&mut query), ControlReply::True);
    assert_eq!(query, ControlRequest::GetWindowSize(Some((300, 200))));

    let mut title = ControlRequest::SetTitle("movie.mkv".to_string());
    assert!(win.control(&mut title).is_true());
    assert_eq!(
        win.backend_as::<MockBackend>().unwrap().title.as_deref(),
        Some("movie.mkv")
    );

    let mut depth = ControlRequest::bit_depth();
    assert_eq!(win.control(&mut depth), ControlReply::NotImplemented);
    assert_eq!(depth, ControlRequest::GetBitDepth(None));
}

#[test]
fn test_gl_calls_on_window_only_driver() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    assert!(!win.has_gl());

    let mut flags = VoFlags::ALPHA;
    let err = win
        .create_context(GlVersion::default(), &mut flags)
        .unwrap_err();
    assert!(matches!(err, VoError::CapabilityNotOffered { ref driver, .. } if driver == "mock"));
    assert_eq!(flags, VoFlags::ALPHA);

    assert!(matches!(
        win.swap_buffers(),
        Err(VoError::CapabilityNotOffered { .. })
    ));
    assert!(matches!(
        win.gl_functions(),
        Err(VoError::CapabilityNotOffered { .. })
    ));
}

#[test]
fn test_gl_window_through_surface_provider() {
    let mut win = create(&MOCK_DRIVER).unwrap();
    let visual = vo_win::SurfaceVisual { id: 0x21, depth: 24 };
    let drawable = win.create_gl_window(Some(visual), VoFlags::empty()).unwrap();
    assert_ne!(drawable, 0);

    let mock = win.backend_as::<MockBackend>().unwrap();
    assert_eq!(mock.last_visual, Some(visual));
    assert_eq!(mock.window, Some(drawable));
    let size = win.get_size();
    assert_eq!((size.w, size.h), (640, 480));
}

#[test]
fn test_input_reaches_sink() {
    let (tx, rx) = crossbeam_channel::unbounded::<InputEvent>();
    let win = VoWin::create(
        config(),
        &LogChannel::default(),
        Some(std::sync::Arc::new(tx)),
        CreateFlags::empty(),
        &MOCK_DRIVER,
    )
    .unwrap();

    win.handle().put_input(InputEvent::Key {
        keycode: 24,
        state: 0,
        pressed: true,
    });
    assert_eq!(
        rx.try_recv().unwrap(),
        InputEvent::Key {
            keycode: 24,
            state: 0,
            pressed: true
        }
    );
}

#[test]
fn test_monitor_aspect_from_config() {
    let mut global = GlobalConfig::default();
    global.vo.monitor_pixel_aspect = 1.25;
    let mut win = VoWin::create(
        std::sync::Arc::new(global),
        &LogChannel::default(),
        None,
        CreateFlags::empty(),
        &MOCK_DRIVER,
    )
    .unwrap();
    win.reconfig(100, 100, VoFlags::empty()).unwrap();
    assert_eq!(win.get_size().monitor_par, 1.25);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = GlobalConfig::default();
    config.vo.title = "probe".to_string();
    config.vo.gl_version = "4.5".to_string();
    config.vo.alpha = true;
    config.save_to(&path).unwrap();

    let loaded = GlobalConfig::load_from(&path).unwrap();
    assert_eq!(loaded.vo.title, "probe");
    assert_eq!(loaded.vo.gl_version().unwrap(), GlVersion::new(4, 5));
    assert_eq!(loaded.vo.context_flags(), VoFlags::ALPHA);
}

#[test]
fn test_config_rejects_bad_gl_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[vo]\ngl_version = \"three\"\n").unwrap();

    assert!(matches!(
        GlobalConfig::load_from(&path),
        Err(VoError::Config { .. })
    ));
}

#[test]
fn test_partial_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[vo]\nwidth = 0\n").unwrap();

    let loaded = GlobalConfig::load_from(&path).unwrap();
    assert_eq!(loaded.vo.width, 1);
    assert_eq!(loaded.vo.height, 480);
    assert_eq!(loaded.logging.level, "info");
}
