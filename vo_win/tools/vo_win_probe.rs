use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use vo_win::{
    initialize_logging, ControlRequest, CreateFlags, GlVersion, GlobalConfig, InputEvent,
    InputSink, LogChannel, VoEvents, VoFlags, VoWin, DRIVERS,
};

#[derive(Parser)]
#[command(name = "vo-win-probe", version, about = "Open a video output window and report what was negotiated")]
struct Cli {
    /// Configuration file (default: the per-user config.toml)
    #[arg(long, global = true, env = "VO_WIN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered drivers in probe order
    List,

    /// Create a window and GL context, then pump events
    Run {
        /// Driver to use; autoprobe when omitted
        #[arg(long)]
        driver: Option<String>,

        /// GL version as major.minor
        #[arg(long)]
        gl_version: Option<GlVersion>,

        #[arg(long)]
        alpha: bool,

        #[arg(long)]
        stereo: bool,

        /// Request a debug context
        #[arg(long)]
        debug: bool,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Close after this many seconds; run until closed when omitted
        #[arg(long)]
        seconds: Option<u64>,
    },
}

fn now_ts() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn load_config(path: Option<&PathBuf>) -> Result<GlobalConfig> {
    let config = match path {
        Some(path) => GlobalConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GlobalConfig::load()?,
    };
    Ok(config)
}

fn list() {
    for driver in DRIVERS {
        println!("{:<14} {}", driver.name, driver.description);
    }
}

/// SIGINT/SIGTERM become a CLOSE event on the window.
fn spawn_signal_thread(win: &VoWin) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let waker = win.waker();
    thread::spawn(move || {
        for sig in signals.forever() {
            log::info!("received signal {}", sig);
            waker.signal_event(VoEvents::CLOSE);
        }
    });
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run(
    mut config: GlobalConfig,
    driver: Option<String>,
    gl_version: Option<GlVersion>,
    alpha: bool,
    stereo: bool,
    debug: bool,
    size: (Option<u32>, Option<u32>),
    seconds: Option<u64>,
) -> Result<()> {
    if let Some(w) = size.0 {
        config.vo.width = w;
    }
    if let Some(h) = size.1 {
        config.vo.height = h;
    }
    config.vo.alpha |= alpha;
    config.vo.stereo |= stereo;
    config.vo.gl_debug |= debug;
    config.validate()?;

    let version = match gl_version {
        Some(v) => v,
        None => config.vo.gl_version()?,
    };
    let mut flags = config.vo.context_flags();
    let (w, h) = (config.vo.width as i32, config.vo.height as i32);

    let (tx, rx) = crossbeam_channel::unbounded::<InputEvent>();
    let input: Arc<dyn InputSink> = Arc::new(tx);
    let global = Arc::new(config);
    let log = LogChannel::default();

    let mut win = match driver {
        Some(name) => VoWin::create_by_name(global, &log, Some(input), CreateFlags::empty(), &name)?,
        None => VoWin::probe(global, &log, Some(input), CreateFlags::empty(), DRIVERS)?,
    };
    println!("[{}] driver: {}", now_ts(), win.driver().name);

    let requested = flags;
    if win.has_gl() {
        win.create_context(version, &mut flags)?;
        let caps = win.gl_functions()?.caps();
        println!("GL {} context, caps {:?}", version, caps);
        for lost in (requested - flags).iter_names() {
            println!("  {} not available", lost.0);
        }
    } else {
        println!("driver offers no GL context");
    }
    win.reconfig(w, h, flags)?;

    let mut depth = ControlRequest::bit_depth();
    if win.control(&mut depth).is_true() {
        if let ControlRequest::GetBitDepth(Some([r, g, b])) = depth {
            println!("bit depth: {}/{}/{}", r, g, b);
        }
    }

    spawn_signal_thread(&win)?;

    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    loop {
        let until = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(60));
        let events = win.wait_events(until)?;

        for event in rx.try_iter() {
            log::debug!("input: {:?}", event);
            if event == InputEvent::CloseWin {
                win.signal_event(VoEvents::CLOSE);
            }
        }
        if events.contains(VoEvents::RESIZE) {
            let size = win.get_size();
            println!("[{}] resized to {}x{}", now_ts(), size.w, size.h);
        }
        if events.contains(VoEvents::EXPOSE) && win.has_gl() {
            win.swap_buffers()?;
        }
        if events.contains(VoEvents::CLOSE) {
            println!("[{}] window closed", now_ts());
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
    }

    VoWin::destroy(Some(win));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::List => {
            list();
            Ok(())
        }
        Commands::Run {
            driver,
            gl_version,
            alpha,
            stereo,
            debug,
            width,
            height,
            seconds,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let _logger = initialize_logging("vo-win-probe", &config.logging)?;
            if DRIVERS.is_empty() {
                bail!("built without any window backend");
            }
            run(
                config,
                driver,
                gl_version,
                alpha,
                stereo,
                debug,
                (width, height),
                seconds,
            )
        }
    }
}
