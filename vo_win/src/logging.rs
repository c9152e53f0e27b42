//! Per-manager log channels on top of the `log` facade, and logger setup.

use crate::config::LoggingConfig;
use crate::error::Result;
use flexi_logger::LoggerHandle;
use log::Level;
use std::path::PathBuf;

/// A named log target. Child channels append their name to the parent's.
///
/// A quiet channel (created while probing) reports everything more severe
/// than `debug` at `debug`, so a backend that is simply absent does not
/// print errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChannel {
    target: String,
    quiet: bool,
}

impl LogChannel {
    pub fn root(name: &str) -> Self {
        Self {
            target: name.to_string(),
            quiet: false,
        }
    }

    pub fn child(&self, name: &str) -> Self {
        Self {
            target: format!("{}/{}", self.target, name),
            quiet: self.quiet,
        }
    }

    pub fn quieted(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Level a message of `level` is actually emitted at.
    pub fn level_for(&self, level: Level) -> Level {
        if self.quiet && level < Level::Debug {
            Level::Debug
        } else {
            level
        }
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::root("vo")
    }
}

#[macro_export]
macro_rules! vo_fatal {
    ($chan:expr, $($arg:tt)+) => {
        ::log::log!(target: $chan.target(), $chan.level_for(::log::Level::Error), $($arg)+)
    };
}

#[macro_export]
macro_rules! vo_err {
    ($chan:expr, $($arg:tt)+) => {
        ::log::log!(target: $chan.target(), $chan.level_for(::log::Level::Error), $($arg)+)
    };
}

#[macro_export]
macro_rules! vo_warn {
    ($chan:expr, $($arg:tt)+) => {
        ::log::log!(target: $chan.target(), $chan.level_for(::log::Level::Warn), $($arg)+)
    };
}

#[macro_export]
macro_rules! vo_info {
    ($chan:expr, $($arg:tt)+) => {
        ::log::log!(target: $chan.target(), $chan.level_for(::log::Level::Info), $($arg)+)
    };
}

#[macro_export]
macro_rules! vo_verbose {
    ($chan:expr, $($arg:tt)+) => {
        ::log::log!(target: $chan.target(), ::log::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! vo_trace {
    ($chan:expr, $($arg:tt)+) => {
        ::log::log!(target: $chan.target(), ::log::Level::Trace, $($arg)+)
    };
}

/// Start the process-wide logger.
///
/// `RUST_LOG` overrides the configured level. Keep the returned handle
/// alive for as long as file logging should continue.
pub fn initialize_logging(program_name: &str, config: &LoggingConfig) -> Result<LoggerHandle> {
    use chrono::Local as ChronoLocal;
    use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};

    let log_spec = std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());
    let logger = Logger::try_with_str(log_spec)?
        .format_for_files(flexi_logger::detailed_format)
        .format_for_stderr(flexi_logger::colored_opt_format);

    if !config.log_to_file {
        let handle = logger.log_to_stderr().start()?;
        return Ok(handle);
    }

    let log_dir = config
        .log_dir
        .clone()
        .or_else(|| dirs::state_dir().map(|d| d.join("vo_win")))
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&log_dir)?;

    let timestamp = ChronoLocal::now().format("%Y-%m-%d_%H_%M_%S").to_string();
    let log_filename = format!("{}_{}", program_name, timestamp);

    let handle = logger
        .log_to_file(
            FileSpec::default()
                .directory(&log_dir)
                .basename(log_filename)
                .suffix("log"),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .rotate(
            Criterion::Size(config.max_file_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.max_files),
        )
        .start()?;

    log::info!("Log directory: {}", log_dir.display());
    Ok(handle)
}
