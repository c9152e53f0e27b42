//! Configuration management

use crate::error::{Result, VoError};
use crate::gl::GlVersion;
use crate::events::VoFlags;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration shared read-only by every manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub vo: VoOptions,
    pub logging: LoggingConfig,
}

/// Window and context options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoOptions {
    /// X display to connect to; `$DISPLAY` when unset.
    pub x11_display: Option<String>,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub monitor_pixel_aspect: f64,
    /// Requested GL version as "major.minor".
    pub gl_version: String,
    pub alpha: bool,
    pub stereo: bool,
    pub gl_debug: bool,
    pub start_hidden: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_to_file: bool,
    pub log_dir: Option<PathBuf>,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for VoOptions {
    fn default() -> Self {
        Self {
            x11_display: None,
            title: "vo_win".to_string(),
            width: 640,
            height: 480,
            monitor_pixel_aspect: 1.0,
            gl_version: "3.2".to_string(),
            alpha: false,
            stereo: false,
            gl_debug: false,
            start_hidden: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_dir: None,
            max_file_size: 10_000_000, // 10MB
            max_files: 5,
        }
    }
}

impl VoOptions {
    pub fn gl_version(&self) -> Result<GlVersion> {
        self.gl_version.parse()
    }

    /// Context flags requested by the options.
    pub fn context_flags(&self) -> VoFlags {
        let mut flags = VoFlags::empty();
        flags.set(VoFlags::ALPHA, self.alpha);
        flags.set(VoFlags::STEREO, self.stereo);
        flags.set(VoFlags::GL_DEBUG, self.gl_debug);
        flags.set(VoFlags::HIDDEN, self.start_hidden);
        flags
    }
}

impl GlobalConfig {
    /// Load from the per-user config file, or defaults if there is none.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if config_path.exists() {
            let config = Self::load_from(&config_path)?;
            log::info!("Loaded configuration from {:?}", config_path);
            Ok(config)
        } else {
            log::debug!("No configuration at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VoError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: GlobalConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VoError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| VoError::config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VoError::config("Cannot determine config directory"))?;

        Ok(config_dir.join("vo_win").join("config.toml"))
    }

    /// Clamp values into usable ranges; reject ones that cannot be repaired.
    pub fn validate(&mut self) -> Result<()> {
        self.vo.width = self.vo.width.max(1);
        self.vo.height = self.vo.height.max(1);
        if !(self.vo.monitor_pixel_aspect.is_finite() && self.vo.monitor_pixel_aspect > 0.0) {
            self.vo.monitor_pixel_aspect = 1.0;
        }
        self.vo.gl_version()?;

        self.logging.max_file_size = self.logging.max_file_size.max(1_000_000); // At least 1MB
        self.logging.max_files = self.logging.max_files.clamp(1, 20);

        Ok(())
    }
}
