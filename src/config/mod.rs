//! Configuration module for the OPS243 panel
//!
//! Settings live in one TOML file in the platform-appropriate config
//! directory under `dev.ops243.panel`:
//!
//! - **Linux**: `~/.config/dev.ops243.panel/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.ops243.panel/config.toml`
//! - **Windows**: `%APPDATA%\dev.ops243.panel\config.toml`
//!
//! Logs go to the data directory under the same application id.
//!
//! # Example
//!
//! ```ignore
//! use ops243_panel::config::AppConfig;
//!
//! let mut config = AppConfig::load_or_default();
//! config.serial.port = "/dev/ttyUSB0".to_string();
//! config.save()?;
//! ```

use crate::device::DeviceConfig;
use crate::error::{RadarError, Result};
use crate::protocol::ProtocolTiming;
use crate::session::{ExportFormat, FileExporter, RecordMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config and data directories
pub const APP_ID: &str = "dev.ops243.panel";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default serial port
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Baud rates the sensor supports
pub const SUPPORTED_BAUD_RATES: [u32; 2] = [115_200, 9_600];

/// Longest averaging window accepted, in seconds
pub const MAX_WINDOW_SECS: f64 = 3600.0;

/// Default cap on points held by one recording (10 hours at 10 Hz)
pub const DEFAULT_MAX_RECORDED_POINTS: usize = 360_000;

// ==================== Directories ====================

/// Get the application config directory path
pub fn app_config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Directory for the rolling log files
pub fn log_dir() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join("logs"))
}

/// Get the path to the config file
pub fn config_path() -> Option<PathBuf> {
    app_config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Sections ====================

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port path, or `mock` for the simulated radar
    pub port: String,
    pub baud_rate: u32,
    /// Per-iteration read timeout of the ingestion loop
    pub read_timeout_ms: u64,
    /// Pause after opening the port before the sensor is configured
    pub connect_settle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: SUPPORTED_BAUD_RATES[0],
            read_timeout_ms: 100,
            connect_settle_ms: 2000,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn connect_settle(&self) -> Duration {
        Duration::from_millis(self.connect_settle_ms)
    }
}

/// Command round-trip timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Wait between writing a command and reading its acknowledgment
    pub settle_delay_ms: u64,
    pub ack_timeout_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 50,
            ack_timeout_ms: 100,
        }
    }
}

impl ProtocolConfig {
    pub fn timing(&self) -> ProtocolTiming {
        ProtocolTiming {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            ack_timeout: Duration::from_millis(self.ack_timeout_ms),
        }
    }
}

/// Rolling statistics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Span of the averaging window in seconds
    pub window_secs: f64,
    /// Idle tick that re-prunes the window without new readings
    pub refresh_interval_ms: u64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            window_secs: 5.0,
            refresh_interval_ms: 1000,
        }
    }
}

impl StatisticsConfig {
    /// Averaging window, clamped to `MAX_WINDOW_SECS`
    ///
    /// A value that is not a positive finite number falls back to the default.
    pub fn window(&self) -> Duration {
        if self.window_secs.is_finite() && self.window_secs > 0.0 {
            return Duration::from_secs_f64(self.window_secs.min(MAX_WINDOW_SECS));
        }
        tracing::warn!("Invalid statistics window {}; using default", self.window_secs);
        Duration::from_secs_f64(Self::default().window_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

/// Recording export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub output_dir: PathBuf,
    /// Optional prefix of exported file names
    pub filename_prefix: String,
    pub mode: RecordMode,
    pub format: ExportFormat,
    /// Points kept per recording before new readings are ignored (0 = unlimited)
    pub max_points: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("saved_graphs"),
            filename_prefix: String::new(),
            mode: RecordMode::Instantaneous,
            format: ExportFormat::Csv,
            max_points: DEFAULT_MAX_RECORDED_POINTS,
        }
    }
}

impl RecordingConfig {
    /// Exporter writing to the configured directory
    pub fn exporter(&self) -> FileExporter {
        FileExporter::new(&self.output_dir, &self.filename_prefix, self.format)
    }
}

// ==================== App Config ====================

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub statistics: StatisticsConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    /// Initial sensor settings applied at connect
    #[serde(default)]
    pub device: DeviceConfig,
}

impl AppConfig {
    /// Load the config from the default location
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            RadarError::Config("Could not determine config directory".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load and validate a config file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RadarError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            RadarError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config to the default location
    pub fn save(&self) -> Result<()> {
        let path = config_path().ok_or_else(|| {
            RadarError::Config("Could not determine config directory".to_string())
        })?;
        self.save_to(path)
    }

    /// Save the config as TOML, creating the parent directory
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RadarError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RadarError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RadarError::Config(format!("Failed to write config {:?}: {}", path, e)))
    }

    /// Reject values the worker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            return Err(RadarError::Config("serial.port is empty".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(RadarError::Config("serial.baud_rate must be positive".to_string()));
        }
        let window = self.statistics.window_secs;
        if !(window.is_finite() && window > 0.0 && window <= MAX_WINDOW_SECS) {
            return Err(RadarError::Config(format!(
                "statistics.window_secs must be in (0, {}], got {}",
                MAX_WINDOW_SECS, window
            )));
        }
        self.device
            .validate()
            .map_err(|e| RadarError::Config(format!("device: {}", e)))
    }

    /// Apply the command-line port override, if any
    pub fn with_port_override(mut self, port: Option<String>) -> Self {
        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            tracing::info!("Using port {} from the command line", port);
            self.serial.port = port;
        }
        self
    }
}

// ==================== Tests ====================
