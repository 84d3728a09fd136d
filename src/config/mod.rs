//! Configuration module for OscNet
//!
//! This module handles application configuration including:
//! - Application settings persisted as TOML (link, acquisition, history, editor)
//! - Network files (`.json` / `.net`) holding a saved oscillator graph
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.oscnet.oscnet-rs/`
//! - **macOS**: `~/Library/Application Support/dev.oscnet.oscnet-rs/`
//! - **Windows**: `%APPDATA%\dev.oscnet.oscnet-rs\`
//!
//! # Files
//!
//! - `settings.toml` - [`AppConfig`]
//! - `logs/` - Daily log files when file logging is enabled
//! - Network files - Saved wherever the user chooses
//!
//! # Example
//!
//! ```ignore
//! use oscnet_rs::config::AppConfig;
//!
//! let mut config = AppConfig::load_or_default();
//! config.link.port = Some("/dev/ttyUSB0".to_string());
//! config.save()?;
//! ```

pub mod network_file;

pub use network_file::{EdgeRecord, NetworkFile, NodeRecord};

use crate::error::{OscNetError, Result};
use crate::history::DEFAULT_MAX_DEPTH;
use crate::protocol::telemetry::{AdcByteOrder, FramingPolicy, SampleStreamDecoder};
use crate::types::{validate_frequency, Color, Position};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.oscnet.oscnet-rs";

/// Settings filename
pub const SETTINGS_FILE: &str = "settings.toml";

/// Log directory name inside the app data directory
pub const LOG_DIR: &str = "logs";

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Supported baud rate range
pub const BAUD_RATE_RANGE: std::ops::RangeInclusive<u32> = 1200..=115_200;

/// Default time to wait for the device's `ACK` after a matrix frame
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 5000;

/// Oscillators supported by the device firmware
pub const DEFAULT_MAX_NODES: usize = 8;

/// Default acquisition tick
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        OscNetError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            OscNetError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the settings file
pub fn settings_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(SETTINGS_FILE))
}

/// Get the directory daily log files are written to
pub fn log_dir() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(LOG_DIR))
}

// ==================== App Config ====================

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Serial link settings
    #[serde(default)]
    pub link: LinkConfig,

    /// Live telemetry acquisition
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Undo/redo history
    #[serde(default)]
    pub history: HistoryConfig,

    /// Defaults for newly created nodes and edges
    #[serde(default)]
    pub editor: EditorConfig,

    /// Frequency tuning feedback
    #[serde(default)]
    pub tuning: TuningConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from the default location
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = settings_path().ok_or_else(|| {
            OscNetError::Config("Could not determine settings path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OscNetError::Config(format!("Failed to read settings {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            OscNetError::Config(format!("Failed to parse settings {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let dir = ensure_app_data_dir()?;
        let path = dir.join(SETTINGS_FILE);
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OscNetError::Config(format!("Failed to create settings directory: {}", e))
            })?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| {
            OscNetError::Config(format!("Failed to write settings {:?}: {}", path, e))
        })
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| OscNetError::Config(format!("Failed to serialize settings: {}", e)))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !BAUD_RATE_RANGE.contains(&self.link.baud_rate) {
            return Err(OscNetError::Config(format!(
                "baud_rate {} is outside {}-{}",
                self.link.baud_rate,
                BAUD_RATE_RANGE.start(),
                BAUD_RATE_RANGE.end()
            )));
        }
        if self.link.max_nodes == 0 {
            return Err(OscNetError::Config("max_nodes must be at least 1".to_string()));
        }
        if self.acquisition.tick_interval_ms == 0 {
            return Err(OscNetError::Config(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.acquisition.channel_buffer_size == 0 {
            return Err(OscNetError::Config(
                "channel_buffer_size must be at least 1".to_string(),
            ));
        }
        validate_frequency(self.editor.default_frequency)
            .map_err(|e| OscNetError::Config(format!("default_frequency: {}", e)))?;
        if !(self.tuning.range_hz > 0.0) || !(self.tuning.tolerance_hz >= 0.0) {
            return Err(OscNetError::Config(
                "tuning range must be positive and tolerance non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Link Config ====================

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Port name (e.g. "COM3" or "/dev/ttyUSB0")
    pub port: Option<String>,

    /// Baud rate
    pub baud_rate: u32,

    /// How long to wait for `ACK` after sending a matrix
    pub ack_timeout_ms: u64,

    /// Largest network the device accepts
    pub max_nodes: usize,
}

impl LinkConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

// ==================== Acquisition Config ====================

/// Live telemetry acquisition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Decode tick period in milliseconds
    pub tick_interval_ms: u64,

    /// Maximum number of samples kept per channel
    pub max_samples: usize,

    /// What happens to a trailing partial 3-byte group
    pub framing: FramingPolicy,

    /// Order of the two ADC bytes in a telemetry group
    pub byte_order: AdcByteOrder,

    /// Buffer size for channel communication
    pub channel_buffer_size: usize,
}

impl AcquisitionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Decode ticks per second
    pub fn sample_rate_hz(&self) -> f64 {
        1000.0 / self.tick_interval_ms.max(1) as f64
    }

    /// Decoder for `num_channels` channels with this framing, byte order and history cap
    pub fn decoder(&self, num_channels: usize) -> SampleStreamDecoder {
        SampleStreamDecoder::new(num_channels)
            .with_framing(self.framing)
            .with_byte_order(self.byte_order)
            .with_max_samples(self.max_samples)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_samples: 100_000,
            framing: FramingPolicy::default(),
            byte_order: AdcByteOrder::default(),
            channel_buffer_size: 1024,
        }
    }
}

// ==================== History Config ====================

/// Undo/redo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo depth (0 = unlimited)
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// ==================== Editor Config ====================

/// Defaults applied to new nodes and edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Frequency of a new node in Hz
    pub default_frequency: f64,

    /// Fill color of a new node
    pub default_color: Color,

    /// Whether new edges couple both ways
    pub default_bidirectional: bool,

    /// Where nodes land when no position is given
    pub canvas_center: Position,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_frequency: 1.0,
            default_color: Color::DEFAULT_NODE,
            default_bidirectional: true,
            canvas_center: Position::default(),
        }
    }
}

// ==================== Tuning Config ====================

/// Frequency tuning feedback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Deviation (Hz) that maps to a full-scale indicator
    pub range_hz: f64,

    /// Deviation (Hz) considered on target
    pub tolerance_hz: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            range_hz: 0.5,
            tolerance_hz: 0.01,
        }
    }
}

// ==================== Logging Config ====================

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write daily log files into the app data directory
    pub log_to_file: bool,

    /// `EnvFilter` directive overriding the default level
    pub level: Option<String>,
}

// ==================== Tests ====================
