//! Configuration for the record slicer.

use crate::source::ChannelLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Slice geometry
    pub slicer: SlicerConfig,

    /// What the record source delivers
    pub acquisition: AcquisitionConfig,

    /// Synthetic source used by the CLI
    pub source: SyntheticSourceConfig,

    /// How slices are handed to the output
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("record-slicer")
            .join("config.json")
    }
}

/// Slice geometry requested by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlicerConfig {
    /// Samples per slice
    pub slice_length: usize,
    /// Samples between slice starts; 0 means "same as slice_length"
    #[serde(default)]
    pub stride: usize,
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self {
            slice_length: 1024,
            stride: 0,
        }
    }
}

impl SlicerConfig {
    pub fn new(slice_length: usize, stride: usize) -> Self {
        Self {
            slice_length,
            stride,
        }
    }

    /// Stride with the "0 means slice length" rule applied.
    pub fn resolved_stride(&self) -> usize {
        if self.stride == 0 {
            self.slice_length
        } else {
            self.stride
        }
    }
}

/// One-time description of the record stream, supplied before the first record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Samples per channel in every record
    pub record_length: usize,
    /// Channel arrangement inside each record
    pub layout: ChannelLayout,
    /// Digitizer sample rate in Hz
    pub sample_rate_hz: f64,
    /// Bytes per sample (1, 2, 4 or 8)
    pub sample_width: usize,
    /// Significant bits per sample
    pub bit_depth: u32,
    /// Voltage of raw value 0
    pub voltage_min: f64,
    /// Full-scale voltage range
    pub voltage_range: f64,
    /// Free-form run description
    #[serde(default)]
    pub description: String,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            record_length: 4096,
            layout: ChannelLayout::OneChannel,
            sample_rate_hz: 250.0e6,
            sample_width: 1,
            bit_depth: 8,
            voltage_min: -0.25,
            voltage_range: 0.5,
            description: String::from("default run"),
        }
    }
}

/// Waveform produced by the synthetic source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Waveform {
    /// Each sample carries its absolute stream position
    Ramp,
    /// Quantized full-scale sine
    Sine { frequency_hz: f64 },
}

/// Settings for the synthetic record source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSourceConfig {
    /// Number of records to generate
    pub n_records: u64,
    /// Start a new acquisition every N records (0 = never)
    #[serde(default)]
    pub acquisition_every: u64,
    /// Sample content
    pub waveform: Waveform,
    /// Timestamp of the first record, in nanoseconds
    #[serde(default)]
    pub start_timestamp_ns: u64,
}

impl Default for SyntheticSourceConfig {
    fn default() -> Self {
        Self {
            n_records: 16,
            acquisition_every: 0,
            waveform: Waveform::Ramp,
            start_timestamp_ns: 0,
        }
    }
}

/// How completed slices reach the output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Forward each slice as soon as it is emitted
    #[default]
    Stream,
    /// Hold all slices until the session finishes
    Buffer,
}

impl OutputMode {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "stream" | "streaming" => Some(OutputMode::Stream),
            "buffer" | "buffered" => Some(OutputMode::Buffer),
            _ => None,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub mode: OutputMode,
    /// Records buffered between the source and the worker
    pub channel_capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Stream,
            channel_capacity: crate::source::channel::DEFAULT_CAPACITY,
        }
    }
}

/// Configuration file errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
