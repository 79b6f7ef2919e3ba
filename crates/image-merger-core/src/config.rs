use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::ImageFormat;

/// Largest meaningful Hamming distance between two 64-bit perceptual hashes
pub const MAX_PHASH_DISTANCE: u32 = 64;

/// Priority rules for choosing which of two duplicate images to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityRule {
    /// Prefer higher resolution images
    HighestResolution,

    /// Prefer images with the configured preferred format
    PreferredFormat,

    /// Prefer smallest file size
    SmallestFileSize,

    /// Prefer largest file size
    LargestFileSize,
}

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Configuration for the merge process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum Hamming distance at which two perceptual hashes are considered duplicates
    pub phash_threshold: u32,

    /// Prioritization rules for choosing which duplicate survives, applied in order
    pub prioritization: Vec<PriorityRule>,

    /// Format favoured by `PriorityRule::PreferredFormat`
    pub preferred_format: ImageFormat,

    /// Minimum interval between file/folder count notifications while scanning
    pub scan_interval_ms: u64,

    /// Directory for rolling log files; console logging is used when unset
    pub log_dir: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phash_threshold: 8,
            prioritization: vec![
                PriorityRule::HighestResolution,
                PriorityRule::LargestFileSize,
            ],
            preferred_format: ImageFormat::Png,
            scan_interval_ms: 20,
            log_dir: None,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.phash_threshold > MAX_PHASH_DISTANCE {
            return Err(Error::Configuration(format!(
                "Perceptual hash threshold must be between 0 and {}",
                MAX_PHASH_DISTANCE
            )));
        }

        if self.scan_interval_ms == 0 {
            return Err(Error::Configuration(
                "Scan notification interval must be at least 1ms".to_string(),
            ));
        }

        if self.prioritization.contains(&PriorityRule::SmallestFileSize)
            && self.prioritization.contains(&PriorityRule::LargestFileSize)
        {
            return Err(Error::Configuration(
                "Cannot prefer both the smallest and the largest file size".to_string(),
            ));
        }

        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}
