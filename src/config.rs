//! Configuration management for the demo pipeline
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling parameter changes without recompilation. Stream geometry, tone
//! parameters, and capture sizing can all be adjusted via the config file;
//! command line flags take precedence over file values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::capture::DEFAULT_RING_CAPACITY;
use crate::engine::{DEFAULT_CHANNELS, DEFAULT_FRAMES_PER_BUFFER, DEFAULT_SAMPLE_RATE};
use crate::synth::{DEFAULT_AMPLITUDE, DEFAULT_FREQUENCY_HZ};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub stream: StreamConfig,
    pub tone: ToneConfig,
    pub capture: CaptureConfig,
}

/// Output stream geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count (2 = stereo)
    pub channels: u16,
    /// Frames per callback buffer (0 = let the driver choose)
    pub frames_per_buffer: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            frames_per_buffer: DEFAULT_FRAMES_PER_BUFFER,
        }
    }
}

/// Test tone parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneConfig {
    /// Oscillator frequency in Hz
    pub frequency_hz: f64,
    /// Linear amplitude in [0, 1]
    pub amplitude: f64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            amplitude: DEFAULT_AMPLITUDE,
        }
    }
}

/// WAV capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Ring capacity in samples between the audio callback and the writer
    pub ring_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            tone: ToneConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the default configuration if the file
    /// cannot be read or parsed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Save configuration to a JSON file
    ///
    /// Writes the pretty-printed form, so saving the default configuration
    /// produces an editable template.
    ///
    /// # Arguments
    /// * `path` - Destination path for the JSON file
    ///
    /// # Errors
    /// Returns the underlying I/O error; a serialization failure is reported
    /// as `InvalidData`.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        fs::write(&path, json)?;
        log::info!("[Config] Saved configuration to {:?}", path.as_ref());
        Ok(())
    }
}
