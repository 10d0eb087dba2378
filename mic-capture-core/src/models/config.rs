use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::sample_format::SampleFormat;

/// Upper bound on channels accepted by [`MicrophoneConfig::validate`].
pub const MAX_CHANNELS: u32 = 256;

/// Requested configuration for one capture device.
///
/// A session copies the config when it is created; the values the hardware
/// actually grants are reported separately as
/// [`NegotiatedParams`](super::hw_params::NegotiatedParams).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrophoneConfig {
    /// Device identifier, passed to the driver unchanged
    /// (e.g. `hw:2,0`, `plughw:2,0`, `dsnoop:CARD=Device,DEV=0`).
    pub device: String,

    pub channels: u32,

    /// Requested sample rate in Hz.
    pub sample_rate: u32,

    /// Requested period size in frames. Latency = period / rate.
    pub period_size: usize,

    pub format: SampleFormat,
}

impl MicrophoneConfig {
    pub fn new(
        device: impl Into<String>,
        channels: u32,
        sample_rate: u32,
        period_size: usize,
        format: SampleFormat,
    ) -> Self {
        Self {
            device: device.into(),
            channels,
            sample_rate,
            period_size,
            format,
        }
    }

    /// Zylia ZM-1: 19-capsule spherical array, 24-bit.
    pub fn zylia_zm1() -> Self {
        Self::new("plughw:2,0", 19, 48_000, 1024, SampleFormat::S24Le)
    }

    /// Neewer NW-7000: single-channel USB microphone, 16-bit.
    pub fn neewer_nw7000() -> Self {
        Self::new("plughw:3,0", 1, 48_000, 1024, SampleFormat::S16Le)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.device.trim().is_empty() {
            return Err(CaptureError::Configuration("device name must not be empty".into()));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(CaptureError::Configuration(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(CaptureError::Configuration("sample rate must be positive".into()));
        }
        if self.period_size == 0 {
            return Err(CaptureError::Configuration("period size must be positive".into()));
        }
        Ok(())
    }

    /// Requested period latency in milliseconds.
    pub fn latency_ms(&self) -> f64 {
        self.period_size as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::Configuration(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let json = fs::read_to_string(path).map_err(|e| {
            CaptureError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}

impl Default for MicrophoneConfig {
    fn default() -> Self {
        Self::neewer_nw7000()
    }
}
