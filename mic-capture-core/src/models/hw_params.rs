use super::config::MicrophoneConfig;
use super::sample_format::SampleFormat;

/// Hardware buffer size requested per period. Two to four is customary.
pub const BUFFER_PERIODS: usize = 4;

/// Rounding hint for "nearest" parameter requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateDirection {
    /// Exact, else the closest supported value below.
    Below,
    /// Exact, else the closest supported value in either direction.
    #[default]
    Nearest,
    /// Exact, else the closest supported value above.
    Above,
}

/// What the negotiator asks the driver to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwRequest {
    pub format: SampleFormat,
    pub channels: u32,
    pub sample_rate: u32,
    pub rate_direction: RateDirection,
    pub period_frames: usize,
    pub buffer_frames: usize,
}

impl HwRequest {
    pub fn from_config(config: &MicrophoneConfig) -> Self {
        Self {
            format: config.format,
            channels: config.channels,
            sample_rate: config.sample_rate,
            rate_direction: RateDirection::default(),
            period_frames: config.period_size,
            buffer_frames: config.period_size * BUFFER_PERIODS,
        }
    }
}

/// The configuration the driver actually committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedParams {
    pub format: SampleFormat,
    pub channels: u32,
    pub sample_rate: u32,
    pub period_frames: usize,
    pub buffer_frames: usize,
}

impl NegotiatedParams {
    /// Interleaved samples in one period.
    pub fn period_samples(&self) -> usize {
        self.period_frames * self.channels as usize
    }

    /// Bytes one frame occupies in the hardware buffer.
    pub fn frame_bytes(&self) -> usize {
        self.format.container_bytes() * self.channels as usize
    }

    /// Bytes one period occupies in the hardware buffer.
    pub fn period_bytes(&self) -> usize {
        self.period_frames * self.frame_bytes()
    }

    /// Hardware buffer length in whole periods.
    pub fn buffer_periods(&self) -> usize {
        if self.period_frames == 0 {
            return 0;
        }
        self.buffer_frames / self.period_frames
    }

    pub fn latency_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.period_frames as f64 * 1000.0 / self.sample_rate as f64
    }
}
