use serde::{Deserialize, Serialize};

use crate::processing::samples::MIN_DB;

/// Outcome of a single period read that did not fail fatally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRead {
    /// Frames delivered. May be fewer than one period near stream edges.
    Frames(usize),
    /// The ring buffer overflowed; the stream was re-prepared and this
    /// period carries no data.
    Overrun,
}

impl PeriodRead {
    pub fn frames(&self) -> usize {
        match self {
            Self::Frames(n) => *n,
            Self::Overrun => 0,
        }
    }
}

/// Totals for one call of the processing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessSummary {
    /// Periods passed to the handler.
    pub periods: u64,
    pub frames: u64,
    /// Overrun periods skipped without calling the handler.
    pub overruns: u64,
}

/// Peak levels of the most recent period, one entry per channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelLevels {
    pub peaks: Vec<i32>,
    pub db: Vec<f32>,
}

impl ChannelLevels {
    pub fn channels(&self) -> usize {
        self.peaks.len()
    }

    /// Loudest channel in dB, or the floor when there are no channels.
    pub fn max_db(&self) -> f32 {
        self.db.iter().copied().fold(MIN_DB, f32::max)
    }

    /// Map a channel's level from [-60 dB, 0 dB] onto [0.0, 1.0] for meter display.
    pub fn meter_fraction(&self, channel: usize) -> f32 {
        let Some(db) = self.db.get(channel) else {
            return 0.0;
        };
        ((db - MIN_DB) / -MIN_DB).clamp(0.0, 1.0)
    }
}

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub periods_read: u64,
    pub frames_captured: u64,
    pub overruns: u64,
    /// Reads that returned fewer frames than one period.
    pub short_reads: u64,
    pub last_driver_error: Option<String>,
}

/// A capture device reported by a backend's enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Identifier to use as [`MicrophoneConfig::device`](super::config::MicrophoneConfig::device).
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
}
