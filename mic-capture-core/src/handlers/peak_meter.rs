use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::ChannelLevels;
use crate::models::sample_format::SampleFormat;
use crate::processing::samples::{amplitude_to_db, calculate_peak_amplitudes};
use crate::traits::period_handler::PeriodHandler;

/// Per-channel level meter.
///
/// Publishes the peaks of every period into a shared snapshot that a
/// display thread can poll while capture runs.
pub struct PeakMeter {
    format: SampleFormat,
    levels: Arc<Mutex<ChannelLevels>>,
}

impl PeakMeter {
    pub fn new(format: SampleFormat) -> Self {
        Self {
            format,
            levels: Arc::new(Mutex::new(ChannelLevels::default())),
        }
    }

    /// Snapshot of the most recent period.
    pub fn levels(&self) -> ChannelLevels {
        self.levels.lock().clone()
    }

    /// Handle for reading levels from another thread.
    pub fn shared(&self) -> Arc<Mutex<ChannelLevels>> {
        Arc::clone(&self.levels)
    }
}

impl PeriodHandler for PeakMeter {
    fn on_period(&mut self, samples: &[i32], frames: usize, channels: usize) {
        let peaks = calculate_peak_amplitudes(samples, frames, channels, self.format);
        let db = peaks.iter().map(|&p| amplitude_to_db(p, self.format)).collect();

        *self.levels.lock() = ChannelLevels { peaks, db };
    }
}
