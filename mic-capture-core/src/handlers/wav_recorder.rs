use std::path::PathBuf;

use crate::models::error::CaptureError;
use crate::models::hw_params::NegotiatedParams;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::processing::wav_format::{self, WavSpec};
use crate::storage::metadata;
use crate::storage::wav_writer::WavFileWriter;
use crate::traits::period_handler::PeriodHandler;

/// Records captured periods to a PCM WAV file.
///
/// Samples are sign-corrected and stored at the capture's payload width
/// (float captures as 24-bit). The first write failure is logged and the
/// recorder stops writing; [`finish`](Self::finish) then reports it.
pub struct WavRecorder {
    device: String,
    params: NegotiatedParams,
    writer: WavFileWriter,
    max_frames: Option<u64>,
    frames_written: u64,
    scratch: Vec<u8>,
    failure: Option<CaptureError>,
}

impl WavRecorder {
    /// Create the file and write a placeholder header.
    pub fn create(
        file_path: impl Into<PathBuf>,
        device: &str,
        params: &NegotiatedParams,
    ) -> Result<Self, CaptureError> {
        let spec = WavSpec::for_capture(params);
        let mut writer = WavFileWriter::new(file_path.into(), spec);
        writer.open()?;

        log::info!(
            "Recording '{}' to {} ({} ch, {} Hz, {}-bit)",
            device,
            writer.file_path().display(),
            spec.channels,
            spec.sample_rate,
            spec.bit_depth
        );

        Ok(Self {
            device: device.to_string(),
            params: *params,
            writer,
            max_frames: None,
            frames_written: 0,
            scratch: Vec::with_capacity(params.period_samples() * spec.bytes_per_sample()),
            failure: None,
        })
    }

    /// Stop writing once `frames` frames are on disk.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Whether the frame limit has been reached.
    pub fn is_full(&self) -> bool {
        self.max_frames.is_some_and(|max| self.frames_written >= max)
    }

    pub fn failure(&self) -> Option<&CaptureError> {
        self.failure.as_ref()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.params.sample_rate == 0 {
            return 0.0;
        }
        self.frames_written as f64 / self.params.sample_rate as f64
    }

    /// Finalize the file, write its metadata sidecar and return the result.
    pub fn finish(mut self) -> Result<RecordingResult, CaptureError> {
        if let Some(err) = self.failure.take() {
            // Still close so the header is patched for what was written.
            if let Err(close_err) = self.writer.close() {
                log::warn!("Error closing failed recording: {}", close_err);
            }
            return Err(err);
        }

        let checksum = self.writer.close()?;
        let duration = self.duration_secs();
        let file_path = self.writer.file_path().to_path_buf();

        let metadata = RecordingMetadata::new(
            &self.device,
            &self.params,
            self.writer.spec().bit_depth,
            duration,
            &file_path.to_string_lossy(),
            &checksum,
        );
        metadata::write_metadata(&metadata, &file_path)?;

        log::info!(
            "Recording finished: {} frames ({:.2}s) in {}",
            self.frames_written,
            duration,
            file_path.display()
        );

        Ok(RecordingResult {
            file_path,
            duration_secs: duration,
            frames: self.frames_written,
            metadata,
            checksum,
        })
    }
}

impl PeriodHandler for WavRecorder {
    fn on_period(&mut self, samples: &[i32], frames: usize, channels: usize) {
        if self.failure.is_some() || self.is_full() {
            return;
        }
        if channels != self.params.channels as usize {
            log::warn!(
                "WAV recorder expects {} channels, period has {}; dropping it",
                self.params.channels,
                channels
            );
            return;
        }

        let frames = match self.max_frames {
            Some(max) => frames.min((max - self.frames_written) as usize),
            None => frames,
        };

        self.scratch.clear();
        wav_format::encode_period(
            samples,
            frames,
            channels,
            self.params.format,
            self.writer.spec(),
            &mut self.scratch,
        );

        match self.writer.write(&self.scratch) {
            Ok(()) => self.frames_written += frames as u64,
            Err(e) => {
                log::error!("Recording write failed, no further audio will be saved: {}", e);
                self.failure = Some(e);
            }
        }
    }
}
