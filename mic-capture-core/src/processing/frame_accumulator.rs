use crate::models::sample_format::SampleFormat;
use crate::processing::samples::normalize_sample;

/// Re-blocks interleaved capture periods into fixed-size, channel-major
/// frames of normalized `f32` samples.
///
/// The staging area is allocated once (`channels * frame_size`) and reused.
/// Frames left over at the end of a period carry into the next one.
#[derive(Debug)]
pub struct FrameAccumulator {
    staging: Vec<f32>,
    channels: usize,
    frame_size: usize,
    filled: usize,
}

impl FrameAccumulator {
    pub fn new(channels: usize, frame_size: usize) -> Self {
        Self {
            staging: vec![0.0; channels * frame_size],
            channels,
            frame_size,
            filled: 0,
        }
    }

    /// Append `frames` interleaved frames, calling `emit` with every
    /// completed block. Returns the number of blocks emitted.
    pub fn push_period<F>(
        &mut self,
        data: &[i32],
        frames: usize,
        format: SampleFormat,
        mut emit: F,
    ) -> usize
    where
        F: FnMut(&[f32]),
    {
        if self.channels == 0 || self.frame_size == 0 {
            return 0;
        }

        let mut emitted = 0;
        for frame in data.chunks_exact(self.channels).take(frames) {
            for (ch, &raw) in frame.iter().enumerate() {
                self.staging[ch * self.frame_size + self.filled] = normalize_sample(raw, format);
            }
            self.filled += 1;

            if self.filled == self.frame_size {
                emit(&self.staging);
                self.filled = 0;
                emitted += 1;
            }
        }
        emitted
    }

    /// Zero-pad the partial block and emit it. No-op when nothing is pending.
    pub fn flush_padded<F>(&mut self, mut emit: F) -> bool
    where
        F: FnMut(&[f32]),
    {
        if self.filled == 0 {
            return false;
        }
        for ch in 0..self.channels {
            let start = ch * self.frame_size;
            self.staging[start + self.filled..start + self.frame_size].fill(0.0);
        }
        emit(&self.staging);
        self.filled = 0;
        true
    }

    /// Frames staged toward the next block.
    pub fn pending(&self) -> usize {
        self.filled
    }

    /// Discard any staged frames.
    pub fn reset(&mut self) {
        self.filled = 0;
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
}
