use crate::models::sample_format::SampleFormat;
use crate::processing::frame_accumulator::FrameAccumulator;
use crate::traits::dsp_stage::DspStage;
use crate::traits::period_handler::PeriodHandler;

/// Feeds captured periods into a [`DspStage`] in its own frame size.
pub struct DspFeeder<S: DspStage> {
    stage: S,
    format: SampleFormat,
    accumulator: FrameAccumulator,
    frames_emitted: u64,
}

impl<S: DspStage> DspFeeder<S> {
    pub fn new(stage: S, channels: usize, format: SampleFormat) -> Self {
        let accumulator = FrameAccumulator::new(channels, stage.frame_size());
        Self {
            stage,
            format,
            accumulator,
            frames_emitted: 0,
        }
    }

    /// Zero-pad and emit any partial frame. Returns whether one was emitted.
    pub fn flush(&mut self) -> bool {
        let channels = self.accumulator.channels();
        let stage = &mut self.stage;
        let flushed = self
            .accumulator
            .flush_padded(|frame| stage.process_frame(frame, channels));
        if flushed {
            self.frames_emitted += 1;
        }
        flushed
    }

    /// Complete frames handed to the stage so far.
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn into_stage(self) -> S {
        self.stage
    }
}

impl<S: DspStage> PeriodHandler for DspFeeder<S> {
    fn on_period(&mut self, samples: &[i32], frames: usize, channels: usize) {
        if channels != self.accumulator.channels() {
            log::warn!(
                "DSP feeder expects {} channels, period has {}; dropping it",
                self.accumulator.channels(),
                channels
            );
            return;
        }

        let stage = &mut self.stage;
        let emitted = self
            .accumulator
            .push_period(samples, frames, self.format, |frame| stage.process_frame(frame, channels));
        self.frames_emitted += emitted as u64;
    }
}
