/// An external block-based processing stage, such as an ambisonics encoder
/// or a direction-of-arrival estimator.
///
/// The stage consumes fixed-size frames. Each frame is channel-major:
/// `frame[ch * frame_size + i]` is sample `i` of channel `ch`, normalized
/// to [-1.0, 1.0].
pub trait DspStage {
    /// Samples per channel in every frame passed to [`process_frame`](Self::process_frame).
    fn frame_size(&self) -> usize;

    fn process_frame(&mut self, frame: &[f32], channels: usize);
}

impl<S: DspStage + ?Sized> DspStage for Box<S> {
    fn frame_size(&self) -> usize {
        (**self).frame_size()
    }

    fn process_frame(&mut self, frame: &[f32], channels: usize) {
        (**self).process_frame(frame, channels)
    }
}
