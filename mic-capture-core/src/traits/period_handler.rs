/// Receives each captured period from the processing loop.
///
/// Called synchronously on the thread running the loop. `samples` holds
/// `frames * channels` interleaved raw container values; apply
/// [`fix_sample`](crate::processing::samples::fix_sample) before doing math
/// on them. The slice is overwritten by the next read, so copy anything that
/// must outlive the call.
pub trait PeriodHandler {
    fn on_period(&mut self, samples: &[i32], frames: usize, channels: usize);
}

impl<F> PeriodHandler for F
where
    F: FnMut(&[i32], usize, usize),
{
    fn on_period(&mut self, samples: &[i32], frames: usize, channels: usize) {
        self(samples, frames, channels)
    }
}
