use crate::models::audio_models::{CaptureDiagnostics, PeriodRead, ProcessSummary};
use crate::models::config::MicrophoneConfig;
use crate::models::error::CaptureError;
use crate::models::hw_params::NegotiatedParams;
use crate::models::state::CaptureState;
use crate::session::negotiator;
use crate::traits::pcm_backend::{PcmBackend, PcmStream};
use crate::traits::period_handler::PeriodHandler;

/// Owns one capture device for its whole lifetime.
///
/// Lifecycle:
/// ```text
/// new → initialize → start → read_one_period / process ... → stop → (drop)
/// ```
///
/// All calls are blocking and must come from one thread; the session holds
/// the only handle to the device and cannot be cloned. Dropping the session
/// stops the stream if it is running and closes the device, whatever stage
/// was reached.
pub struct CaptureSession<B: PcmBackend> {
    backend: B,
    config: MicrophoneConfig,
    stream: Option<B::Stream>,
    params: Option<NegotiatedParams>,
    state: CaptureState,

    // Period buffers, sized from the negotiated params and reused for every read
    raw: Vec<u8>,
    samples: Vec<i32>,

    diagnostics: CaptureDiagnostics,
}

impl<B: PcmBackend> CaptureSession<B> {
    pub fn new(backend: B, config: MicrophoneConfig) -> Self {
        Self {
            backend,
            config,
            stream: None,
            params: None,
            state: CaptureState::Closed,
            raw: Vec::new(),
            samples: Vec::new(),
            diagnostics: CaptureDiagnostics::default(),
        }
    }

    /// The configuration the session was created with.
    pub fn config(&self) -> &MicrophoneConfig {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// The hardware's committed configuration, once initialized.
    pub fn negotiated(&self) -> Option<&NegotiatedParams> {
        self.params.as_ref()
    }

    pub fn diagnostics(&self) -> &CaptureDiagnostics {
        &self.diagnostics
    }

    /// Interleaved samples needed to hold one period.
    pub fn period_samples(&self) -> usize {
        self.params.map(|p| p.period_samples()).unwrap_or(0)
    }

    /// Open the device for capture and negotiate its parameters.
    ///
    /// Transitions: closed → initialized. On failure the device is closed
    /// again and the session stays closed.
    pub fn initialize(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            log::warn!("Capture on '{}' already initialized", self.config.device);
            return Err(CaptureError::AlreadyInitialized);
        }

        self.config.validate()?;

        let mut stream = self.backend.open_capture(&self.config.device).map_err(|e| {
            log::error!("Failed to open capture device '{}': {}", self.config.device, e);
            CaptureError::DeviceOpen {
                device: self.config.device.clone(),
                reason: e.to_string(),
            }
        })?;

        let params = match negotiator::negotiate(&mut stream, &self.config) {
            Ok(params) => params,
            Err(e) => {
                close_stream(&mut stream, &self.config.device);
                return Err(e);
            }
        };

        self.raw = vec![0u8; params.period_bytes()];
        self.samples = vec![0i32; params.period_samples()];
        self.params = Some(params);
        self.stream = Some(stream);
        self.state = CaptureState::Initialized;

        log::info!("Capture device '{}' initialized", self.config.device);
        Ok(())
    }

    /// Prepare the stream for I/O and start it.
    ///
    /// Transitions: initialized/stopped → running.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if !self.state.can_start() {
            return Err(match self.state {
                CaptureState::Running => CaptureError::AlreadyRunning,
                _ => CaptureError::NotInitialized,
            });
        }
        let stream = self.stream.as_mut().ok_or(CaptureError::NotInitialized)?;

        stream.prepare().map_err(|e| {
            log::error!("Cannot prepare '{}': {}", self.config.device, e);
            CaptureError::Start(format!("prepare failed: {}", e))
        })?;
        stream.start().map_err(|e| {
            log::error!("Cannot start '{}': {}", self.config.device, e);
            CaptureError::Start(e.to_string())
        })?;

        self.state = CaptureState::Running;
        log::info!("Capture on '{}' started", self.config.device);
        Ok(())
    }

    /// Stop the stream, discarding any buffered audio.
    ///
    /// No-op unless running. A driver failure is logged and the session
    /// stays running so teardown can try again.
    pub fn stop(&mut self) {
        if !self.state.is_running() {
            log::debug!("Capture on '{}' not running, nothing to stop", self.config.device);
            return;
        }
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        match stream.drop_pending() {
            Ok(()) => {
                self.state = CaptureState::Stopped;
                log::info!("Capture on '{}' stopped", self.config.device);
            }
            Err(e) => {
                log::warn!("Error stopping capture on '{}': {}", self.config.device, e);
            }
        }
    }

    /// Read one period into `buffer`.
    ///
    /// `buffer` must hold at least [`period_samples`](Self::period_samples)
    /// values. On `Frames(n)` the first `n * channels` entries are valid.
    /// An overrun re-prepares the stream before returning, so the next read
    /// can proceed; any other driver failure is returned as `FatalRead`
    /// without recovery.
    pub fn read_one_period(&mut self, buffer: &mut [i32]) -> Result<PeriodRead, CaptureError> {
        if !self.state.is_running() {
            return Err(CaptureError::NotRunning);
        }
        let params = self.params.ok_or(CaptureError::NotInitialized)?;
        if buffer.len() < params.period_samples() {
            return Err(CaptureError::Configuration(format!(
                "period buffer holds {} samples, need {}",
                buffer.len(),
                params.period_samples()
            )));
        }

        let read = self.pull_period()?;
        if let PeriodRead::Frames(frames) = read {
            let bytes = &self.raw[..frames * params.frame_bytes()];
            params.format.decode_interleaved(bytes, buffer);
        }
        Ok(read)
    }

    /// Read periods and hand each one to `handler`.
    ///
    /// Runs `iterations` periods, or until a fatal read when `iterations`
    /// is 0. Every read counts as one iteration: overrun periods use up
    /// their iteration without calling the handler, as do empty reads.
    /// A fatal read ends the loop and is returned; the session stays
    /// running so the caller decides whether to stop.
    pub fn process<H>(&mut self, handler: &mut H, iterations: usize) -> Result<ProcessSummary, CaptureError>
    where
        H: PeriodHandler + ?Sized,
    {
        if !self.state.is_running() {
            log::error!("Not running. Call start() first.");
            return Err(CaptureError::NotRunning);
        }

        let channels = self.params.map(|p| p.channels as usize).unwrap_or(0);
        let mut samples = std::mem::take(&mut self.samples);
        let mut summary = ProcessSummary::default();
        let mut iteration = 0;

        let outcome = loop {
            if iterations != 0 && iteration >= iterations {
                break Ok(summary);
            }
            iteration += 1;

            match self.read_one_period(&mut samples) {
                Ok(PeriodRead::Frames(0)) => {}
                Ok(PeriodRead::Frames(frames)) => {
                    handler.on_period(&samples[..frames * channels], frames, channels);
                    summary.periods += 1;
                    summary.frames += frames as u64;
                }
                Ok(PeriodRead::Overrun) => summary.overruns += 1,
                Err(e) => break Err(e),
            }
        };

        self.samples = samples;
        outcome
    }

    /// One blocking pull into the raw byte buffer, with overrun recovery.
    fn pull_period(&mut self) -> Result<PeriodRead, CaptureError> {
        let period_frames = self.params.map(|p| p.period_frames).unwrap_or(0);
        let stream = self.stream.as_mut().ok_or(CaptureError::NotInitialized)?;

        match stream.read_interleaved(&mut self.raw) {
            Ok(frames) => {
                self.diagnostics.periods_read += 1;
                self.diagnostics.frames_captured += frames as u64;
                if frames < period_frames {
                    self.diagnostics.short_reads += 1;
                    log::debug!("Expected {} frames, but got {} frames", period_frames, frames);
                }
                Ok(PeriodRead::Frames(frames))
            }
            Err(e) if e.is_overrun() => {
                log::warn!("Buffer overrun on '{}'", self.config.device);
                self.diagnostics.overruns += 1;
                self.diagnostics.last_driver_error = Some(e.to_string());

                stream.prepare().map_err(|prep| {
                    log::error!("Cannot re-prepare '{}' after overrun: {}", self.config.device, prep);
                    CaptureError::FatalRead {
                        code: prep.code,
                        reason: format!("recovery after overrun failed: {}", prep.message),
                    }
                })?;
                Ok(PeriodRead::Overrun)
            }
            Err(e) => {
                log::error!("Read from '{}' failed: {}", self.config.device, e);
                self.diagnostics.last_driver_error = Some(e.to_string());
                Err(CaptureError::FatalRead {
                    code: e.code,
                    reason: e.message,
                })
            }
        }
    }
}

impl<B: PcmBackend> Drop for CaptureSession<B> {
    fn drop(&mut self) {
        self.stop();
        if let Some(mut stream) = self.stream.take() {
            close_stream(&mut stream, &self.config.device);
        }
        self.params = None;
        self.state = CaptureState::Closed;
    }
}

fn close_stream<S: PcmStream>(stream: &mut S, device: &str) {
    if let Err(e) = stream.close() {
        log::warn!("Error closing capture device '{}': {}", device, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::{DriverError, HwParameter, NegotiationError};
    use crate::models::sample_format::SampleFormat;
    use crate::testing::{Call, ScriptedBackend, ScriptedRead, EIO};

    fn stereo_config(period: usize) -> MicrophoneConfig {
        MicrophoneConfig::new("hw:1,0", 2, 48_000, period, SampleFormat::S32Le)
    }

    fn running_session(backend: &ScriptedBackend, period: usize) -> CaptureSession<ScriptedBackend> {
        let mut session = CaptureSession::new(backend.clone(), stereo_config(period));
        session.initialize().unwrap();
        session.start().unwrap();
        session
    }

    #[test]
    fn lifecycle_calls_driver_in_order() {
        let backend = ScriptedBackend::new();
        {
            let mut session = running_session(&backend, 4);
            assert_eq!(session.state(), CaptureState::Running);
            session.stop();
            assert_eq!(session.state(), CaptureState::Stopped);
        }

        assert_eq!(
            backend.calls(),
            vec![
                Call::Open("hw:1,0".into()),
                Call::Negotiate,
                Call::Prepare,
                Call::Start,
                Call::DropPending,
                Call::Close,
            ]
        );
    }

    #[test]
    fn drop_while_running_stops_then_closes() {
        let backend = ScriptedBackend::new();
        drop(running_session(&backend, 4));

        let calls = backend.calls();
        assert_eq!(&calls[calls.len() - 2..], &[Call::DropPending, Call::Close]);
    }

    #[test]
    fn drop_when_never_initialized_touches_nothing() {
        let backend = ScriptedBackend::new();
        drop(CaptureSession::new(backend.clone(), stereo_config(4)));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn start_before_initialize_fails_without_hardware() {
        let backend = ScriptedBackend::new();
        let mut session = CaptureSession::new(backend.clone(), stereo_config(4));

        assert_eq!(session.start(), Err(CaptureError::NotInitialized));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn initialize_twice_does_not_reopen() {
        let backend = ScriptedBackend::new();
        let mut session = CaptureSession::new(backend.clone(), stereo_config(4));
        session.initialize().unwrap();

        assert_eq!(session.initialize(), Err(CaptureError::AlreadyInitialized));
        assert_eq!(backend.script.lock().count(&Call::Open("hw:1,0".into())), 1);
    }

    #[test]
    fn start_twice_is_rejected() {
        let backend = ScriptedBackend::new();
        let mut session = running_session(&backend, 4);
        assert_eq!(session.start(), Err(CaptureError::AlreadyRunning));
    }

    #[test]
    fn restart_after_stop() {
        let backend = ScriptedBackend::new();
        let mut session = running_session(&backend, 4);
        session.stop();
        session.start().unwrap();
        assert!(session.is_running());
    }

    #[test]
    fn open_failure_reports_device() {
        let backend = ScriptedBackend::new();
        backend.script.lock().open_error = Some(DriverError::other(-2, "No such file or directory"));
        let mut session = CaptureSession::new(backend.clone(), stereo_config(4));

        let err = session.initialize().unwrap_err();

        assert!(matches!(err, CaptureError::DeviceOpen { ref device, .. } if device == "hw:1,0"));
        assert_eq!(session.state(), CaptureState::Closed);
    }

    #[test]
    fn negotiation_failure_closes_device() {
        let backend = ScriptedBackend::new();
        backend.script.lock().negotiation_error = Some(NegotiationError::new(
            HwParameter::SampleRate,
            DriverError::other(-22, "Invalid argument"),
        ));
        let mut session = CaptureSession::new(backend.clone(), stereo_config(4));

        let err = session.initialize().unwrap_err();

        assert!(matches!(
            err,
            CaptureError::Parameter {
                parameter: HwParameter::SampleRate,
                ..
            }
        ));
        assert_eq!(session.state(), CaptureState::Closed);
        assert_eq!(
            backend.calls(),
            vec![Call::Open("hw:1,0".into()), Call::Negotiate, Call::Close]
        );

        // Closed again, so a later attempt may reopen.
        backend.script.lock().negotiation_error = None;
        assert!(session.initialize().is_ok());
    }

    #[test]
    fn invalid_config_never_opens() {
        let backend = ScriptedBackend::new();
        let mut session = CaptureSession::new(backend.clone(), stereo_config(0));

        assert!(matches!(session.initialize(), Err(CaptureError::Configuration(_))));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn start_failure_is_reported() {
        let backend = ScriptedBackend::new();
        backend.script.lock().start_error = Some(DriverError::other(-16, "Device or resource busy"));
        let mut session = CaptureSession::new(backend.clone(), stereo_config(4));
        session.initialize().unwrap();

        assert!(matches!(session.start(), Err(CaptureError::Start(_))));
        assert_eq!(session.state(), CaptureState::Initialized);
    }

    #[test]
    fn session_exposes_negotiated_values() {
        let backend = ScriptedBackend::new();
        backend.script.lock().grant = Some(NegotiatedParams {
            format: SampleFormat::S32Le,
            channels: 2,
            sample_rate: 44_100,
            period_frames: 6,
            buffer_frames: 24,
        });
        let mut session = CaptureSession::new(backend, stereo_config(4));
        session.initialize().unwrap();

        let params = session.negotiated().unwrap();
        assert_eq!(params.sample_rate, 44_100);
        assert_eq!(params.period_frames, 6);
        assert_eq!(session.period_samples(), 12);
        assert_eq!(session.config().sample_rate, 48_000);
    }

    #[test]
    fn read_requires_running() {
        let backend = ScriptedBackend::new();
        let mut session = CaptureSession::new(backend.clone(), stereo_config(4));
        session.initialize().unwrap();
        let mut buffer = vec![0; 8];

        assert_eq!(session.read_one_period(&mut buffer), Err(CaptureError::NotRunning));
        assert!(!backend.calls().contains(&Call::Read));
    }

    #[test]
    fn read_decodes_into_buffer() {
        let backend = ScriptedBackend::new();
        backend.push_read(ScriptedRead::Samples(vec![1, -2, 3, -4, 5, -6, 7, -8]));
        let mut session = running_session(&backend, 4);
        let mut buffer = vec![0; 8];

        assert_eq!(session.read_one_period(&mut buffer), Ok(PeriodRead::Frames(4)));
        assert_eq!(buffer, vec![1, -2, 3, -4, 5, -6, 7, -8]);
    }

    #[test]
    fn short_read_is_counted() {
        let backend = ScriptedBackend::new();
        backend.push_read(ScriptedRead::Samples(vec![1, 2]));
        let mut session = running_session(&backend, 4);
        let mut buffer = vec![0; 8];

        assert_eq!(session.read_one_period(&mut buffer), Ok(PeriodRead::Frames(1)));
        assert_eq!(session.diagnostics().short_reads, 1);
        assert_eq!(session.diagnostics().frames_captured, 1);
    }

    #[test]
    fn undersized_buffer_is_rejected() {
        let backend = ScriptedBackend::new();
        let mut session = running_session(&backend, 4);
        let mut buffer = vec![0; 7];

        assert!(matches!(
            session.read_one_period(&mut buffer),
            Err(CaptureError::Configuration(_))
        ));
        assert!(!backend.calls().contains(&Call::Read));
    }

    #[test]
    fn overrun_reprepares_before_next_read() {
        let backend = ScriptedBackend::new();
        backend.push_read(ScriptedRead::overrun());
        backend.push_read(ScriptedRead::Samples(vec![9; 8]));
        let mut session = running_session(&backend, 4);
        let mut buffer = vec![0; 8];

        assert_eq!(session.read_one_period(&mut buffer), Ok(PeriodRead::Overrun));
        assert_eq!(session.read_one_period(&mut buffer), Ok(PeriodRead::Frames(4)));

        let calls = backend.calls();
        let tail = &calls[calls.len() - 3..];
        assert_eq!(tail, &[Call::Read, Call::Prepare, Call::Read]);
        assert_eq!(session.diagnostics().overruns, 1);
    }

    #[test]
    fn failed_recovery_is_fatal() {
        let backend = ScriptedBackend::new();
        backend.push_read(ScriptedRead::overrun());
        let mut session = running_session(&backend, 4);
        backend
            .script
            .lock()
            .prepare_errors
            .push_back(DriverError::other(-19, "No such device"));
        let mut buffer = vec![0; 8];

        assert!(matches!(
            session.read_one_period(&mut buffer),
            Err(CaptureError::FatalRead { code: -19, .. })
        ));
    }

    #[test]
    fn fatal_read_is_not_recovered() {
        let backend = ScriptedBackend::new();
        backend.push_read(ScriptedRead::fatal());
        let mut session = running_session(&backend, 4);
        let mut buffer = vec![0; 8];

        assert_eq!(
            session.read_one_period(&mut buffer),
            Err(CaptureError::FatalRead {
                code: EIO,
                reason: "Input/output error".into()
            })
        );
        let calls = backend.calls();
        assert_eq!(calls.last(), Some(&Call::Read));
        assert_eq!(backend.script.lock().count(&Call::Prepare), 1);
    }

    #[test]
    fn process_skips_overrun_and_continues() {
        let backend = ScriptedBackend::new();
        backend.push_read(ScriptedRead::Samples(vec![1; 8]));
        backend.push_read(ScriptedRead::overrun());
        backend.push_read(ScriptedRead::Samples(vec![3; 8]));
        let mut session = running_session(&backend, 4);

        let mut seen = Vec::new();
        let mut handler = |samples: &[i32], frames: usize, channels: usize| {
            seen.push((samples[0], frames, channels));
        };
        let summary = session.process(&mut handler, 3).unwrap();

        assert_eq!(seen, vec![(1, 4, 2), (3, 4, 2)]);
        assert_eq!(
            summary,
            ProcessSummary {
                periods: 2,
                frames: 8,
                overruns: 1
            }
        );
    }

    #[test]
    fn overrun_consumes_an_iteration() {
        let backend = ScriptedBackend::new();
        backend.push_read(ScriptedRead::overrun());
        backend.push_read(ScriptedRead::Samples(vec![1; 8]));
        let mut session = running_session(&backend, 4);

        let mut calls = 0;
        let mut handler = |_: &[i32], _: usize, _: usize| calls += 1;
        let summary = session.process(&mut handler, 1).unwrap();

        assert_eq!(calls, 0);
        assert_eq!(summary.overruns, 1);
        assert_eq!(backend.script.lock().reads.len(), 1);
    }

    #[test]
    fn process_stops_on_fatal_read() {
        let backend = ScriptedBackend::new();
        backend.push_read(ScriptedRead::Samples(vec![1; 8]));
        backend.push_read(ScriptedRead::fatal());
        backend.push_read(ScriptedRead::Samples(vec![2; 8]));
        let mut session = running_session(&backend, 4);

        let mut seen = Vec::new();
        let mut handler = |samples: &[i32], _: usize, _: usize| seen.push(samples[0]);
        let result = session.process(&mut handler, 0);

        assert!(matches!(result, Err(CaptureError::FatalRead { .. })));
        assert_eq!(seen, vec![1]);
        // Not retried: the third read is still queued.
        assert_eq!(backend.script.lock().reads.len(), 1);
        assert!(session.is_running());
    }

    #[test]
    fn unbounded_process_runs_until_fatal() {
        let backend = ScriptedBackend::new();
        for _ in 0..50 {
            backend.push_read(ScriptedRead::Samples(vec![0; 8]));
        }
        let mut session = running_session(&backend, 4);

        let mut count = 0;
        let mut handler = |_: &[i32], _: usize, _: usize| count += 1;
        // Script exhaustion surfaces as a fatal read.
        assert!(session.process(&mut handler, 0).is_err());
        assert_eq!(count, 50);
    }

    #[test]
    fn process_requires_running() {
        let backend = ScriptedBackend::new();
        let mut session = CaptureSession::new(backend, stereo_config(4));
        let mut handler = |_: &[i32], _: usize, _: usize| {};
        assert_eq!(session.process(&mut handler, 1), Err(CaptureError::NotRunning));
    }

    #[test]
    fn stop_failure_keeps_running_and_teardown_retries() {
        let backend = ScriptedBackend::new();
        backend.script.lock().drop_error = Some(DriverError::other(-77, "File descriptor in bad state"));
        {
            let mut session = running_session(&backend, 4);
            session.stop();
            assert!(session.is_running());
        }
        let script = backend.script.lock();
        assert_eq!(script.count(&Call::DropPending), 2);
        assert_eq!(script.calls.last(), Some(&Call::Close));
    }

    #[test]
    fn stop_when_not_running_is_noop() {
        let backend = ScriptedBackend::new();
        let mut session = CaptureSession::new(backend.clone(), stereo_config(4));
        session.initialize().unwrap();
        session.stop();
        assert_eq!(session.state(), CaptureState::Initialized);
        assert!(!backend.calls().contains(&Call::DropPending));
    }
}
