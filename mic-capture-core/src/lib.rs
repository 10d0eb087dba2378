//! # mic-capture-core
//!
//! Device-agnostic multichannel microphone capture.
//!
//! Negotiates hardware parameters, owns the capture stream's lifecycle,
//! reads fixed-size periods with overrun recovery and hands each period to
//! a [`PeriodHandler`]. Backends (ALSA on Linux) implement the
//! [`PcmBackend`] trait and plug into the generic [`CaptureSession`].
//!
//! ## Architecture
//!
//! ```text
//! mic-capture-core (this crate)
//! ├── traits/       ← PcmBackend, PcmStream, PeriodHandler, DspStage
//! ├── models/       ← CaptureError, CaptureState, MicrophoneConfig, SampleFormat, etc.
//! ├── processing/   ← sample math, frame re-blocking, WAV header generation
//! ├── session/      ← parameter negotiation, CaptureSession
//! ├── handlers/     ← PeakMeter, DspFeeder, WavRecorder
//! └── storage/      ← WavFileWriter, metadata
//! ```
//!
//! ## Usage
//! ```ignore
//! use mic_capture_alsa::AlsaBackend;
//! use mic_capture_core::{CaptureSession, MicrophoneConfig, PeakMeter};
//!
//! let mut session = CaptureSession::new(AlsaBackend, MicrophoneConfig::zylia_zm1());
//! session.initialize()?;
//! session.start()?;
//!
//! let mut meter = PeakMeter::new(session.config().format);
//! session.process(&mut meter, 100)?;
//! session.stop();
//! ```

pub mod handlers;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use handlers::dsp_feeder::DspFeeder;
pub use handlers::peak_meter::PeakMeter;
pub use handlers::wav_recorder::WavRecorder;
pub use models::audio_models::{AudioDevice, CaptureDiagnostics, ChannelLevels, PeriodRead, ProcessSummary};
pub use models::config::MicrophoneConfig;
pub use models::error::{CaptureError, DriverError, DriverErrorKind, HwParameter, NegotiationError};
pub use models::hw_params::{HwRequest, NegotiatedParams, RateDirection};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::sample_format::SampleFormat;
pub use models::state::CaptureState;
pub use processing::samples::{amplitude_to_db, calculate_peak_amplitudes, fix_sample};
pub use session::capture::CaptureSession;
pub use traits::dsp_stage::DspStage;
pub use traits::pcm_backend::{PcmBackend, PcmStream};
pub use traits::period_handler::PeriodHandler;
