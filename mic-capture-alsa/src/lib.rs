//! # mic-capture-alsa
//!
//! Linux ALSA backend for mic-capture-core.
//!
//! Provides:
//! - `AlsaBackend` / `AlsaStream` — blocking interleaved capture through `libasound`
//! - `DeviceEnumerator` — capture PCM and sound card listing
//!
//! ## Platform Requirements
//! - Linux with ALSA (`libasound2-dev` for linking)
//!
//! ## Usage
//! ```ignore
//! use mic_capture_alsa::AlsaBackend;
//! use mic_capture_core::{CaptureSession, MicrophoneConfig};
//!
//! let mut session = CaptureSession::new(AlsaBackend, MicrophoneConfig::neewer_nw7000());
//! session.initialize()?;
//! session.start()?;
//! ```

#[cfg(target_os = "linux")]
pub mod alsa_pcm;
#[cfg(target_os = "linux")]
pub mod device_enumerator;

#[cfg(target_os = "linux")]
pub use alsa_pcm::{AlsaBackend, AlsaStream};
#[cfg(target_os = "linux")]
pub use device_enumerator::DeviceEnumerator;
