//! ALSA capture stream.
//!
//! Opens a PCM device for blocking, interleaved capture and reads raw
//! bytes; sample decoding happens in the core crate so every supported
//! format goes through the same path.

use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};

use mic_capture_core::models::error::{DriverError, DriverErrorKind, HwParameter, NegotiationError};
use mic_capture_core::models::hw_params::{HwRequest, NegotiatedParams, RateDirection};
use mic_capture_core::models::sample_format::SampleFormat;
use mic_capture_core::traits::pcm_backend::{PcmBackend, PcmStream};

/// Opens capture streams through ALSA.
///
/// Device identifiers are ALSA PCM names such as `default`, `hw:1,0` or
/// `plughw:2,0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaBackend;

impl PcmBackend for AlsaBackend {
    type Stream = AlsaStream;

    fn open_capture(&self, device: &str) -> Result<AlsaStream, DriverError> {
        let pcm = PCM::new(device, Direction::Capture, false).map_err(driver_error)?;
        log::debug!("Opened ALSA PCM '{}' for capture", device);
        Ok(AlsaStream {
            device: device.to_string(),
            pcm: Some(pcm),
        })
    }
}

/// One open ALSA capture PCM.
///
/// The handle is released by [`close`](PcmStream::close), or on drop if
/// close was never called.
pub struct AlsaStream {
    device: String,
    pcm: Option<PCM>,
}

impl AlsaStream {
    pub fn device(&self) -> &str {
        &self.device
    }

    fn pcm(&self) -> Result<&PCM, DriverError> {
        self.pcm
            .as_ref()
            .ok_or_else(|| DriverError::other(-libc::EBADFD, "PCM already closed"))
    }
}

impl PcmStream for AlsaStream {
    fn negotiate(&mut self, request: &HwRequest) -> Result<NegotiatedParams, NegotiationError> {
        let pcm = self
            .pcm()
            .map_err(|e| NegotiationError::new(HwParameter::Defaults, e))?;

        // Parameter containers are scoped to this block and freed before return.
        {
            let hwp = HwParams::any(pcm).map_err(step(HwParameter::Defaults))?;
            hwp.set_access(Access::RWInterleaved)
                .map_err(step(HwParameter::Access))?;
            hwp.set_format(alsa_format(request.format))
                .map_err(step(HwParameter::Format))?;
            hwp.set_channels(request.channels)
                .map_err(step(HwParameter::Channels))?;
            hwp.set_rate_near(request.sample_rate, value_or(request.rate_direction))
                .map_err(step(HwParameter::SampleRate))?;
            hwp.set_period_size_near(request.period_frames as Frames, ValueOr::Nearest)
                .map_err(step(HwParameter::PeriodSize))?;
            hwp.set_buffer_size_near(request.buffer_frames as Frames)
                .map_err(step(HwParameter::BufferSize))?;
            pcm.hw_params(&hwp).map_err(step(HwParameter::Commit))?;
        }

        let current = pcm.hw_params_current().map_err(step(HwParameter::Commit))?;
        let granted = NegotiatedParams {
            format: request.format,
            channels: current.get_channels().map_err(step(HwParameter::Channels))?,
            sample_rate: current.get_rate().map_err(step(HwParameter::SampleRate))?,
            period_frames: current
                .get_period_size()
                .map_err(step(HwParameter::PeriodSize))?
                .max(0) as usize,
            buffer_frames: current
                .get_buffer_size()
                .map_err(step(HwParameter::BufferSize))?
                .max(0) as usize,
        };
        Ok(granted)
    }

    fn prepare(&mut self) -> Result<(), DriverError> {
        self.pcm()?.prepare().map_err(driver_error)
    }

    fn start(&mut self) -> Result<(), DriverError> {
        self.pcm()?.start().map_err(driver_error)
    }

    fn drop_pending(&mut self) -> Result<(), DriverError> {
        self.pcm()?.drop().map_err(driver_error)
    }

    fn read_interleaved(&mut self, buffer: &mut [u8]) -> Result<usize, DriverError> {
        self.pcm()?.io_bytes().readi(buffer).map_err(driver_error)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if self.pcm.take().is_some() {
            log::debug!("Closed ALSA PCM '{}'", self.device);
        }
        Ok(())
    }
}

/// ALSA format for a core sample format.
pub fn alsa_format(format: SampleFormat) -> Format {
    match format {
        SampleFormat::S16Le => Format::S16LE,
        SampleFormat::S16Be => Format::S16BE,
        SampleFormat::S24Le => Format::S24LE,
        SampleFormat::S24Be => Format::S24BE,
        SampleFormat::S24_3Le => Format::S243LE,
        SampleFormat::S24_3Be => Format::S243BE,
        SampleFormat::S32Le => Format::S32LE,
        SampleFormat::Float32Le => Format::FloatLE,
    }
}

fn value_or(direction: RateDirection) -> ValueOr {
    match direction {
        RateDirection::Below => ValueOr::Less,
        RateDirection::Nearest => ValueOr::Nearest,
        RateDirection::Above => ValueOr::Greater,
    }
}

fn step(parameter: HwParameter) -> impl Fn(alsa::Error) -> NegotiationError {
    move |e| NegotiationError::new(parameter, driver_error(e))
}

fn driver_error(e: alsa::Error) -> DriverError {
    classify(e.errno(), e.to_string())
}

/// Build a [`DriverError`] from a positive errno. `EPIPE` is an overrun.
fn classify(errno: i32, message: String) -> DriverError {
    let kind = if errno == libc::EPIPE {
        DriverErrorKind::Overrun
    } else {
        DriverErrorKind::Other
    };
    DriverError::new(kind, -errno, message)
}
