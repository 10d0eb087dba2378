//! Turns a [`MicrophoneConfig`] into a committed hardware configuration.

use crate::models::config::MicrophoneConfig;
use crate::models::error::{CaptureError, HwParameter};
use crate::models::hw_params::{HwRequest, NegotiatedParams};
use crate::traits::pcm_backend::PcmStream;

/// Smallest hardware buffer, in periods, that leaves room to absorb jitter.
const MIN_BUFFER_PERIODS: usize = 2;

/// Negotiate `config` on an open stream.
///
/// The driver may substitute the nearest supported rate, period and buffer
/// size; those substitutions are logged and the granted values returned.
/// Format and channel count must match exactly.
pub fn negotiate<S: PcmStream>(
    stream: &mut S,
    config: &MicrophoneConfig,
) -> Result<NegotiatedParams, CaptureError> {
    let request = HwRequest::from_config(config);

    let granted = stream.negotiate(&request).map_err(|e| {
        log::error!("Negotiation on '{}' failed: {}", config.device, e);
        CaptureError::from(e)
    })?;

    check_granted(&request, &granted)?;
    warn_on_substitutions(&request, &granted);

    log::info!(
        "Negotiated '{}': {} ch, {} Hz, {}, period {} frames ({:.2} ms), buffer {} frames",
        config.device,
        granted.channels,
        granted.sample_rate,
        granted.format,
        granted.period_frames,
        granted.latency_ms(),
        granted.buffer_frames,
    );
    Ok(granted)
}

fn check_granted(request: &HwRequest, granted: &NegotiatedParams) -> Result<(), CaptureError> {
    if granted.format != request.format {
        return Err(CaptureError::Parameter {
            parameter: HwParameter::Format,
            reason: format!("requested {}, driver committed {}", request.format, granted.format),
        });
    }
    if granted.channels != request.channels {
        return Err(CaptureError::Parameter {
            parameter: HwParameter::Channels,
            reason: format!(
                "requested {}, driver committed {}",
                request.channels, granted.channels
            ),
        });
    }
    if granted.sample_rate == 0 {
        return Err(CaptureError::Parameter {
            parameter: HwParameter::SampleRate,
            reason: "driver committed a rate of 0 Hz".into(),
        });
    }
    if granted.period_frames == 0 {
        return Err(CaptureError::Parameter {
            parameter: HwParameter::PeriodSize,
            reason: "driver committed an empty period".into(),
        });
    }
    Ok(())
}

fn warn_on_substitutions(request: &HwRequest, granted: &NegotiatedParams) {
    if granted.sample_rate != request.sample_rate {
        log::warn!(
            "Requested rate {} Hz, but got {} Hz",
            request.sample_rate,
            granted.sample_rate
        );
    }
    if granted.period_frames != request.period_frames {
        log::warn!(
            "Requested period {} frames, but got {} frames",
            request.period_frames,
            granted.period_frames
        );
    }
    if granted.buffer_periods() < MIN_BUFFER_PERIODS {
        log::warn!(
            "Hardware buffer holds only {} frames ({} period(s)); expect overruns",
            granted.buffer_frames,
            granted.buffer_periods()
        );
    }
}
