//! Stateless sample math: container correction, peak detection, dB conversion.

use crate::models::sample_format::SampleFormat;

/// Level reported for silence and for anything quieter than it.
pub const MIN_DB: f32 = -60.0;

/// Turn a raw container value into a correctly signed sample.
///
/// 24-bit payloads sit in the low bits of their container with the sign bit
/// at bit 23, so the payload is shifted to the top and arithmetic-shifted
/// back. 16-bit payloads are truncated to `i16`. Other formats are returned
/// unchanged.
#[inline]
pub fn fix_sample(raw: i32, format: SampleFormat) -> i32 {
    if format.is_24_bit() {
        (raw << 8) >> 8
    } else if format.is_16_bit() {
        raw as i16 as i32
    } else {
        raw
    }
}

/// Absolute peak per channel over `frames` interleaved frames.
///
/// Returns exactly `channels` values in channel order. Reads at most
/// `data.len() / channels` frames.
pub fn calculate_peak_amplitudes(
    data: &[i32],
    frames: usize,
    channels: usize,
    format: SampleFormat,
) -> Vec<i32> {
    let mut peaks = vec![0i32; channels];
    if channels == 0 {
        return peaks;
    }

    for frame in data.chunks_exact(channels).take(frames) {
        for (peak, &raw) in peaks.iter_mut().zip(frame) {
            let magnitude = fix_sample(raw, format).saturating_abs();
            if magnitude > *peak {
                *peak = magnitude;
            }
        }
    }
    peaks
}

/// Convert a peak amplitude to dB relative to the format's full scale.
///
/// Non-positive amplitudes and anything below [`MIN_DB`] report `MIN_DB`.
pub fn amplitude_to_db(amplitude: i32, format: SampleFormat) -> f32 {
    if amplitude <= 0 {
        return MIN_DB;
    }
    let db = 20.0 * (amplitude as f32 / format.full_scale()).log10();
    db.max(MIN_DB)
}

/// Corrected sample scaled to [-1.0, 1.0].
#[inline]
pub fn normalize_sample(raw: i32, format: SampleFormat) -> f32 {
    (fix_sample(raw, format) as f32 / format.full_scale()).clamp(-1.0, 1.0)
}
