//! PCM WAV header generation and sample encoding.
//!
//! Only integer PCM (format code 1) is written; float captures are stored
//! as 24-bit integers after decoding.

use crate::models::hw_params::NegotiatedParams;
use crate::models::sample_format::SampleFormat;
use crate::processing::samples::fix_sample;

/// Size of the canonical RIFF/WAVE header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Stream layout written into the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    /// 16, 24 or 32.
    pub bit_depth: u16,
}

impl WavSpec {
    /// Layout that stores a capture losslessly.
    pub fn for_capture(params: &NegotiatedParams) -> Self {
        Self {
            sample_rate: params.sample_rate,
            channels: params.channels as u16,
            bit_depth: bit_depth_for(params.format),
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bit_depth as usize / 8
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// WAV bit depth for a capture format.
pub fn bit_depth_for(format: SampleFormat) -> u16 {
    format.payload_bits() as u16
}

/// Generate a 44-byte WAV header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16
/// [20-21]  1 (PCM)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate
/// [32-33]  block_align
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(spec: &WavSpec, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&spec.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&spec.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&spec.bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// RIFF chunk size (offset 4) for a file of `total_file_size` bytes.
///
/// `None` when the file is too large for a 32-bit RIFF size field.
pub fn riff_chunk_size(total_file_size: u64) -> Option<u32> {
    u32::try_from(total_file_size.saturating_sub(8)).ok()
}

/// Append `frames` interleaved raw samples to `out` as little-endian PCM.
///
/// Samples are sign-corrected for `format` and truncated to the WAV
/// byte width, so a 24-bit payload keeps its three significant bytes.
pub fn encode_period(
    data: &[i32],
    frames: usize,
    channels: usize,
    format: SampleFormat,
    spec: &WavSpec,
    out: &mut Vec<u8>,
) {
    let width = spec.bytes_per_sample();
    let samples = (frames * channels).min(data.len());
    out.reserve(samples * width);
    for &raw in &data[..samples] {
        let bytes = fix_sample(raw, format).to_le_bytes();
        out.extend_from_slice(&bytes[..width]);
    }
}
