use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Sample encodings a capture device can deliver.
///
/// The set is closed: every variant has an explicit full-scale amplitude,
/// so level math never has to guess. Names follow the host audio
/// subsystem's convention (`S24_LE`, `FLOAT_LE`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SampleFormat {
    /// Signed 16-bit, little-endian.
    S16Le,
    /// Signed 16-bit, big-endian.
    S16Be,
    /// Signed 24-bit payload in a 4-byte little-endian container.
    S24Le,
    /// Signed 24-bit payload in a 4-byte big-endian container.
    S24Be,
    /// Signed 24-bit packed in 3 bytes, little-endian.
    S24_3Le,
    /// Signed 24-bit packed in 3 bytes, big-endian.
    S24_3Be,
    /// Signed 32-bit, little-endian.
    S32Le,
    /// 32-bit IEEE float, little-endian. Quantized to 24-bit fixed point on decode.
    Float32Le,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 8] = [
        Self::S16Le,
        Self::S16Be,
        Self::S24Le,
        Self::S24Be,
        Self::S24_3Le,
        Self::S24_3Be,
        Self::S32Le,
        Self::Float32Le,
    ];

    /// Bytes one sample occupies in the interleaved hardware buffer.
    pub fn container_bytes(self) -> usize {
        match self {
            Self::S16Le | Self::S16Be => 2,
            Self::S24_3Le | Self::S24_3Be => 3,
            Self::S24Le | Self::S24Be | Self::S32Le | Self::Float32Le => 4,
        }
    }

    /// Significant bits of the decoded fixed-point sample.
    pub fn payload_bits(self) -> u32 {
        match self {
            Self::S16Le | Self::S16Be => 16,
            Self::S24Le | Self::S24Be | Self::S24_3Le | Self::S24_3Be | Self::Float32Le => 24,
            Self::S32Le => 32,
        }
    }

    /// Magnitude treated as 0 dBFS for this format.
    pub fn full_scale(self) -> f32 {
        match self.payload_bits() {
            16 => 32_768.0,         // 2^15
            24 => 8_388_608.0,      // 2^23
            _ => 2_147_483_648.0,   // 2^31
        }
    }

    pub fn is_24_bit(self) -> bool {
        self.payload_bits() == 24 && self != Self::Float32Le
    }

    pub fn is_16_bit(self) -> bool {
        self.payload_bits() == 16
    }

    /// Canonical name as used by the host audio subsystem.
    pub fn name(self) -> &'static str {
        match self {
            Self::S16Le => "S16_LE",
            Self::S16Be => "S16_BE",
            Self::S24Le => "S24_LE",
            Self::S24Be => "S24_BE",
            Self::S24_3Le => "S24_3LE",
            Self::S24_3Be => "S24_3BE",
            Self::S32Le => "S32_LE",
            Self::Float32Le => "FLOAT_LE",
        }
    }

    /// Decode one container into its raw 32-bit value.
    ///
    /// Integer formats are returned exactly as the container holds them,
    /// without sign extension; run the result through
    /// [`fix_sample`](crate::processing::samples::fix_sample).
    /// `bytes` must hold at least [`container_bytes`](Self::container_bytes).
    pub fn decode(self, bytes: &[u8]) -> i32 {
        match self {
            Self::S16Le => u16::from_le_bytes([bytes[0], bytes[1]]) as i32,
            Self::S16Be => u16::from_be_bytes([bytes[0], bytes[1]]) as i32,
            Self::S24Le | Self::S32Le => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            Self::S24Be => i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            Self::S24_3Le => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]),
            Self::S24_3Be => i32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
            Self::Float32Le => {
                let value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                let scaled = value.clamp(-1.0, 1.0) * self.full_scale();
                // +1.0 would land one past the largest 24-bit value.
                (scaled as i32).min((1 << 23) - 1)
            }
        }
    }

    /// Decode an interleaved byte buffer into `out`, one value per sample.
    ///
    /// Decodes `min(bytes.len() / container_bytes, out.len())` samples and
    /// returns that count.
    pub fn decode_interleaved(self, bytes: &[u8], out: &mut [i32]) -> usize {
        let width = self.container_bytes();
        let mut count = 0;
        for (chunk, slot) in bytes.chunks_exact(width).zip(out.iter_mut()) {
            *slot = self.decode(chunk);
            count += 1;
        }
        count
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|format| format.name() == normalized)
            .ok_or_else(|| CaptureError::UnsupportedFormat(s.to_string()))
    }
}

impl TryFrom<String> for SampleFormat {
    type Error = CaptureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SampleFormat> for String {
    fn from(format: SampleFormat) -> Self {
        format.name().to_string()
    }
}
