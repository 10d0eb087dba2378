use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::hw_params::NegotiatedParams;

/// Result returned when a WAV recording is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub frames: u64,
    pub metadata: RecordingMetadata,
    pub checksum: String,
}

/// Metadata stored alongside a recording as a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub device: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub created_at: String,
    pub channels: u32,
    pub sample_rate: u32,
    pub bit_depth: u16,
    /// Name of the format the device delivered (e.g. `S24_LE`).
    pub capture_format: String,
}

impl RecordingMetadata {
    pub fn new(
        device: &str,
        params: &NegotiatedParams,
        bit_depth: u16,
        duration_secs: f64,
        file_path: &str,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device: device.to_string(),
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            channels: params.channels,
            sample_rate: params.sample_rate,
            bit_depth,
            capture_format: params.format.name().to_string(),
        }
    }
}
