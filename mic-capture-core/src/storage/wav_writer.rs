use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::processing::wav_format::{self, WavSpec, WAV_HEADER_SIZE};

/// Largest PCM payload whose RIFF and data sizes fit the 32-bit header fields.
pub const MAX_DATA_BYTES: u64 = u32::MAX as u64 - WAV_HEADER_SIZE as u64;

/// Streaming PCM WAV file writer.
///
/// Writes a placeholder header on `open`, appends PCM bytes, and patches the
/// RIFF and data sizes on `close`.
pub struct WavFileWriter {
    file_path: PathBuf,
    spec: WavSpec,
    file: Option<BufWriter<File>>,
    data_bytes: u64,
}

impl WavFileWriter {
    pub fn new(file_path: PathBuf, spec: WavSpec) -> Self {
        Self {
            file_path,
            spec,
            file: None,
            data_bytes: 0,
        }
    }

    /// Create the file (and its directory) and write the header.
    pub fn open(&mut self) -> Result<(), CaptureError> {
        if self.file.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| CaptureError::Storage(format!("failed to create directory: {}", e)))?;
            }
        }

        let file = File::create(&self.file_path)
            .map_err(|e| CaptureError::Storage(format!("failed to create file: {}", e)))?;
        let mut file = BufWriter::new(file);

        let header = wav_format::generate_wav_header(&self.spec, 0);
        file.write_all(&header)
            .map_err(|e| CaptureError::Storage(format!("failed to write header: {}", e)))?;

        self.file = Some(file);
        self.data_bytes = 0;
        Ok(())
    }

    /// Append encoded PCM bytes.
    ///
    /// Data that would grow the payload past [`MAX_DATA_BYTES`] is refused.
    pub fn write(&mut self, pcm: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::Storage("file is not open for writing".into()))?;
        if self.data_bytes + pcm.len() as u64 > MAX_DATA_BYTES {
            return Err(CaptureError::Storage(format!(
                "WAV data would exceed {} bytes",
                MAX_DATA_BYTES
            )));
        }
        file.write_all(pcm)
            .map_err(|e| CaptureError::Storage(format!("write failed: {}", e)))?;
        self.data_bytes += pcm.len() as u64;
        Ok(())
    }

    /// Patch header sizes, flush, and return the SHA-256 of the finished file.
    pub fn close(&mut self) -> Result<String, CaptureError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| CaptureError::Storage("file is not open".into()))?;

        let total = self.data_bytes + WAV_HEADER_SIZE as u64;
        let too_large = || {
            CaptureError::Storage(format!(
                "{} data bytes do not fit a WAV header",
                self.data_bytes
            ))
        };
        let riff_size = wav_format::riff_chunk_size(total).ok_or_else(too_large)?;
        let data_size = u32::try_from(self.data_bytes).map_err(|_| too_large())?;
        let io_err = |e: std::io::Error| CaptureError::Storage(e.to_string());

        file.seek(SeekFrom::Start(4)).map_err(io_err)?;
        file.write_all(&riff_size.to_le_bytes()).map_err(io_err)?;

        file.seek(SeekFrom::Start(40)).map_err(io_err)?;
        file.write_all(&data_size.to_le_bytes()).map_err(io_err)?;

        file.flush().map_err(io_err)?;
        drop(file);

        sha256_file(&self.file_path)
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// PCM bytes written after the header.
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn spec(&self) -> &WavSpec {
        &self.spec
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// Compute the SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data = fs::read(path)
        .map_err(|e| CaptureError::Storage(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
