//! Scripted hardware backend for deterministic tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::{DriverError, DriverErrorKind, NegotiationError};
use crate::models::hw_params::{HwRequest, NegotiatedParams};
use crate::models::sample_format::SampleFormat;
use crate::traits::pcm_backend::{PcmBackend, PcmStream};

pub const EPIPE: i32 = -32;
pub const EIO: i32 = -5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String),
    Negotiate,
    Prepare,
    Start,
    DropPending,
    Read,
    Close,
}

/// One scripted result of `read_interleaved`.
#[derive(Debug, Clone)]
pub enum ScriptedRead {
    /// Interleaved fixed-point samples to deliver.
    Samples(Vec<i32>),
    Fail(DriverError),
}

impl ScriptedRead {
    pub fn overrun() -> Self {
        Self::Fail(DriverError::new(DriverErrorKind::Overrun, EPIPE, "Broken pipe"))
    }

    pub fn fatal() -> Self {
        Self::Fail(DriverError::other(EIO, "Input/output error"))
    }
}

#[derive(Debug, Default)]
pub struct Script {
    pub calls: Vec<Call>,
    pub open_error: Option<DriverError>,
    pub negotiation_error: Option<NegotiationError>,
    /// Values granted instead of echoing the request.
    pub grant: Option<NegotiatedParams>,
    pub prepare_errors: VecDeque<DriverError>,
    pub start_error: Option<DriverError>,
    pub drop_error: Option<DriverError>,
    pub reads: VecDeque<ScriptedRead>,
}

impl Script {
    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

/// Backend whose behavior is driven by a shared [`Script`].
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    pub script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_read(&self, read: ScriptedRead) {
        self.script.lock().reads.push_back(read);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }
}

impl PcmBackend for ScriptedBackend {
    type Stream = ScriptedStream;

    fn open_capture(&self, device: &str) -> Result<ScriptedStream, DriverError> {
        let mut script = self.script.lock();
        script.calls.push(Call::Open(device.to_string()));
        if let Some(err) = script.open_error.clone() {
            return Err(err);
        }
        Ok(ScriptedStream {
            script: Arc::clone(&self.script),
            format: SampleFormat::S32Le,
            channels: 1,
        })
    }
}

pub struct ScriptedStream {
    script: Arc<Mutex<Script>>,
    format: SampleFormat,
    channels: usize,
}

impl PcmStream for ScriptedStream {
    fn negotiate(&mut self, request: &HwRequest) -> Result<NegotiatedParams, NegotiationError> {
        let mut script = self.script.lock();
        script.calls.push(Call::Negotiate);
        if let Some(err) = script.negotiation_error.clone() {
            return Err(err);
        }
        let granted = script.grant.unwrap_or(NegotiatedParams {
            format: request.format,
            channels: request.channels,
            sample_rate: request.sample_rate,
            period_frames: request.period_frames,
            buffer_frames: request.buffer_frames,
        });
        self.format = granted.format;
        self.channels = granted.channels as usize;
        Ok(granted)
    }

    fn prepare(&mut self) -> Result<(), DriverError> {
        let mut script = self.script.lock();
        script.calls.push(Call::Prepare);
        match script.prepare_errors.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn start(&mut self) -> Result<(), DriverError> {
        let mut script = self.script.lock();
        script.calls.push(Call::Start);
        script.start_error.clone().map_or(Ok(()), Err)
    }

    fn drop_pending(&mut self) -> Result<(), DriverError> {
        let mut script = self.script.lock();
        script.calls.push(Call::DropPending);
        script.drop_error.clone().map_or(Ok(()), Err)
    }

    fn read_interleaved(&mut self, buffer: &mut [u8]) -> Result<usize, DriverError> {
        let mut script = self.script.lock();
        script.calls.push(Call::Read);
        match script.reads.pop_front() {
            Some(ScriptedRead::Samples(samples)) => {
                let bytes = encode(self.format, &samples);
                let len = bytes.len().min(buffer.len());
                buffer[..len].copy_from_slice(&bytes[..len]);
                let frame_bytes = self.format.container_bytes() * self.channels.max(1);
                Ok(len / frame_bytes)
            }
            Some(ScriptedRead::Fail(err)) => Err(err),
            None => Err(DriverError::other(EIO, "script exhausted")),
        }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.script.lock().calls.push(Call::Close);
        Ok(())
    }
}

/// Encode fixed-point samples the way a little-endian device would deliver them.
pub fn encode(format: SampleFormat, samples: &[i32]) -> Vec<u8> {
    let width = format.container_bytes();
    let mut out = Vec::with_capacity(samples.len() * width);
    for &s in samples {
        match format {
            SampleFormat::Float32Le => {
                out.extend_from_slice(&(s as f32 / format.full_scale()).to_le_bytes());
            }
            SampleFormat::S16Le | SampleFormat::S24Le | SampleFormat::S24_3Le | SampleFormat::S32Le => {
                out.extend_from_slice(&s.to_le_bytes()[..width]);
            }
            other => panic!("scripted backend does not encode {}", other),
        }
    }
    out
}
