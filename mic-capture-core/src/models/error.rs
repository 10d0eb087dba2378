use std::fmt;

use thiserror::Error;

/// Errors that can occur during microphone capture operations.
///
/// An overrun is not an error here: the read recovers the stream and
/// reports it as [`PeriodRead::Overrun`](super::audio_models::PeriodRead::Overrun).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("cannot open capture device '{device}': {reason}")]
    DeviceOpen { device: String, reason: String },

    #[error("cannot set {parameter}: {reason}")]
    Parameter { parameter: HwParameter, reason: String },

    #[error("session not initialized, call initialize() first")]
    NotInitialized,

    #[error("session not running, call start() first")]
    NotRunning,

    #[error("session already initialized")]
    AlreadyInitialized,

    #[error("session already running")]
    AlreadyRunning,

    #[error("cannot start capture stream: {0}")]
    Start(String),

    #[error("read failed ({code}): {reason}")]
    FatalRead { code: i32, reason: String },

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("device enumeration failed: {0}")]
    Enumeration(String),
}

/// The hardware parameter a negotiation step was applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwParameter {
    /// Initial "any configuration" query.
    Defaults,
    Access,
    Format,
    Channels,
    SampleRate,
    PeriodSize,
    BufferSize,
    /// The final commit of all parameters together.
    Commit,
}

impl fmt::Display for HwParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Defaults => "hardware defaults",
            Self::Access => "interleaved access mode",
            Self::Format => "sample format",
            Self::Channels => "channel count",
            Self::SampleRate => "sample rate",
            Self::PeriodSize => "period size",
            Self::BufferSize => "buffer size",
            Self::Commit => "hardware parameters",
        };
        f.write_str(name)
    }
}

/// How the driver classified a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The capture ring buffer filled before it was read.
    Overrun,
    Other,
}

/// An error reported by the underlying audio driver.
///
/// `code` is the driver's negative result code (e.g. `-EPIPE`),
/// `message` its human-readable description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} ({code})")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub code: i32,
    pub message: String,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, code: i32, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn other(code: i32, message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Other, code, message)
    }

    pub fn is_overrun(&self) -> bool {
        self.kind == DriverErrorKind::Overrun
    }
}

/// A negotiation step was rejected by the driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot set {parameter}: {source}")]
pub struct NegotiationError {
    pub parameter: HwParameter,
    pub source: DriverError,
}

impl NegotiationError {
    pub fn new(parameter: HwParameter, source: DriverError) -> Self {
        Self { parameter, source }
    }
}

impl From<NegotiationError> for CaptureError {
    fn from(err: NegotiationError) -> Self {
        CaptureError::Parameter {
            parameter: err.parameter,
            reason: err.source.to_string(),
        }
    }
}
