use crate::models::error::{DriverError, NegotiationError};
use crate::models::hw_params::{HwRequest, NegotiatedParams};

/// Opens capture streams on a host audio subsystem.
///
/// Implemented by:
/// - `AlsaBackend` (Linux, `mic-capture-alsa`)
/// - the scripted backend used in this crate's tests
pub trait PcmBackend {
    type Stream: PcmStream;

    /// Open `device` for blocking, capture-only access.
    ///
    /// The identifier is passed to the driver unchanged.
    fn open_capture(&self, device: &str) -> Result<Self::Stream, DriverError>;
}

/// One open hardware capture stream.
///
/// The handle is unique: it is never cloned, and every method is called from
/// the single context that owns the session.
pub trait PcmStream {
    /// Apply `request` to the hardware.
    ///
    /// Steps run in order (access, format, channels, rate, period, buffer)
    /// and stop at the first rejection. Nothing takes effect until the final
    /// commit succeeds. Any parameter container allocated here is released
    /// before this method returns.
    fn negotiate(&mut self, request: &HwRequest) -> Result<NegotiatedParams, NegotiationError>;

    /// Prepare the stream for I/O (after configuration or an overrun).
    fn prepare(&mut self) -> Result<(), DriverError>;

    /// Explicitly start the stream.
    fn start(&mut self) -> Result<(), DriverError>;

    /// Stop the stream, discarding any audio still buffered.
    fn drop_pending(&mut self) -> Result<(), DriverError>;

    /// Block until up to `buffer.len() / frame_bytes` frames are read.
    ///
    /// Returns the number of frames written into `buffer`.
    fn read_interleaved(&mut self, buffer: &mut [u8]) -> Result<usize, DriverError>;

    /// Release the device handle. Called once, last.
    fn close(&mut self) -> Result<(), DriverError>;
}
