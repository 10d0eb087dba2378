/// Capture session state machine.
///
/// State transitions:
/// ```text
/// closed → initialized → running ⇄ stopped
///    ↑__________________________________|  (drop)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Closed,
    Initialized,
    Running,
    Stopped,
}

impl CaptureState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// A device handle is held in every state except `Closed`.
    pub fn has_device(&self) -> bool {
        !self.is_closed()
    }

    /// Whether `start()` may be issued from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Initialized | Self::Stopped)
    }
}
