//! Externally-observed firmware update state.
//!
//! These states are owned and emitted by the watch connection layer; the
//! orchestrator in [`crate::updater`] is a passive reducer over them.

use tokio::sync::watch;

/// One observation from a watch's firmware-update status stream.
#[derive(Debug, Clone)]
pub enum FirmwareUpdateStatus {
    /// The watch has accepted the update request but transfer has not begun.
    WaitingToStart,
    /// Transfer in flight. The nested stream carries the fraction in `[0, 1]`;
    /// it is replaced wholesale on each re-entry into this state.
    InProgress { progress: watch::Receiver<f32> },
    /// Transfer complete, watch rebooting into the new firmware.
    WaitingForReboot,
    /// No update in progress. `last_failure` is set when the previous attempt
    /// ended in a device-reported error.
    Idle { last_failure: Option<String> },
    /// The update could not be started at all.
    ErrorStarting { error: String },
}

impl FirmwareUpdateStatus {
    /// Convenience constructor for an in-progress observation with a fixed
    /// initial fraction. Returns the sender so the caller can keep driving
    /// the nested stream.
    pub fn in_progress(initial: f32) -> (watch::Sender<f32>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, FirmwareUpdateStatus::InProgress { progress: rx })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, FirmwareUpdateStatus::Idle { .. })
    }
}
