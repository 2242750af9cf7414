//! The seam between this crate and the external watch library.
//!
//! Everything below Bluetooth transport and wire-protocol encoding lives
//! behind [`WatchConnection`]; this crate only coordinates over it.

use std::path::Path;

use tokio::sync::{mpsc, watch};

use micropebble_core::prelude::*;

use crate::status::FirmwareUpdateStatus;

/// Control surface for one connected watch.
///
/// Implemented by the external-library adapter in production and by scripted
/// fakes in tests.
#[trait_variant::make(WatchConnection: Send)]
pub trait LocalWatchConnection {
    /// Serial number identifying the target device.
    fn serial(&self) -> String;

    /// Whether the watch is currently connected.
    fn is_connected(&self) -> bool;

    /// Connectivity changes. `false` means the watch dropped off.
    fn connectivity(&self) -> watch::Receiver<bool>;

    /// Subscribe to the firmware-update status stream.
    ///
    /// The stream is owned by the external layer; it closes when the watch
    /// disconnects.
    fn firmware_status(&self) -> mpsc::Receiver<FirmwareUpdateStatus>;

    /// Hand a firmware archive to the watch for installation.
    ///
    /// The path must stay readable until the transfer finishes; callers are
    /// expected to pass a private scratch copy, not a content-provider file.
    async fn sideload_firmware(&self, path: &Path) -> Result<()>;
}
