//! # micropebble-watch - Firmware Update Orchestration
//!
//! Drives a single firmware-update attempt against a connected watch. The
//! actual update state machine (transfer framing, flashing) lives in the
//! external watch library behind the [`WatchConnection`] seam; this crate is
//! a passive reducer over its status stream plus the local half of an
//! install: `.pbz` validation and scratch-file lifecycle.
//!
//! ## Public API
//!
//! - [`WatchConnection`] - Async trait standing in for the external library
//! - [`FirmwareUpdateStatus`] - Externally-observed update state
//! - [`install_firmware()`] - One complete install attempt
//! - [`run_update()`] - The status-stream reducer
//! - [`validate_firmware_file()`] - Local archive validation

pub mod connection;
pub mod status;
pub mod updater;

pub use connection::{LocalWatchConnection, WatchConnection};
pub use status::FirmwareUpdateStatus;
pub use updater::{install_firmware, run_update, validate_firmware_file, EmitOutcome};
