//! Firmware update orchestration.
//!
//! The watch connection owns the real update state machine; this module is a
//! passive reducer that maps its status stream onto the three-state
//! [`Outcome`] model and handles the local half of an install attempt
//! (archive validation, scratch-file lifecycle).

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use micropebble_core::prelude::*;

use crate::connection::WatchConnection;
use crate::status::FirmwareUpdateStatus;

/// Sink the orchestrator publishes progress observations through.
///
/// Terminal success/error is signalled by the function result, not the sink;
/// the caller (resource-control task) converts both into slot emissions.
pub trait EmitOutcome: Fn(Outcome<()>) + Clone + Send + Sync + 'static {}
impl<F: Fn(Outcome<()>) + Clone + Send + Sync + 'static> EmitOutcome for F {}

/// Reduce the firmware status stream for one update attempt.
///
/// Terminates with `Ok(())` on the first `Idle` observed after any non-idle
/// state (the update ran and the watch settled), or with an error on
/// `ErrorStarting`, a failed `Idle`, or the stream closing (disconnect).
///
/// An initial `Idle { last_failure: None }` before the update has started is
/// ignored, since the stream replays the current state on subscription.
pub async fn run_update(
    serial: &str,
    status_rx: &mut mpsc::Receiver<FirmwareUpdateStatus>,
    emit: impl EmitOutcome,
) -> Result<()> {
    let mut stop_on_next_idle = false;
    let mut forwarder: Option<JoinHandle<()>> = None;

    let result = loop {
        let Some(status) = status_rx.recv().await else {
            // Stream closed mid-attempt: the watch dropped off.
            break Err(Error::disconnected(serial));
        };

        match status {
            FirmwareUpdateStatus::WaitingToStart => {
                debug!(serial, "firmware update waiting to start");
                stop_on_next_idle = true;
            }
            FirmwareUpdateStatus::InProgress { progress } => {
                stop_on_next_idle = true;
                if let Some(prev) = forwarder.take() {
                    prev.abort();
                }
                forwarder = Some(spawn_progress_forwarder(progress, emit.clone()));
            }
            FirmwareUpdateStatus::WaitingForReboot => {
                debug!(serial, "firmware transferred, waiting for reboot");
                stop_on_next_idle = true;
                if let Some(prev) = forwarder.take() {
                    prev.abort();
                }
                emit(Outcome::Progress(None));
            }
            FirmwareUpdateStatus::ErrorStarting { error } => {
                break Err(Error::firmware_update(format!(
                    "could not start update: {error}"
                )));
            }
            FirmwareUpdateStatus::Idle { last_failure } => {
                if let Some(failure) = last_failure {
                    break Err(Error::firmware_update(failure));
                }
                if stop_on_next_idle {
                    info!(serial, "firmware update complete");
                    break Ok(());
                }
                // Initial idle replayed on subscription: keep waiting.
            }
        }
    };

    if let Some(h) = forwarder.take() {
        h.abort();
    }
    result
}

/// Forward the nested progress stream as determinate `Progress` outcomes
/// until aborted or the sender side closes.
fn spawn_progress_forwarder(
    mut progress: tokio::sync::watch::Receiver<f32>,
    emit: impl EmitOutcome,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let value = *progress.borrow_and_update();
            emit(Outcome::Progress(Some(value)));
            if progress.changed().await.is_err() {
                break;
            }
        }
    })
}

/// Check that a user-selected file looks like a firmware archive.
///
/// Purely local: a mismatch is reported before anything reaches the watch.
pub fn validate_firmware_file(path: &Path) -> Result<()> {
    let ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pbz"));
    if ok {
        Ok(())
    } else {
        Err(Error::invalid_pbz(path))
    }
}

/// Run one complete install attempt against a connected watch.
///
/// Validates the archive, copies it into a private scratch file (the user's
/// content source may disappear mid-transfer), hands the scratch path to the
/// external sideload call, then reduces the status stream. The scratch file
/// is removed regardless of outcome.
pub async fn install_firmware<C>(
    conn: &C,
    firmware_file: &Path,
    scratch_dir: &Path,
    emit: impl EmitOutcome,
) -> Result<()>
where
    C: WatchConnection + Sync,
{
    validate_firmware_file(firmware_file)?;
    if !conn.is_connected() {
        return Err(Error::disconnected(conn.serial()));
    }

    emit(Outcome::Progress(None));

    let scratch = scratch_path(scratch_dir, &conn.serial());
    tokio::fs::create_dir_all(scratch_dir).await?;

    // A failed copy can still leave a partial destination file, so the
    // cleanup below must cover the copy too.
    let result = async {
        tokio::fs::copy(firmware_file, &scratch).await?;
        let mut status_rx = conn.firmware_status();
        conn.sideload_firmware(&scratch).await?;
        run_update(&conn.serial(), &mut status_rx, emit).await
    }
    .await;

    if let Err(e) = tokio::fs::remove_file(&scratch).await {
        warn!("failed to remove firmware scratch file: {e}");
    }

    result
}

fn scratch_path(scratch_dir: &Path, serial: &str) -> PathBuf {
    scratch_dir.join(format!("sideload-{serial}.pbz"))
}
