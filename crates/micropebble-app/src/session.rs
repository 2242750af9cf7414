//! Firmware update session -- one update attempt bound to a screen scope.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use micropebble_core::prelude::*;
use micropebble_watch::{install_firmware, WatchConnection};
use tokio::sync::watch;

use crate::resource::{ResourceSlot, Subscription};

/// Ephemeral state for one firmware update attempt.
///
/// Created when the update screen attaches to a connected watch; dropped on
/// screen detach (cancelling any in-flight attempt) or when the watch
/// disconnects.
pub struct FirmwareUpdateSession<C> {
    conn: Arc<C>,
    scratch_dir: PathBuf,
    /// Selected firmware archive; set before install starts, cleared once
    /// the install begins.
    pending_firmware_file: Mutex<Option<PathBuf>>,
    slot: Arc<ResourceSlot<()>>,
    _connectivity_guard: Subscription,
}

impl<C> FirmwareUpdateSession<C>
where
    C: WatchConnection + Sync + 'static,
{
    pub fn new(conn: Arc<C>, scratch_dir: impl Into<PathBuf>) -> Self {
        let slot = Arc::new(ResourceSlot::new());
        let guard = spawn_connectivity_guard(conn.clone(), slot.clone());
        Self {
            conn,
            scratch_dir: scratch_dir.into(),
            pending_firmware_file: Mutex::new(None),
            slot,
            _connectivity_guard: guard,
        }
    }

    /// Serial of the watch this session targets.
    pub fn watch_serial(&self) -> String {
        self.conn.serial()
    }

    /// Remember the user's selected firmware archive.
    pub fn select_file(&self, path: impl Into<PathBuf>) {
        *self.pending_firmware_file.lock().unwrap() = Some(path.into());
    }

    pub fn pending_file(&self) -> Option<PathBuf> {
        self.pending_firmware_file.lock().unwrap().clone()
    }

    /// Observe this attempt's outcome stream.
    pub fn subscribe(&self) -> watch::Receiver<Option<Outcome<()>>> {
        self.slot.subscribe()
    }

    /// Kick off the update with the pending file.
    ///
    /// Missing selection is a local validation error reported synchronously;
    /// everything later flows through the slot. The pending file is cleared
    /// as the install begins.
    pub fn start_update(&self) -> Result<()> {
        let file = self
            .pending_firmware_file
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::validation("no firmware file selected"))?;

        let conn = self.conn.clone();
        let scratch_dir = self.scratch_dir.clone();
        self.slot.launch(move |emitter| async move {
            let emit = {
                let emitter = emitter.clone();
                move |o| emitter.emit(o)
            };
            install_firmware(conn.as_ref(), &file, &scratch_dir, emit).await?;
            emitter.emit(Outcome::Success(()));
            Ok(())
        });
        Ok(())
    }

    /// Cancel the in-flight attempt, if any.
    pub fn cancel(&self) {
        self.slot.cancel();
    }
}

/// Tear the attempt down as soon as the watch drops off, and surface the
/// disconnect as a terminal error on the slot.
fn spawn_connectivity_guard<C>(conn: Arc<C>, slot: Arc<ResourceSlot<()>>) -> Subscription
where
    C: WatchConnection + Sync + 'static,
{
    let mut rx = conn.connectivity();
    Subscription::spawn(async move {
        loop {
            if !*rx.borrow_and_update() {
                warn!(serial = %conn.serial(), "watch disconnected, ending session");
                slot.cancel();
                slot.launch(move |_| async move { Err(Error::disconnected(conn.serial())) });
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use micropebble_watch::FirmwareUpdateStatus;
    use tokio::sync::mpsc;

    struct ScriptedWatch {
        serial: String,
        conn_tx: watch::Sender<bool>,
        status: Mutex<Option<mpsc::Receiver<FirmwareUpdateStatus>>>,
        sideload_calls: AtomicUsize,
    }

    impl ScriptedWatch {
        fn new(status: mpsc::Receiver<FirmwareUpdateStatus>) -> Self {
            Self {
                serial: "XJ4T".into(),
                conn_tx: watch::channel(true).0,
                status: Mutex::new(Some(status)),
                sideload_calls: AtomicUsize::new(0),
            }
        }
    }

    impl WatchConnection for ScriptedWatch {
        fn serial(&self) -> String {
            self.serial.clone()
        }

        fn is_connected(&self) -> bool {
            *self.conn_tx.borrow()
        }

        fn connectivity(&self) -> watch::Receiver<bool> {
            self.conn_tx.subscribe()
        }

        fn firmware_status(&self) -> mpsc::Receiver<FirmwareUpdateStatus> {
            self.status.lock().unwrap().take().expect("status taken twice")
        }

        async fn sideload_firmware(&self, _path: &Path) -> Result<()> {
            self.sideload_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    #[tokio::test]
    async fn test_full_update_through_session() {
        let (tx, rx) = mpsc::channel(8);
        let dir = tempfile::tempdir().unwrap();
        let watch_conn = Arc::new(ScriptedWatch::new(rx));
        let session = FirmwareUpdateSession::new(watch_conn.clone(), dir.path().join("scratch"));

        let fw = dir.path().join("fw.pbz");
        std::fs::write(&fw, b"pbz").unwrap();
        session.select_file(&fw);
        assert_eq!(session.pending_file(), Some(fw));

        tx.send(FirmwareUpdateStatus::WaitingToStart).await.unwrap();
        tx.send(FirmwareUpdateStatus::Idle { last_failure: None })
            .await
            .unwrap();

        let mut outcomes = session.subscribe();
        session.start_update().unwrap();

        // Pending file is consumed by starting.
        assert!(session.pending_file().is_none());

        settle().await;
        let latest = outcomes.borrow_and_update().clone().unwrap();
        assert!(latest.success().is_some());
        assert_eq!(watch_conn.sideload_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_without_selection_is_validation_error() {
        let (_tx, rx) = mpsc::channel(1);
        let dir = tempfile::tempdir().unwrap();
        let session =
            FirmwareUpdateSession::new(Arc::new(ScriptedWatch::new(rx)), dir.path());

        let err = session.start_update().unwrap_err();
        assert!(err.is_local_validation());
    }

    #[tokio::test]
    async fn test_bad_extension_surfaces_on_slot_without_sideload() {
        let (_tx, rx) = mpsc::channel(1);
        let dir = tempfile::tempdir().unwrap();
        let watch_conn = Arc::new(ScriptedWatch::new(rx));
        let session = FirmwareUpdateSession::new(watch_conn.clone(), dir.path().join("scratch"));

        let fw = dir.path().join("firmware.txt");
        std::fs::write(&fw, b"nope").unwrap();
        session.select_file(&fw);
        session.start_update().unwrap();

        settle().await;
        let latest = session.slot.latest().unwrap();
        assert!(matches!(latest.error(), Some(Error::InvalidPbzFile { .. })));
        assert_eq!(watch_conn.sideload_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disconnect_ends_session_with_error() {
        let (_tx, rx) = mpsc::channel(1);
        let dir = tempfile::tempdir().unwrap();
        let watch_conn = Arc::new(ScriptedWatch::new(rx));
        let session = FirmwareUpdateSession::new(watch_conn.clone(), dir.path());

        watch_conn.conn_tx.send(false).unwrap();
        settle().await;

        let latest = session.slot.latest().unwrap();
        assert!(matches!(
            latest.error(),
            Some(Error::WatchDisconnected { .. })
        ));
    }
}
