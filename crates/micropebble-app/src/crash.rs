//! Crash reporting.
//!
//! A process-wide panic hook captures the panic message and backtrace,
//! truncates to a bounded size, and hands the report to a supervisor channel
//! when one is connected. If no supervisor is listening yet (early startup,
//! or the supervisor itself died) the report is written to a disk marker
//! file instead, and surfaced on the next start.

use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use micropebble_core::prelude::*;

/// Reports are truncated to this many characters before transport.
pub const MAX_TRACE_CHARS: usize = 10_000;

/// Routes crash reports to a supervisor or the marker file.
pub struct CrashReporter {
    marker_path: PathBuf,
    supervisor: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl CrashReporter {
    pub fn new(marker_path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            marker_path: marker_path.into(),
            supervisor: Mutex::new(None),
        })
    }

    /// Attach the supervisor's receiving end. Reports raised after this call
    /// go over the channel instead of disk.
    pub fn connect_supervisor(&self, tx: mpsc::UnboundedSender<String>) {
        *self.supervisor.lock().unwrap() = Some(tx);
    }

    /// Deliver one crash report, truncated to [`MAX_TRACE_CHARS`].
    ///
    /// Failure to reach the supervisor falls back to the marker file; a
    /// failure to write even that is logged and swallowed -- the process is
    /// already going down.
    pub fn report(&self, trace: &str) {
        let truncated = truncate_chars(trace, MAX_TRACE_CHARS);

        if let Some(tx) = self.supervisor.lock().unwrap().as_ref() {
            if tx.send(truncated.clone()).is_ok() {
                return;
            }
        }

        if let Err(e) = write_marker(&self.marker_path, &truncated) {
            error!("failed to write crash marker: {e}");
        }
    }

    /// Install the process-wide panic hook. Call once at startup.
    pub fn install_panic_hook(self: &Arc<Self>) {
        let reporter = self.clone();
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let trace = format!("{info}\n{}", Backtrace::force_capture());
            reporter.report(&trace);
            previous(info);
        }));
    }

    /// Read and clear the pending report from a previous crash, if any.
    pub fn take_pending_report(&self) -> Option<String> {
        take_pending_report(&self.marker_path)
    }
}

/// Read and clear a crash marker file.
pub fn take_pending_report(marker_path: &Path) -> Option<String> {
    let report = std::fs::read_to_string(marker_path).ok()?;
    if let Err(e) = std::fs::remove_file(marker_path) {
        warn!("failed to clear crash marker: {e}");
    }
    Some(report)
}

fn write_marker(path: &Path, report: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report)?;
    Ok(())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
