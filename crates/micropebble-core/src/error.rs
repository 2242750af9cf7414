//! Application error types with recoverable/fatal classification

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Local Validation Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Not a valid firmware archive (.pbz): {path}")]
    InvalidPbzFile { path: PathBuf },

    #[error("No watch selected")]
    NoWatchSelected,

    #[error("Validation error: {message}")]
    Validation { message: String },

    // ─────────────────────────────────────────────────────────────
    // Connectivity Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Watch disconnected: {serial}")]
    WatchDisconnected { serial: String },

    #[error("No network connection")]
    NoNetwork,

    #[error("HTTP request failed: {message}")]
    Http { message: String },

    // ─────────────────────────────────────────────────────────────
    // Remote/Parsing Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed server response: {message}")]
    DataParsing { message: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    // ─────────────────────────────────────────────────────────────
    // Device-Reported Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Firmware update failed: {message}")]
    FirmwareUpdate { message: String },

    #[error("Watch reported error: {message}")]
    Device { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Catch-all
    // ─────────────────────────────────────────────────────────────
    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn invalid_pbz(path: impl Into<PathBuf>) -> Self {
        Self::InvalidPbzFile { path: path.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn disconnected(serial: impl Into<String>) -> Self {
        Self::WatchDisconnected {
            serial: serial.into(),
        }
    }

    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    pub fn data_parsing(message: impl Into<String>) -> Self {
        Self::DataParsing {
            message: message.into(),
        }
    }

    pub fn firmware_update(message: impl Into<String>) -> Self {
        Self::FirmwareUpdate {
            message: message.into(),
        }
    }

    pub fn device(message: impl Into<String>) -> Self {
        Self::Device {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable within the triggering UI action
    /// (rendered as a retryable error rather than crashing the process).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Unknown { .. })
    }

    /// Check if the UI should offer a connectivity-specific retry affordance.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Error::WatchDisconnected { .. } | Error::NoNetwork | Error::Http { .. }
        )
    }

    /// Check if this error was raised before any device/network interaction.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidPbzFile { .. } | Error::NoWatchSelected | Error::Validation { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::disconnected("XJ4T");
        assert_eq!(err.to_string(), "Watch disconnected: XJ4T");

        let err = Error::invalid_pbz("/tmp/firmware.txt");
        assert!(err.to_string().contains(".pbz"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::NoNetwork.is_connectivity());
        assert!(Error::disconnected("ABCD").is_connectivity());
        assert!(!Error::data_parsing("bad json").is_connectivity());

        assert!(Error::invalid_pbz("/x.txt").is_local_validation());
        assert!(Error::NoWatchSelected.is_local_validation());
        assert!(!Error::http("timeout").is_local_validation());
    }

    #[test]
    fn test_unknown_is_not_recoverable() {
        assert!(!Error::unknown("boom").is_recoverable());
        assert!(Error::http("timeout").is_recoverable());
        assert!(Error::firmware_update("watch nak").is_recoverable());
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::validation("test");
        let _ = Error::http("test");
        let _ = Error::data_parsing("test");
        let _ = Error::firmware_update("test");
        let _ = Error::device("test");
        let _ = Error::config("test");
    }
}
