//! Tri-state async result container

use std::sync::Arc;

use crate::error::Error;

/// The state of an asynchronous operation as rendered by a screen.
///
/// Every long-running operation publishes a stream of these into its slot;
/// consumers render the latest value only. `Progress`, `Success` and `Error`
/// are mutually exclusive -- there is no history to replay.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Operation in flight. `None` means indeterminate, otherwise the value
    /// is in `[0.0, 1.0]`.
    Progress(Option<f32>),
    /// Terminal: holds the last good value.
    Success(T),
    /// Terminal for this attempt: carries a classified failure.
    Error(Arc<Error>),
}

impl<T> Outcome<T> {
    /// Indeterminate progress.
    pub fn busy() -> Self {
        Outcome::Progress(None)
    }

    /// Wrap a failure as a terminal error outcome.
    pub fn failed(err: Error) -> Self {
        Outcome::Error(Arc::new(err))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Progress(_))
    }

    /// Progress fraction, if determinate.
    pub fn progress(&self) -> Option<f32> {
        match self {
            Outcome::Progress(p) => *p,
            _ => None,
        }
    }

    /// The success value, if any.
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Error(e) => Some(e),
            _ => None,
        }
    }
}
