//! # micropebble-core - Core Domain Types
//!
//! Foundation crate for the micropebble companion. Provides the `Outcome`
//! async result container, error handling, deep-link parsing, and logging
//! setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, thiserror, tracing, url).
//!
//! ## Public API
//!
//! ### Outcome (`outcome`)
//! - [`Outcome`] - Tri-state (Progress/Success/Error) async result container.
//!   Every long-running operation publishes these into its observable slot.
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with local-validation / connectivity /
//!   remote-parsing / device-reported / unknown classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ### Deep Links (`deeplink`)
//! - [`NavTarget`] - Typed navigation target
//! - [`deeplink::parse()`] - Map a URI onto a navigation target
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use micropebble_core::prelude::*;
//! ```

pub mod deeplink;
pub mod error;
pub mod logging;
pub mod outcome;

/// Prelude for common imports used throughout all micropebble crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use super::outcome::Outcome;
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use deeplink::NavTarget;
pub use error::{Error, Result, ResultExt};
pub use outcome::Outcome;
