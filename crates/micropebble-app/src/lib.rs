//! # micropebble-app - Application Coordination
//!
//! Glue between the core/watch/store crates and whatever surface consumes
//! them (CLI today). Owns the resource-control primitives, the firmware
//! update session, settings, the service registry, and the crash reporter.
//!
//! ## Public API
//!
//! ### Resource control (`resource`)
//! - [`ResourceSlot`] - Observable slot with an at-most-one publishing task
//! - [`SlotEmitter`] - Handle tasks publish outcomes through
//! - [`Subscription`] - Cancellable external-subscription handle
//!
//! ### Sessions (`session`)
//! - [`FirmwareUpdateSession`] - One scope-bound firmware update attempt
//!
//! ### Crash reporting (`crash`)
//! - [`CrashReporter`] - Panic hook + supervisor channel + marker file
//!
//! ### Settings (`settings`)
//! - [`Settings`] - TOML settings with derived data paths
//!
//! ### Services (`services`)
//! - [`ServiceRegistry`] - Tag-keyed service factory map

pub mod crash;
pub mod resource;
pub mod services;
pub mod session;
pub mod settings;

pub use crash::{CrashReporter, MAX_TRACE_CHARS};
pub use resource::{ResourceSlot, SlotEmitter, Subscription};
pub use services::{Service, ServiceKind, ServiceRegistry};
pub use session::FirmwareUpdateSession;
pub use settings::Settings;
