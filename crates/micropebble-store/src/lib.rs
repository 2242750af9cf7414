//! # micropebble-store - App-store layer
//!
//! REST client, source registry, and cursor-based pagination for the
//! companion's app-store browser.
//!
//! ## Public API
//!
//! ### Models (`models`)
//! - [`AppstoreSource`] / [`default_sources()`] - Persisted source records
//! - [`AppstoreApp`], [`AppstoreCollectionPage`], [`HomeDocument`] - Wire
//!   models with lenient deserialization and multi-format date parsing
//!
//! ### Client (`client`)
//! - [`StoreClient`] - reqwest-backed store API client
//!
//! ### Registry (`registry`)
//! - [`SourceRegistry`] - Ordered, observable, persisted source list with
//!   atomic transforms
//!
//! ### Pager (`pager`)
//! - [`CollectionPager`] - Cursor pagination with an append-only page cache
//! - [`CollectionFetch`] - The fetch seam it runs over
//!
//! ### Install sources (`install_source`)
//! - [`InstallSourceMap`] - App UUID → install-source record persistence

pub mod client;
pub mod install_source;
pub mod models;
pub mod pager;
pub mod registry;

pub use client::{StoreClient, DEFAULT_USER_AGENT};
pub use install_source::{InstallSourceMap, InstallSourceRecord};
pub use models::{
    default_sources, parse_store_date, AlgoliaData, AppstoreApp, AppstoreCollectionPage,
    AppstoreSource, HomeDocument,
};
pub use pager::{CollectionFetch, CollectionPager, LocalCollectionFetch};
pub use registry::SourceRegistry;
