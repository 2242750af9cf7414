//! Explicit service registry.
//!
//! Long-lived services are constructed through a tag → factory map populated
//! at startup, so lookup is by a stable enum tag instead of runtime type
//! names. Factories receive the resolved [`Settings`].

use std::collections::HashMap;
use std::sync::Arc;

use micropebble_core::prelude::*;
use micropebble_store::{InstallSourceMap, SourceRegistry, StoreClient};

use crate::crash::CrashReporter;
use crate::settings::Settings;

/// Stable tag identifying a constructible service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    SourceRegistry,
    InstallSourceMap,
    StoreClient,
    CrashReporter,
}

/// A constructed service instance.
pub enum Service {
    SourceRegistry(Arc<SourceRegistry>),
    InstallSourceMap(Arc<InstallSourceMap>),
    StoreClient(StoreClient),
    CrashReporter(Arc<CrashReporter>),
}

type Factory = Box<dyn Fn(&Settings) -> Result<Service> + Send + Sync>;

/// Tag-keyed factory map.
pub struct ServiceRegistry {
    factories: HashMap<ServiceKind, Factory>,
}

impl ServiceRegistry {
    /// Registry with the standard factories installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(ServiceKind::SourceRegistry, |settings| {
            Ok(Service::SourceRegistry(Arc::new(SourceRegistry::open(
                settings.sources_path(),
            )?)))
        });
        registry.register(ServiceKind::InstallSourceMap, |settings| {
            Ok(Service::InstallSourceMap(Arc::new(InstallSourceMap::open(
                settings.install_sources_path(),
            ))))
        });
        registry.register(ServiceKind::StoreClient, |settings| {
            Ok(Service::StoreClient(StoreClient::new(
                &settings.store.user_agent,
            )?))
        });
        registry.register(ServiceKind::CrashReporter, |settings| {
            Ok(Service::CrashReporter(CrashReporter::new(
                settings.crash_marker_path(),
            )))
        });
        registry
    }

    /// Install (or override) a factory for a tag.
    pub fn register(
        &mut self,
        kind: ServiceKind,
        factory: impl Fn(&Settings) -> Result<Service> + Send + Sync + 'static,
    ) {
        self.factories.insert(kind, Box::new(factory));
    }

    /// Construct the service registered under `kind`.
    pub fn create(&self, kind: ServiceKind, settings: &Settings) -> Result<Service> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| Error::config(format!("no factory registered for {kind:?}")))?;
        factory(settings)
    }
}
