//! Engine assembly

use std::sync::Arc;

use chrono::{DateTime, Utc};
use paws_core::{Error, RegionContext, Result};

use crate::config::EngineConfig;
use crate::ports::{ClutterLookup, DeviceAuthority, NotificationSink, PropagationService, RegistryStore};
use crate::sequence::SequenceGenerator;

/// The spectrum availability and incumbent-protection engine.
///
/// Cheap to clone; every collaborator is shared behind an `Arc`. Operations
/// are split across `workflow` (incumbent registration and exclusions),
/// `handlers` (PAWS device requests) and `interference` (operator reports).
#[derive(Clone)]
pub struct PawsEngine {
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) store: Arc<dyn RegistryStore>,
    pub(crate) propagation: Arc<dyn PropagationService>,
    pub(crate) clutter: Arc<dyn ClutterLookup>,
    pub(crate) authority: Arc<dyn DeviceAuthority>,
    pub(crate) sink: Arc<dyn NotificationSink>,
    pub(crate) sequences: SequenceGenerator,
}

impl PawsEngine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        &self.store
    }

    /// Region context for a request arriving now
    pub fn context(&self) -> RegionContext {
        self.config.context()
    }

    pub fn context_at(&self, now: DateTime<Utc>) -> RegionContext {
        self.config.context_at(now)
    }
}

/// Builder for [`PawsEngine`]
pub struct EngineBuilder {
    config: EngineConfig,
    store: Option<Arc<dyn RegistryStore>>,
    propagation: Option<Arc<dyn PropagationService>>,
    clutter: Option<Arc<dyn ClutterLookup>>,
    authority: Option<Arc<dyn DeviceAuthority>>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: None,
            propagation: None,
            clutter: None,
            authority: None,
            sink: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn RegistryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn propagation(mut self, propagation: Arc<dyn PropagationService>) -> Self {
        self.propagation = Some(propagation);
        self
    }

    pub fn clutter(mut self, clutter: Arc<dyn ClutterLookup>) -> Self {
        self.clutter = Some(clutter);
        self
    }

    pub fn authority(mut self, authority: Arc<dyn DeviceAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<PawsEngine> {
        fn missing(name: &str) -> Error {
            Error::Internal(format!("{name} not configured"))
        }

        let store = self.store.ok_or_else(|| missing("registry store"))?;
        Ok(PawsEngine {
            config: Arc::new(self.config),
            sequences: SequenceGenerator::new(store.clone()),
            store,
            propagation: self.propagation.ok_or_else(|| missing("propagation service"))?,
            clutter: self.clutter.ok_or_else(|| missing("clutter lookup"))?,
            authority: self.authority.ok_or_else(|| missing("device authority"))?,
            sink: self.sink.ok_or_else(|| missing("notification sink"))?,
        })
    }
}
