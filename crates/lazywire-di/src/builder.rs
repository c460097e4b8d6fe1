//! Construction-time override collector

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ContainerConfig;
use crate::container::{Container, Instance};
use crate::error::{DIError, DIResult};
use crate::factory::Factories;
use crate::key::{Dependency, DependencyKey};

/// Builder pattern for configuring a container before first use.
///
/// Seeded values become resolved cells in the built container, so their
/// construction rules never run. Nothing is constructed while building.
pub struct ContainerBuilder {
    factories: Arc<Factories>,
    config: ContainerConfig,
    overrides: HashMap<DependencyKey, Instance>,
}

impl ContainerBuilder {
    /// Create a new builder over the given factory set
    pub fn new(factories: impl Into<Arc<Factories>>) -> Self {
        Self {
            factories: factories.into(),
            config: ContainerConfig::default(),
            overrides: HashMap::new(),
        }
    }

    /// Use `config` for the built container.
    ///
    /// The config is validated here, so a zero `max_resolution_depth` fails
    /// with [`DIError::Config`] before any container exists.
    pub fn with_config(mut self, config: ContainerConfig) -> DIResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Stage `value` as the override for `K`.
    ///
    /// Staging the same key twice fails with [`DIError::AlreadyInitialized`]
    /// and keeps the first value.
    pub fn seed<K: Dependency>(&mut self, value: K::Value) -> DIResult<&mut Self> {
        self.seed_shared::<K>(Arc::new(value))
    }

    /// Stage an already shared value as the override for `K`
    pub fn seed_shared<K: Dependency>(&mut self, value: Arc<K::Value>) -> DIResult<&mut Self> {
        let key = DependencyKey::of::<K>();
        if self.overrides.contains_key(&key) {
            return Err(DIError::AlreadyInitialized { key });
        }

        self.overrides.insert(key, Instance::new::<K>(value));
        debug!("Staged override for {}", key);
        Ok(self)
    }

    /// The value staged for `K` so far, if any
    pub fn staged<K: Dependency>(&self) -> Option<Arc<K::Value>> {
        let key = DependencyKey::of::<K>();
        self.overrides
            .get(&key)
            .and_then(|instance| instance.downcast::<K>(key).ok())
    }

    /// Check if an override is staged for `K`
    pub fn is_staged<K: Dependency>(&self) -> bool {
        self.overrides.contains_key(&DependencyKey::of::<K>())
    }

    /// Get the number of staged overrides
    pub fn staged_count(&self) -> usize {
        self.overrides.len()
    }

    /// Get the configuration the container will be built with
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Build the container
    pub fn build(self) -> Container {
        info!(
            "Built container with {} construction rules and {} overrides",
            self.factories.len(),
            self.overrides.len()
        );
        Container::from_parts(self.factories, self.config, self.overrides)
    }
}
