//! Factory descriptor set
//!
//! [`Factories`] holds exactly one construction rule per dependency slot. The
//! set is built up front, then shared read-only by every container created
//! from it.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::container::Container;
use crate::error::DIResult;
use crate::key::{Dependency, DependencyKey};

pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

type ErasedFactory = Box<dyn Fn(&Container) -> DIResult<ErasedValue> + Send + Sync>;

/// A registered construction rule with its value type name
pub(crate) struct FactoryDescriptor {
    construct: ErasedFactory,
    pub(crate) value_type: &'static str,
}

impl FactoryDescriptor {
    pub(crate) fn construct(&self, container: &Container) -> DIResult<ErasedValue> {
        (self.construct)(container)
    }
}

/// The set of construction rules a container resolves against
#[derive(Default)]
pub struct Factories {
    descriptors: HashMap<DependencyKey, FactoryDescriptor>,
}

impl Factories {
    /// Create an empty factory set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the construction rule for `K`.
    ///
    /// The rule receives the container so it can resolve its own
    /// dependencies. Registering `K` again replaces the earlier rule.
    pub fn provide<K, F>(&mut self, factory: F) -> &mut Self
    where
        K: Dependency,
        F: Fn(&Container) -> DIResult<K::Value> + Send + Sync + 'static,
    {
        let key = DependencyKey::of::<K>();
        let descriptor = FactoryDescriptor {
            construct: Box::new(move |container: &Container| -> DIResult<ErasedValue> {
                let value = factory(container)?;
                Ok(Arc::new(value) as ErasedValue)
            }),
            value_type: std::any::type_name::<K::Value>(),
        };

        if self.descriptors.insert(key, descriptor).is_some() {
            warn!("Replaced construction rule for {}", key);
        } else {
            debug!("Registered construction rule for {}", key);
        }
        self
    }

    /// Register a rule that yields a clone of `value` on first resolution
    pub fn provide_value<K>(&mut self, value: K::Value) -> &mut Self
    where
        K: Dependency,
        K::Value: Clone,
    {
        self.provide::<K, _>(move |_| Ok(value.clone()))
    }

    /// Check if a rule is registered for `K`
    pub fn is_registered<K: Dependency>(&self) -> bool {
        self.descriptors.contains_key(&DependencyKey::of::<K>())
    }

    /// Get the number of registered rules
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Keys with a registered rule, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = DependencyKey> + '_ {
        self.descriptors.keys().copied()
    }

    pub(crate) fn descriptor(&self, key: &DependencyKey) -> Option<&FactoryDescriptor> {
        self.descriptors.get(key)
    }
}

impl std::fmt::Debug for Factories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factories")
            .field("keys", &self.descriptors.keys().collect::<Vec<_>>())
            .finish()
    }
}
