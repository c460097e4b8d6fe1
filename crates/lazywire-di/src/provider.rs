//! Factory modules
//!
//! A [`FactoryModule`] groups the construction rules of one subsystem so an
//! application can assemble its [`Factories`] from independent parts.
//!
//! ```rust
//! use lazywire_di::{dependency, Factories, FactoryModule, ModuleRegistry};
//!
//! dependency! {
//!     DatabaseUrl: String;
//! }
//!
//! struct StorageModule;
//!
//! impl FactoryModule for StorageModule {
//!     fn name(&self) -> &'static str {
//!         "storage"
//!     }
//!
//!     fn register(&self, factories: &mut Factories) {
//!         factories.provide_value::<DatabaseUrl>("sqlite::memory:".to_string());
//!     }
//! }
//!
//! let mut registry = ModuleRegistry::new();
//! registry.add(StorageModule);
//! let factories = registry.into_factories();
//! assert!(factories.is_registered::<DatabaseUrl>());
//! ```

use std::sync::Arc;

use crate::factory::Factories;

// ============================================================================
// FactoryModule Trait
// ============================================================================

/// A named group of construction rules.
pub trait FactoryModule: Send + Sync {
    /// Returns the name of this module.
    ///
    /// Used for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Returns the priority of this module.
    ///
    /// Lower values are installed first. Default is 100. A module installed
    /// later replaces rules an earlier module registered for the same key.
    fn priority(&self) -> u32 {
        100
    }

    /// Register this module's construction rules.
    fn register(&self, factories: &mut Factories);
}

// ============================================================================
// ModuleRegistry
// ============================================================================

/// Registry for assembling a factory set from modules.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn FactoryModule>>,
}

impl ModuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the registry.
    pub fn add<M: FactoryModule + 'static>(&mut self, module: M) -> &mut Self {
        self.modules.push(Arc::new(module));
        self
    }

    /// Add a shared module to the registry.
    pub fn add_shared(&mut self, module: Arc<dyn FactoryModule>) -> &mut Self {
        self.modules.push(module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// List all module names in the order they were added.
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Install every module into `factories`, ordered by priority.
    ///
    /// Modules with equal priority keep the order they were added in.
    pub fn install_all(&self, factories: &mut Factories) {
        let mut sorted: Vec<_> = self.modules.iter().collect();
        sorted.sort_by_key(|m| m.priority());

        tracing::info!("Installing {} factory modules", sorted.len());

        for module in sorted {
            tracing::debug!(
                "Installing module '{}' (priority: {})",
                module.name(),
                module.priority()
            );
            module.register(factories);
        }

        tracing::info!("Factory set holds {} construction rules", factories.len());
    }

    /// Install every module into a fresh factory set.
    pub fn into_factories(&self) -> Factories {
        let mut factories = Factories::new();
        self.install_all(&mut factories);
        factories
    }
}
