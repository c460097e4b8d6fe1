//! The dependency container
//!
//! Each key moves through `Empty -> InProgress -> Resolved`. The in-progress
//! marker records the constructing thread: meeting it again on the same
//! thread is a cycle, meeting it on another thread means waiting for that
//! construction to settle. The store lock is never held while a construction
//! rule runs, so rules are free to resolve other keys.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::builder::ContainerBuilder;
use crate::config::ContainerConfig;
use crate::error::{DIError, DIResult};
use crate::factory::{ErasedValue, Factories};
use crate::key::{Dependency, DependencyKey};

/// A type-erased value together with the name of its concrete type
#[derive(Clone)]
pub(crate) struct Instance {
    value: ErasedValue,
    type_name: &'static str,
}

impl Instance {
    pub(crate) fn new<K: Dependency>(value: Arc<K::Value>) -> Self {
        Self {
            value,
            type_name: type_name::<K::Value>(),
        }
    }

    fn erased(value: ErasedValue, type_name: &'static str) -> Self {
        Self { value, type_name }
    }

    pub(crate) fn downcast<K: Dependency>(&self, key: DependencyKey) -> DIResult<Arc<K::Value>> {
        self.value
            .clone()
            .downcast::<K::Value>()
            .map_err(|_| DIError::TypeMismatch {
                key,
                expected: type_name::<K::Value>(),
                actual: self.type_name,
            })
    }
}

enum Cell {
    InProgress { owner: ThreadId },
    Resolved(Instance),
}

#[derive(Default)]
struct Store {
    cells: HashMap<DependencyKey, Cell>,
    /// Keys currently under construction, per thread, outermost first
    chains: HashMap<ThreadId, Vec<DependencyKey>>,
    /// Key each blocked thread is waiting on
    waiting: HashMap<ThreadId, DependencyKey>,
}

impl Store {
    fn chain(&self, thread: ThreadId) -> &[DependencyKey] {
        self.chains.get(&thread).map(Vec::as_slice).unwrap_or(&[])
    }

    fn pop_chain(&mut self, thread: ThreadId) {
        if let Some(chain) = self.chains.get_mut(&thread) {
            chain.pop();
            if chain.is_empty() {
                self.chains.remove(&thread);
            }
        }
    }

    /// The thread's chain starting at the first occurrence of `key`.
    fn chain_from(&self, thread: ThreadId, key: DependencyKey) -> &[DependencyKey] {
        let chain = self.chain(thread);
        let start = chain.iter().position(|k| *k == key).unwrap_or(0);
        &chain[start..]
    }

    /// The thread's chain from the first occurrence of `key`, closed by `key`.
    fn cycle_path(&self, thread: ThreadId, key: DependencyKey) -> Vec<DependencyKey> {
        let mut path = self.chain_from(thread, key).to_vec();
        path.push(key);
        path
    }

    /// The loop closed by `thread` blocking on `key`, if any.
    ///
    /// Follows wait-for edges from the owner of `key` until they lead back to
    /// a key `thread` is constructing. The path starts and ends at that key
    /// and passes through each owner's chain in between.
    fn wait_cycle(&self, thread: ThreadId, key: DependencyKey) -> Option<Vec<DependencyKey>> {
        let mut hops = Vec::new();
        let mut current = key;
        for _ in 0..=self.waiting.len() {
            let owner = match self.cells.get(&current) {
                Some(Cell::InProgress { owner }) => *owner,
                _ => return None,
            };
            if owner == thread {
                let mut path = self.chain_from(thread, current).to_vec();
                for (hop_owner, hop_key) in hops {
                    path.extend_from_slice(self.chain_from(hop_owner, hop_key));
                }
                path.push(current);
                return Some(path);
            }
            hops.push((owner, current));
            current = *self.waiting.get(&owner)?;
        }
        None
    }
}

/// Lazily constructs, memoizes and hands out dependencies.
///
/// Construction rules come from a shared [`Factories`] set; values seeded
/// through a [`ContainerBuilder`] (or [`Container::seed`]) take precedence
/// and their rules never run.
pub struct Container {
    factories: Arc<Factories>,
    config: ContainerConfig,
    store: Mutex<Store>,
    settled: Condvar,
}

impl Container {
    /// Create a container with no overrides and the default configuration
    pub fn new(factories: impl Into<Arc<Factories>>) -> Self {
        ContainerBuilder::new(factories).build()
    }

    /// Start a builder for seeding overrides or setting the configuration
    pub fn builder(factories: impl Into<Arc<Factories>>) -> ContainerBuilder {
        ContainerBuilder::new(factories)
    }

    /// Create a container after running `setup` against its builder.
    ///
    /// ```rust
    /// use lazywire_di::{dependency, Container, Factories};
    ///
    /// dependency! {
    ///     Endpoint: String;
    /// }
    ///
    /// let mut factories = Factories::new();
    /// factories.provide::<Endpoint, _>(|_| Ok("https://prod.example".to_string()));
    ///
    /// let container = Container::with_overrides(factories, |builder| {
    ///     builder.seed::<Endpoint>("http://localhost:8080".to_string())?;
    ///     Ok(())
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(*container.resolve::<Endpoint>().unwrap(), "http://localhost:8080");
    /// ```
    pub fn with_overrides<F>(factories: impl Into<Arc<Factories>>, setup: F) -> DIResult<Self>
    where
        F: FnOnce(&mut ContainerBuilder) -> DIResult<()>,
    {
        let mut builder = ContainerBuilder::new(factories);
        setup(&mut builder)?;
        Ok(builder.build())
    }

    pub(crate) fn from_parts(
        factories: Arc<Factories>,
        config: ContainerConfig,
        seeded: HashMap<DependencyKey, Instance>,
    ) -> Self {
        let cells = seeded
            .into_iter()
            .map(|(key, instance)| (key, Cell::Resolved(instance)))
            .collect();

        Self {
            factories,
            config,
            store: Mutex::new(Store {
                cells,
                ..Store::default()
            }),
            settled: Condvar::new(),
        }
    }

    /// Resolve the value for `K`, constructing it on first access.
    ///
    /// Every later call returns the same `Arc`. A rule that resolves, directly
    /// or transitively, its own key fails with [`DIError::DependencyCycle`].
    pub fn resolve<K: Dependency>(&self) -> DIResult<Arc<K::Value>> {
        let key = DependencyKey::of::<K>();
        let thread = thread::current().id();
        let mut store = self.store.lock();

        loop {
            let owner = match store.cells.get(&key) {
                Some(Cell::Resolved(instance)) => {
                    trace!("Resolved {} from store", key);
                    return instance.downcast::<K>(key);
                }
                Some(Cell::InProgress { owner }) => *owner,
                None => break,
            };

            if owner == thread {
                let path = store.cycle_path(thread, key);
                return Err(DIError::DependencyCycle { key, path });
            }
            if let Some(path) = store.wait_cycle(thread, key) {
                return Err(DIError::DependencyCycle { key, path });
            }

            trace!("Waiting for another thread to construct {}", key);
            store.waiting.insert(thread, key);
            self.settled.wait(&mut store);
            store.waiting.remove(&thread);
        }

        let descriptor = self
            .factories
            .descriptor(&key)
            .ok_or(DIError::UnregisteredDependency { key })?;

        let limit = self.config.max_resolution_depth;
        if store.chain(thread).len() >= limit {
            return Err(DIError::DepthLimitExceeded { key, limit });
        }

        store.cells.insert(key, Cell::InProgress { owner: thread });
        store.chains.entry(thread).or_default().push(key);
        drop(store);

        debug!("Constructing {}", key);
        let construction = Construction {
            container: self,
            key,
            thread,
            finished: false,
        };
        let value = descriptor.construct(self)?;
        let instance = Instance::erased(value, descriptor.value_type);
        let resolved = instance.downcast::<K>(key);
        construction.finish(instance);
        resolved
    }

    /// Resolve `K`, panicking if the container is miswired.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error's message on any failure.
    pub fn require<K: Dependency>(&self) -> Arc<K::Value> {
        match self.resolve::<K>() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Return the value for `K` only if it is already resolved or seeded
    pub fn peek<K: Dependency>(&self) -> Option<Arc<K::Value>> {
        let key = DependencyKey::of::<K>();
        match self.store.lock().cells.get(&key) {
            Some(Cell::Resolved(instance)) => instance.downcast::<K>(key).ok(),
            _ => None,
        }
    }

    /// Seed a value for `K` into the live container.
    ///
    /// Fails with [`DIError::AlreadyInitialized`] if `K` was seeded before or
    /// its resolution has started, and with [`DIError::Sealed`] when late
    /// seeding is disabled in the configuration.
    pub fn seed<K: Dependency>(&self, value: K::Value) -> DIResult<()> {
        self.seed_shared::<K>(Arc::new(value))
    }

    /// Seed an already shared value for `K`
    pub fn seed_shared<K: Dependency>(&self, value: Arc<K::Value>) -> DIResult<()> {
        let key = DependencyKey::of::<K>();
        if !self.config.allow_late_seeding {
            return Err(DIError::Sealed { key });
        }

        let mut store = self.store.lock();
        if store.cells.contains_key(&key) {
            return Err(DIError::AlreadyInitialized { key });
        }
        store.cells.insert(key, Cell::Resolved(Instance::new::<K>(value)));
        drop(store);

        debug!("Seeded {} into live container", key);
        Ok(())
    }

    /// Check if `K` holds a resolved or seeded value
    pub fn is_resolved<K: Dependency>(&self) -> bool {
        let key = DependencyKey::of::<K>();
        matches!(self.store.lock().cells.get(&key), Some(Cell::Resolved(_)))
    }

    /// Check if a construction rule is registered for `K`
    pub fn is_registered<K: Dependency>(&self) -> bool {
        self.factories.is_registered::<K>()
    }

    /// Get the number of resolved or seeded values
    pub fn resolved_count(&self) -> usize {
        self.store
            .lock()
            .cells
            .values()
            .filter(|cell| matches!(cell, Cell::Resolved(_)))
            .count()
    }

    /// Get the shared factory set this container resolves against
    pub fn factories(&self) -> &Arc<Factories> {
        &self.factories
    }

    /// Get the configuration the container was built with
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.factories.len())
            .field("resolved", &self.resolved_count())
            .field("config", &self.config)
            .finish()
    }
}

/// An in-flight construction.
///
/// Dropping it without calling [`Construction::finish`] (the rule failed or
/// panicked) clears the in-progress marker and wakes waiting threads.
struct Construction<'a> {
    container: &'a Container,
    key: DependencyKey,
    thread: ThreadId,
    finished: bool,
}

impl Construction<'_> {
    fn finish(mut self, instance: Instance) {
        self.finished = true;
        let container = self.container;
        {
            let mut store = container.store.lock();
            store.cells.insert(self.key, Cell::Resolved(instance));
            store.pop_chain(self.thread);
        }
        container.settled.notify_all();
        debug!("Constructed {}", self.key);
    }
}

impl Drop for Construction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        {
            let mut store = self.container.store.lock();
            store.cells.remove(&self.key);
            store.pop_chain(self.thread);
        }
        self.container.settled.notify_all();
        warn!("Abandoned construction of {}", self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    crate::dependency! {
        Name: String;
        Greeting: String;
        Left: u8;
        Right: u8;
        Missing: u8;
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_container_is_send_sync() {
        assert_send_sync::<Container>();
    }

    #[test]
    fn test_memoizes_constructed_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut factories = Factories::new();
        factories.provide::<Name, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("rice".to_string())
        });

        let container = Container::new(factories);
        let first = container.resolve::<Name>().unwrap();
        let second = container.resolve::<Name>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nested_resolution() {
        let mut factories = Factories::new();
        factories
            .provide::<Name, _>(|_| Ok("world".to_string()))
            .provide::<Greeting, _>(|c| Ok(format!("hello {}", c.resolve::<Name>()?)));

        let container = Container::new(factories);
        assert_eq!(*container.resolve::<Greeting>().unwrap(), "hello world");
        assert!(container.is_resolved::<Name>());
    }

    #[test]
    fn test_cycle_reports_path() {
        let mut factories = Factories::new();
        factories
            .provide::<Left, _>(|c| Ok(*c.resolve::<Right>()? + 1))
            .provide::<Right, _>(|c| Ok(*c.resolve::<Left>()? + 1));

        let container = Container::new(factories);
        match container.resolve::<Left>() {
            Err(DIError::DependencyCycle { key, path }) => {
                assert_eq!(key, DependencyKey::of::<Left>());
                let names: Vec<_> = path.iter().map(|k| k.name()).collect();
                assert_eq!(names, vec!["Left", "Right", "Left"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
        assert!(!container.is_resolved::<Left>());
        assert!(!container.is_resolved::<Right>());
    }

    fn spawned_thread_id() -> ThreadId {
        thread::spawn(|| thread::current().id()).join().unwrap()
    }

    #[test]
    fn test_wait_cycle_path_spans_threads() {
        let here = thread::current().id();
        let other = spawned_thread_id();
        let left = DependencyKey::of::<Left>();
        let right = DependencyKey::of::<Right>();
        let name = DependencyKey::of::<Name>();

        // `other` builds Name then Left and waits on Right; `here` builds Right
        let mut store = Store::default();
        store.cells.insert(name, Cell::InProgress { owner: other });
        store.cells.insert(left, Cell::InProgress { owner: other });
        store.cells.insert(right, Cell::InProgress { owner: here });
        store.chains.insert(other, vec![name, left]);
        store.chains.insert(here, vec![right]);
        store.waiting.insert(other, right);

        let path = store.wait_cycle(here, left).unwrap();
        let names: Vec<_> = path.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["Right", "Left", "Right"]);

        // Without the wait edge there is nothing to close
        store.waiting.clear();
        assert!(store.wait_cycle(here, left).is_none());
    }

    #[test]
    fn test_abandoned_construction_resets_key() {
        let mut factories = Factories::new();
        factories.provide::<Name, _>(|_| {
            Err(DIError::construction::<Name>(anyhow::anyhow!("not ready")))
        });

        let container = Container::new(factories);
        for _ in 0..2 {
            let err = container.resolve::<Name>().unwrap_err();
            assert!(matches!(err, DIError::ConstructionFailed { .. }));
        }
        let store = container.store.lock();
        assert!(store.cells.is_empty());
        assert!(store.chains.is_empty());
    }

    #[test]
    fn test_unregistered_leaves_store_untouched() {
        let container = Container::new(Factories::new());
        let err = container.resolve::<Missing>().unwrap_err();
        assert!(matches!(err, DIError::UnregisteredDependency { .. }));
        assert_eq!(container.resolved_count(), 0);
    }

    #[test]
    fn test_peek_does_not_construct() {
        let mut factories = Factories::new();
        factories.provide_value::<Left>(3);

        let container = Container::new(factories);
        assert!(container.peek::<Left>().is_none());
        container.resolve::<Left>().unwrap();
        assert_eq!(container.peek::<Left>().as_deref(), Some(&3));
    }

    #[test]
    fn test_type_mismatch_reports_both_types() {
        let instance = Instance::erased(Arc::new(7u64), "u64");
        let err = instance
            .downcast::<Left>(DependencyKey::of::<Left>())
            .unwrap_err();
        match err {
            DIError::TypeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "u8");
                assert_eq!(actual, "u64");
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }
}
