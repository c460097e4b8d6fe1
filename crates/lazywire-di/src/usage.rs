//! # lazywire Container Usage Guide
//!
//! The container wires an application's long-lived objects without a global
//! registry: declare keys, describe how to build each one, then ask for them.
//!
//! ## Declaring Keys
//!
//! A key is a marker type naming a slot and its value type. Two keys with the
//! same value type are separate slots.
//!
//! ```rust
//! lazywire_di::dependency! {
//!     /// Connection string for the primary database
//!     pub PrimaryDsn: String;
//!     /// Connection string for the read replica
//!     pub ReplicaDsn: String;
//! }
//! ```
//!
//! ## Registering Construction Rules
//!
//! Rules receive the container, so they can resolve what they depend on.
//! Nothing runs until the first `resolve`.
//!
//! ```rust
//! use std::sync::Arc;
//! use lazywire_di::{dependency, Container, Factories};
//!
//! struct Pool {
//!     dsn: String,
//! }
//!
//! struct Repository {
//!     pool: Arc<Pool>,
//! }
//!
//! dependency! {
//!     Dsn: String;
//!     SharedPool: Pool;
//!     Repo: Repository;
//! }
//!
//! let mut factories = Factories::new();
//! factories
//!     .provide_value::<Dsn>("postgres://localhost/app".to_string())
//!     .provide::<SharedPool, _>(|c| Ok(Pool { dsn: c.resolve::<Dsn>()?.to_string() }))
//!     .provide::<Repo, _>(|c| Ok(Repository { pool: c.resolve::<SharedPool>()? }));
//!
//! let container = Container::new(factories);
//! let repo = container.resolve::<Repo>().unwrap();
//! let pool = container.resolve::<SharedPool>().unwrap();
//!
//! // The pool was built once and shared
//! assert!(Arc::ptr_eq(&repo.pool, &pool));
//! assert_eq!(pool.dsn, "postgres://localhost/app");
//! ```
//!
//! ## Overriding Dependencies
//!
//! Seeded values win over construction rules; the rule never runs. This is
//! the usual way to swap in fakes for tests.
//!
//! ```rust
//! use lazywire_di::{dependency, Container, ContainerBuilder, Factories};
//!
//! dependency! {
//!     Clock: u64;
//! }
//!
//! let mut factories = Factories::new();
//! factories.provide::<Clock, _>(|_| Ok(1_700_000_000));
//!
//! let mut builder = ContainerBuilder::new(factories);
//! if !builder.is_staged::<Clock>() {
//!     builder.seed::<Clock>(42).unwrap();
//! }
//! let container = builder.build();
//!
//! assert_eq!(*container.resolve::<Clock>().unwrap(), 42);
//! ```
//!
//! ## Failing Construction
//!
//! A rule reports its own failure with
//! [`DIError::construction`](crate::DIError::construction). Errors from nested
//! resolutions pass through `?` untouched, so a cycle deep in the graph still
//! surfaces as [`DIError::DependencyCycle`](crate::DIError::DependencyCycle).
//!
//! ```rust
//! use lazywire_di::{dependency, Container, DIError, Factories};
//!
//! dependency! {
//!     Port: u16;
//! }
//!
//! let mut factories = Factories::new();
//! factories.provide::<Port, _>(|_| {
//!     "eighty".parse::<u16>().map_err(DIError::construction::<Port>)
//! });
//!
//! let container = Container::new(factories);
//! let err = container.resolve::<Port>().unwrap_err();
//! assert!(matches!(err, DIError::ConstructionFailed { .. }));
//! ```
//!
//! ## Sharing a Factory Set
//!
//! The factory set is read-only once built. Wrap it in an `Arc` to create
//! several independent containers, each with its own store.
//!
//! ```rust
//! use std::sync::Arc;
//! use lazywire_di::{dependency, Container, Factories};
//!
//! dependency! {
//!     Session: Vec<String>;
//! }
//!
//! let mut factories = Factories::new();
//! factories.provide::<Session, _>(|_| Ok(Vec::new()));
//! let factories = Arc::new(factories);
//!
//! let first = Container::new(Arc::clone(&factories));
//! let second = Container::new(factories);
//! assert!(!Arc::ptr_eq(
//!     &first.resolve::<Session>().unwrap(),
//!     &second.resolve::<Session>().unwrap(),
//! ));
//! ```
//!
//! ## Configuration
//!
//! [`ContainerConfig`](crate::ContainerConfig) is loaded from an optional
//! TOML file and `LAZYWIRE_*` environment variables:
//!
//! ```toml
//! max_resolution_depth = 64
//! allow_late_seeding = false
//! ```
//!
//! ```rust,no_run
//! use lazywire_di::{Container, ContainerConfig, Factories};
//!
//! let config = ContainerConfig::load(Some("lazywire.toml".as_ref())).unwrap();
//! let container = Container::builder(Factories::new())
//!     .with_config(config)
//!     .unwrap()
//!     .build();
//! ```
