//! Lazy dependency container for lazywire
//!
//! This crate provides a typed container that constructs each dependency on
//! first access, memoizes it for the container's lifetime, and detects
//! construction cycles. Values can be seeded before first use to bypass
//! their construction rules.
//!
//! ## Quick Start
//!
//! ```rust
//! use lazywire_di::{dependency, Container, Factories};
//!
//! dependency! {
//!     UserName: String;
//!     Greeting: String;
//! }
//!
//! let mut factories = Factories::new();
//! factories
//!     .provide::<UserName, _>(|_| Ok("world".to_string()))
//!     .provide::<Greeting, _>(|c| Ok(format!("hello {}", c.resolve::<UserName>()?)));
//!
//! let container = Container::new(factories);
//! assert_eq!(*container.resolve::<Greeting>().unwrap(), "hello world");
//! ```
//!
//! See [`usage`] module for detailed usage examples.

pub mod builder;
pub mod config;
pub mod container;
pub mod error;
pub mod factory;
pub mod key;
pub mod provider;
pub mod usage;

pub use builder::ContainerBuilder;
pub use self::config::ContainerConfig;
pub use container::Container;
pub use error::{DIError, DIResult};
pub use factory::Factories;
pub use key::{Dependency, DependencyKey};
pub use provider::{FactoryModule, ModuleRegistry};

/// Convenience macro for resolving a dependency
#[macro_export]
macro_rules! resolve {
    ($container:expr, $key:ty) => {
        $container.resolve::<$key>()
    };
}
