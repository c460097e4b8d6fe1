//! Dependency keys
//!
//! A dependency slot is identified by a marker type implementing
//! [`Dependency`]. The marker carries the slot's value type, so every read and
//! write through the container is typed by the key itself. Two markers with
//! the same `Value` are still two distinct slots.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A declared dependency slot.
///
/// Usually declared with the [`dependency!`](crate::dependency) macro:
///
/// ```rust
/// lazywire_di::dependency! {
///     /// Base URL of the backing API
///     pub ApiUrl: String;
/// }
/// ```
pub trait Dependency: 'static {
    /// The type of value stored in this slot.
    type Value: Send + Sync + 'static;

    /// Human-readable name used in logs and errors.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runtime identity of a dependency slot.
///
/// Equality and hashing only consider the marker's `TypeId`; the name is
/// carried for diagnostics.
#[derive(Clone, Copy)]
pub struct DependencyKey {
    id: TypeId,
    name: &'static str,
}

impl DependencyKey {
    pub fn of<K: Dependency>() -> Self {
        Self {
            id: TypeId::of::<K>(),
            name: K::name(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DependencyKey").field(&self.name).finish()
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Declare one or more dependency keys.
///
/// Each entry expands to a unit struct implementing [`Dependency`] with the
/// given value type.
///
/// ```rust
/// use lazywire_di::{dependency, Dependency};
///
/// dependency! {
///     pub Greeting: String;
///     RetryLimit: u32;
/// }
///
/// fn value_name<K: Dependency>() -> &'static str {
///     std::any::type_name::<K::Value>()
/// }
///
/// assert_eq!(value_name::<RetryLimit>(), "u32");
/// ```
#[macro_export]
macro_rules! dependency {
    ($($(#[$meta:meta])* $vis:vis $name:ident : $value:ty;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            $vis struct $name;

            impl $crate::Dependency for $name {
                type Value = $value;

                fn name() -> &'static str {
                    stringify!($name)
                }
            }
        )+
    };
}
