//! Error types for container wiring and resolution

use std::fmt;

use crate::key::{Dependency, DependencyKey};

/// Errors that can occur while wiring or resolving dependencies
#[derive(Debug, thiserror::Error)]
pub enum DIError {
    #[error("Dependency cycle detected while resolving {key}: {}", ResolutionPath(.path))]
    DependencyCycle {
        key: DependencyKey,
        path: Vec<DependencyKey>,
    },

    #[error("Dependency not registered: {key}")]
    UnregisteredDependency { key: DependencyKey },

    #[error("Dependency type mismatch for {key}: expected {expected}, found {actual}")]
    TypeMismatch {
        key: DependencyKey,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Dependency already initialized: {key}")]
    AlreadyInitialized { key: DependencyKey },

    #[error("Resolution depth limit of {limit} exceeded while resolving {key}")]
    DepthLimitExceeded { key: DependencyKey, limit: usize },

    #[error("Container is sealed, cannot seed {key}")]
    Sealed { key: DependencyKey },

    #[error("Construction of {key} failed: {source}")]
    ConstructionFailed {
        key: DependencyKey,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid container configuration: {0}")]
    Config(#[from] config::ConfigError),
}

pub type DIResult<T> = Result<T, DIError>;

impl DIError {
    /// Wrap a construction rule's own failure for key `K`.
    pub fn construction<K: Dependency>(source: impl Into<anyhow::Error>) -> Self {
        Self::ConstructionFailed {
            key: DependencyKey::of::<K>(),
            source: source.into(),
        }
    }

    /// The key the error is about, if any.
    pub fn key(&self) -> Option<DependencyKey> {
        match self {
            Self::DependencyCycle { key, .. }
            | Self::UnregisteredDependency { key }
            | Self::TypeMismatch { key, .. }
            | Self::AlreadyInitialized { key }
            | Self::DepthLimitExceeded { key, .. }
            | Self::Sealed { key }
            | Self::ConstructionFailed { key, .. } => Some(*key),
            Self::Config(_) => None,
        }
    }

    /// Whether this error is a wiring mistake in the factory set or builder.
    ///
    /// Wiring errors are never transient: retrying the same resolution on the
    /// same container fails the same way.
    pub fn is_wiring_error(&self) -> bool {
        !matches!(self, Self::ConstructionFailed { .. } | Self::Config(_))
    }
}

struct ResolutionPath<'a>(&'a [DependencyKey]);

impl fmt::Display for ResolutionPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}
