//! Container configuration
//!
//! Layered the usual way: built-in defaults, then an optional TOML file,
//! then `LAZYWIRE_*` environment variables.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{DIError, DIResult};

/// Tuning knobs for a [`Container`](crate::Container)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Maximum nesting of constructions on a single thread
    pub max_resolution_depth: usize,
    /// Whether [`Container::seed`](crate::Container::seed) is allowed after build
    pub allow_late_seeding: bool,
}

impl ContainerConfig {
    pub const ENV_PREFIX: &'static str = "LAZYWIRE";

    /// Load configuration from defaults, `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> DIResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DIResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(DIError::Config(ConfigError::Message(
                "max_resolution_depth must be greater than 0".to_string(),
            )));
        }
        Ok(())
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: 128,
            allow_late_seeding: true,
        }
    }
}
