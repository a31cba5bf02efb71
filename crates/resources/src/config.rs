use std::path::{Path, PathBuf};

/// What happens to an import when one of its dependencies fails to load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyPolicy {
    /// Failed dependency is handed to the importer as missing.
    /// Importer decides whether it is fatal.
    #[default]
    BestEffort,

    /// Any failed dependency fails the import with the dependency's error.
    Strict,
}

/// Configuration of [`Database`](crate::Database).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DatabaseConfig {
    pub dependencies: DependencyPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}'. {error}")]
    ReadError {
        error: std::io::Error,
        path: PathBuf,
    },

    #[error("Failed to write config file '{path}'. {error}")]
    WriteError {
        error: std::io::Error,
        path: PathBuf,
    },

    #[error("Failed to deserialize config file '{path}'. {error}")]
    DeserializeError {
        error: toml::de::Error,
        path: PathBuf,
    },

    #[error("Failed to serialize config file '{path}'. {error}")]
    SerializeError {
        error: toml::ser::Error,
        path: PathBuf,
    },
}

impl DatabaseConfig {
    pub fn strict() -> Self {
        DatabaseConfig {
            dependencies: DependencyPolicy::Strict,
        }
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|error| ConfigError::ReadError {
            error,
            path: path.to_owned(),
        })?;
        let config = toml::from_str(&data).map_err(|error| ConfigError::DeserializeError {
            error,
            path: path.to_owned(),
        })?;
        Ok(config)
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let data =
            toml::to_string_pretty(self).map_err(|error| ConfigError::SerializeError {
                error,
                path: path.to_owned(),
            })?;
        std::fs::write(path, data).map_err(|error| ConfigError::WriteError {
            error,
            path: path.to_owned(),
        })?;
        Ok(())
    }
}
