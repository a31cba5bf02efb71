use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::id::ResourceId;

use super::StoreError;

/// Name of the sidecar file placed in every catalogued directory.
pub const SIDECAR_NAME: &str = ".resources.toml";

/// Extension of side-channel option files.
pub const OPTIONS_EXTENSION: &str = "options";

/// Per-directory mapping of file name to resource id.
///
/// Stored as flat TOML table.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Sidecar {
    pub entries: BTreeMap<String, ResourceId>,
}

/// Result of reading a sidecar.
pub(crate) enum SidecarState {
    Missing,
    Corrupted(toml::de::Error),
    Valid(Sidecar),
}

impl Sidecar {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(SIDECAR_NAME)
    }

    pub fn read(dir: &Path) -> Result<SidecarState, StoreError> {
        let path = Sidecar::path(dir);

        match std::fs::read_to_string(&path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SidecarState::Missing),
            Err(error) => Err(StoreError::ReadError { error, path }),
            Ok(data) => match toml::from_str(&data) {
                Err(error) => Ok(SidecarState::Corrupted(error)),
                Ok(entries) => Ok(SidecarState::Valid(Sidecar { entries })),
            },
        }
    }

    pub fn write(&self, dir: &Path) -> Result<(), StoreError> {
        let path = Sidecar::path(dir);

        let data = toml::to_string_pretty(&self.entries).map_err(|error| {
            StoreError::SerializeError {
                error,
                path: path.clone(),
            }
        })?;

        std::fs::write(&path, data.as_bytes()).map_err(|error| StoreError::WriteError { error, path })
    }
}

/// Checks if file takes part in cataloguing.
/// Hidden files, sidecars and option files never get ids.
pub(crate) fn is_catalogued_name(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }

    match Path::new(name).extension() {
        Some(ext) => ext != OPTIONS_EXTENSION,
        None => true,
    }
}
