//! File system backed catalogue and provider.
//!
//! Files under a root directory are catalogued with ids kept in
//! per-directory sidecar files. Provider opens the same files as streams,
//! picking up `<file>.options` as the options stream.

use std::path::PathBuf;

mod catalogue;
mod provider;
mod sidecar;

pub use self::{
    catalogue::FileCatalogue,
    provider::FileProvider,
    sidecar::{OPTIONS_EXTENSION, SIDECAR_NAME},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to canonicalize path '{path}'. {error}")]
    CanonError {
        #[source]
        error: std::io::Error,
        path: PathBuf,
    },

    #[error("Failed to read directory '{path}'. {error}")]
    ReadDirError {
        #[source]
        error: std::io::Error,
        path: PathBuf,
    },

    #[error("Failed to read sidecar '{path}'. {error}")]
    ReadError {
        #[source]
        error: std::io::Error,
        path: PathBuf,
    },

    #[error("Failed to write sidecar '{path}'. {error}")]
    WriteError {
        #[source]
        error: std::io::Error,
        path: PathBuf,
    },

    #[error("Failed to serialize sidecar '{path}'. {error}")]
    SerializeError {
        #[source]
        error: toml::ser::Error,
        path: PathBuf,
    },

    #[error("'{path}' is not a file")]
    NotAFile { path: PathBuf },

    #[error("'{path}' cannot be catalogued")]
    NotCatalogued { path: String },

    #[error("'{path}' points outside of catalogue root")]
    OutsideOfRoot { path: String },
}
