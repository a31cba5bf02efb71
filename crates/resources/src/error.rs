use crate::{location::Location, resource::ResourceType};

/// Flat classification of resource loading outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No error.
    None,
    Unknown,
    UnknownProtocol,
    NullResourceType,
    UnmappedResourceGuid,
    UnmappedResourcePath,
    NullResourceStream,
    EmptyResult,
    MissingCatalogue,
    MissingProtocolProvider,
    MissingResourceImporter,
    CorruptedResourceData,
}

impl ErrorKind {
    /// Returns kind of the result.
    /// [`ErrorKind::None`] for `Ok`.
    pub fn of<T>(result: &Result<T, ResourceError>) -> Self {
        match result {
            Ok(_) => ErrorKind::None,
            Err(err) => err.kind(),
        }
    }
}

/// Error of resource loading.
///
/// Errors are values, they are cached per load call
/// and handed out again to every dependent that asks for the same location.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Unexpected failure. {reason}")]
    Unknown { reason: String },

    #[error("No catalogue or provider is registered for protocol '{protocol}'")]
    UnknownProtocol { protocol: String },

    #[error("Resource type '{name}' is not registered")]
    NullResourceType { name: String },

    #[error("Resource id of '{location}' is not present in the catalogue")]
    UnmappedResourceGuid { location: Location },

    #[error("Path '{path}' is not present in the catalogue for protocol '{protocol}'")]
    UnmappedResourcePath { protocol: String, path: String },

    #[error("Provider returned no streams for '{location}' at '{path}'")]
    NullResourceStream { location: Location, path: String },

    #[error("Resource '{location}' is not of requested type '{expected}', found '{found}'")]
    EmptyResult {
        location: Location,
        expected: ResourceType,
        found: ResourceType,
    },

    #[error("No catalogue is registered for protocol '{protocol}'")]
    MissingCatalogue { protocol: String },

    #[error("No provider is registered for protocol '{protocol}'")]
    MissingProtocolProvider { protocol: String },

    #[error("No importer can import '{location}' as '{ty}'")]
    MissingResourceImporter { location: Location, ty: ResourceType },

    #[error("Resource data of '{location}' is corrupted. {reason}")]
    CorruptedResourceData { location: Location, reason: String },
}

impl ResourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResourceError::Unknown { .. } => ErrorKind::Unknown,
            ResourceError::UnknownProtocol { .. } => ErrorKind::UnknownProtocol,
            ResourceError::NullResourceType { .. } => ErrorKind::NullResourceType,
            ResourceError::UnmappedResourceGuid { .. } => ErrorKind::UnmappedResourceGuid,
            ResourceError::UnmappedResourcePath { .. } => ErrorKind::UnmappedResourcePath,
            ResourceError::NullResourceStream { .. } => ErrorKind::NullResourceStream,
            ResourceError::EmptyResult { .. } => ErrorKind::EmptyResult,
            ResourceError::MissingCatalogue { .. } => ErrorKind::MissingCatalogue,
            ResourceError::MissingProtocolProvider { .. } => ErrorKind::MissingProtocolProvider,
            ResourceError::MissingResourceImporter { .. } => ErrorKind::MissingResourceImporter,
            ResourceError::CorruptedResourceData { .. } => ErrorKind::CorruptedResourceData,
        }
    }

    pub(crate) fn from_import(location: &Location, error: ImportError) -> Self {
        match error {
            ImportError::Corrupted { reason } => ResourceError::CorruptedResourceData {
                location: location.clone(),
                reason,
            },
            ImportError::Other { reason } => ResourceError::Unknown {
                reason: format!("Failed to import '{location}'. {reason}"),
            },
        }
    }
}

/// Error reported by importer phases.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ImportError {
    /// Streams do not contain valid data for the importer.
    #[error("Corrupted resource data. {reason}")]
    Corrupted {
        /// Failure reason.
        reason: String,
    },

    /// Importer failed to import the resource.
    #[error("{reason}")]
    Other {
        /// Failure reason.
        reason: String,
    },
}

impl ImportError {
    pub fn corrupted(reason: impl std::fmt::Display) -> Self {
        ImportError::Corrupted {
            reason: reason.to_string(),
        }
    }

    pub fn other(reason: impl std::fmt::Display) -> Self {
        ImportError::Other {
            reason: reason.to_string(),
        }
    }
}

/// Error of exclusive registration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("Catalogue for protocol '{protocol}' is already registered")]
    CatalogueTaken { protocol: String },

    #[error("Provider for protocol '{protocol}' is already registered")]
    ProviderTaken { protocol: String },

    #[error("Resource type name '{name}' is already registered")]
    TypeNameTaken { name: String },

    #[error("Protocol '{protocol}' must be non-empty and must not contain ':'")]
    InvalidProtocol { protocol: String },
}
