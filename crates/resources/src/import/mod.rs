//! Contains everything that is required to write resource importers.
//!
//! # Usage
//!
//! ```
//! use arcana_resources::{
//!     import::{DependencyScope, Importer},
//!     ImportError, Location, Resource, ResourceType, Streams,
//! };
//!
//! struct Text(String);
//!
//! struct TextImporter;
//!
//! impl Importer for TextImporter {
//!     type Raw = String;
//!
//!     fn can_import(&self, _location: &Location, ty: ResourceType) -> bool {
//!         ty.is::<Text>()
//!     }
//!
//!     fn raw_import(&self, streams: &mut Streams) -> Result<String, ImportError> {
//!         let bytes = streams.read_primary().map_err(ImportError::other)?;
//!         String::from_utf8(bytes).map_err(ImportError::corrupted)
//!     }
//!
//!     fn import_partially(&self, raw: &String) -> Result<Resource, ImportError> {
//!         Ok(Resource::new(Text(raw.clone())))
//!     }
//! }
//! ```

mod dependencies;
mod importer;

pub(crate) use self::importer::{AnyImporter, Importers};

pub use self::{
    dependencies::{DependencyDescriptor, DependencyRef, DependencyScope, ResolvedDependencies},
    importer::{Importer, ImporterId},
};
