use std::{any::Any, num::NonZeroU64};

use crate::{
    error::ImportError,
    id::make_id,
    location::Location,
    provider::Streams,
    resource::{Resource, ResourceType},
};

use super::{DependencyScope, ResolvedDependencies};

make_id! {
    /// Handle of a registered importer.
    pub ImporterId;
}

/// Trait for an importer.
///
/// Import goes through phases:
///
/// 1. [`Importer::raw_import`] reads streams into importer-private raw object.
/// 2. [`Importer::dependencies`] declares resources the raw object refers to.
/// 3. [`Importer::import_partially`] builds resource object without dependencies.
/// 4. [`Importer::patch_dependencies`] wires resolved dependencies into the object.
///
/// Partial object may be handed out to dependents before it is patched.
/// This is what makes cyclic references possible.
/// Importer never loads dependencies by itself.
pub trait Importer: Send + Sync + 'static {
    /// Intermediate representation produced from streams.
    type Raw: Send + 'static;

    /// Returns name of the importer.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Checks if importer can import resource at location as specified type.
    /// Must be cheap and must not perform I/O.
    fn can_import(&self, location: &Location, ty: ResourceType) -> bool;

    /// Reads streams into raw object.
    fn raw_import(&self, streams: &mut Streams) -> Result<Self::Raw, ImportError>;

    /// Declares dependencies of the raw object.
    fn dependencies(&self, raw: &Self::Raw, scope: &mut DependencyScope) {
        let _ = (raw, scope);
    }

    /// Builds resource object.
    /// Fields that refer to dependencies may be left unset.
    fn import_partially(&self, raw: &Self::Raw) -> Result<Resource, ImportError>;

    /// Wires dependencies into resource object built by [`Importer::import_partially`].
    ///
    /// Dependencies may still be unpatched themselves if they are part of a cycle.
    /// Returning error fails the import.
    fn patch_dependencies(
        &self,
        raw: Self::Raw,
        resource: &Resource,
        dependencies: &ResolvedDependencies,
    ) -> Result<(), ImportError> {
        let _ = (raw, resource, dependencies);
        Ok(())
    }
}

/// Type-erased raw object.
pub(crate) struct RawObject(Box<dyn Any + Send>);

fn foreign_raw(name: &str) -> ImportError {
    ImportError::other(format!("Raw object was not produced by importer '{name}'"))
}

/// Object-safe counterpart of [`Importer`].
pub(crate) trait AnyImporter: Send + Sync {
    fn name(&self) -> &str;
    fn can_import(&self, location: &Location, ty: ResourceType) -> bool;
    fn raw_import(&self, streams: &mut Streams) -> Result<RawObject, ImportError>;
    fn dependencies(&self, raw: &RawObject, scope: &mut DependencyScope);
    fn import_partially(&self, raw: &RawObject) -> Result<Resource, ImportError>;
    fn patch_dependencies(
        &self,
        raw: RawObject,
        resource: &Resource,
        dependencies: &ResolvedDependencies,
    ) -> Result<(), ImportError>;
}

impl<I> AnyImporter for I
where
    I: Importer,
{
    fn name(&self) -> &str {
        Importer::name(self)
    }

    fn can_import(&self, location: &Location, ty: ResourceType) -> bool {
        Importer::can_import(self, location, ty)
    }

    fn raw_import(&self, streams: &mut Streams) -> Result<RawObject, ImportError> {
        let raw = Importer::raw_import(self, streams)?;
        Ok(RawObject(Box::new(raw)))
    }

    fn dependencies(&self, raw: &RawObject, scope: &mut DependencyScope) {
        match raw.0.downcast_ref::<I::Raw>() {
            Some(raw) => Importer::dependencies(self, raw, scope),
            None => tracing::error!("{}", foreign_raw(Importer::name(self))),
        }
    }

    fn import_partially(&self, raw: &RawObject) -> Result<Resource, ImportError> {
        let raw = raw
            .0
            .downcast_ref::<I::Raw>()
            .ok_or_else(|| foreign_raw(Importer::name(self)))?;
        Importer::import_partially(self, raw)
    }

    fn patch_dependencies(
        &self,
        raw: RawObject,
        resource: &Resource,
        dependencies: &ResolvedDependencies,
    ) -> Result<(), ImportError> {
        let raw = raw
            .0
            .downcast::<I::Raw>()
            .map_err(|_| foreign_raw(Importer::name(self)))?;
        Importer::patch_dependencies(self, *raw, resource, dependencies)
    }
}

/// Ordered list of importers.
/// First importer that can import wins.
pub(crate) struct Importers {
    next_id: NonZeroU64,
    importers: Vec<(ImporterId, Box<dyn AnyImporter>)>,
}

impl Importers {
    pub fn new() -> Self {
        Importers {
            next_id: NonZeroU64::MIN,
            importers: Vec::new(),
        }
    }

    /// Adds importer to the end of the list.
    pub fn add_importer(&mut self, importer: Box<dyn AnyImporter>) -> ImporterId {
        let id = ImporterId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        tracing::info!("Registering importer '{}' as {:?}", importer.name(), id);
        self.importers.push((id, importer));
        id
    }

    pub fn remove_importer(&mut self, id: ImporterId) -> bool {
        match self.importers.iter().position(|(i, _)| *i == id) {
            None => false,
            Some(idx) => {
                let (_, importer) = self.importers.remove(idx);
                tracing::info!("Unregistered importer '{}'", importer.name());
                true
            }
        }
    }

    /// Finds first importer that can import resource at location as specified type.
    pub fn find(
        &self,
        location: &Location,
        ty: ResourceType,
    ) -> Option<(ImporterId, &dyn AnyImporter)> {
        let found = self
            .importers
            .iter()
            .find(|(_, importer)| importer.can_import(location, ty));

        match found {
            None => {
                tracing::debug!("No importer for '{}' as '{}'", location, ty);
                None
            }
            Some((id, importer)) => {
                tracing::debug!(
                    "Importer '{}' chosen for '{}' as '{}'",
                    importer.name(),
                    location,
                    ty
                );
                Some((*id, &**importer))
            }
        }
    }

    pub fn name(&self, id: ImporterId) -> Option<&str> {
        self.importers
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, importer)| importer.name())
    }
}
