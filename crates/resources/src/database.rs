use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use hashbrown::{hash_map::Entry, HashMap};

use crate::{
    catalogue::Catalogue,
    config::{DatabaseConfig, DependencyPolicy},
    context::{Cached, DependencyContext},
    dispose::{Disposer, DisposerId, Disposers},
    error::{RegisterError, ResourceError},
    import::{Importer, ImporterId, Importers, ResolvedDependencies},
    location::{is_valid_protocol, Location},
    provider::Provider,
    resource::{Resource, ResourceType},
};

/// Resource database.
///
/// Owns registries of catalogues, providers, importers and disposers
/// and resolves resources with all their dependencies.
///
/// Every top-level load gets its own [`DependencyContext`],
/// nothing is cached between top-level loads.
pub struct Database {
    config: DatabaseConfig,
    catalogues: HashMap<String, Box<dyn Catalogue>>,
    providers: HashMap<String, Box<dyn Provider>>,
    importers: Importers,
    disposers: Disposers,
    types: HashMap<String, ResourceType>,
}

impl Default for Database {
    fn default() -> Self {
        Database::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Database::with_config(DatabaseConfig::default())
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        Database {
            config,
            catalogues: HashMap::new(),
            providers: HashMap::new(),
            importers: Importers::new(),
            disposers: Disposers::new(),
            types: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Registers catalogue for the protocol.
    /// Fails if protocol already has a catalogue
    /// or cannot be used in a [`Location`].
    #[tracing::instrument(skip(self, catalogue))]
    pub fn register_identifier_catalogue(
        &mut self,
        protocol: &str,
        catalogue: impl Catalogue,
    ) -> Result<(), RegisterError> {
        check_protocol(protocol)?;
        match self.catalogues.entry(protocol.to_owned()) {
            Entry::Occupied(_) => Err(RegisterError::CatalogueTaken {
                protocol: protocol.to_owned(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(Box::new(catalogue));
                Ok(())
            }
        }
    }

    pub fn unregister_identifier_catalogue(&mut self, protocol: &str) -> Option<Box<dyn Catalogue>> {
        self.catalogues.remove(protocol)
    }

    pub fn try_get_identifier_catalogue(&self, protocol: &str) -> Option<&dyn Catalogue> {
        self.catalogues.get(protocol).map(|c| &**c)
    }

    /// Registers stream provider for the protocol.
    /// Fails if protocol already has a provider
    /// or cannot be used in a [`Location`].
    #[tracing::instrument(skip(self, provider))]
    pub fn register_protocol_provider(
        &mut self,
        protocol: &str,
        provider: impl Provider,
    ) -> Result<(), RegisterError> {
        check_protocol(protocol)?;
        match self.providers.entry(protocol.to_owned()) {
            Entry::Occupied(_) => Err(RegisterError::ProviderTaken {
                protocol: protocol.to_owned(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(Box::new(provider));
                Ok(())
            }
        }
    }

    pub fn unregister_protocol_provider(&mut self, protocol: &str) -> Option<Box<dyn Provider>> {
        self.providers.remove(protocol)
    }

    pub fn try_get_protocol_provider(&self, protocol: &str) -> Option<&dyn Provider> {
        self.providers.get(protocol).map(|p| &**p)
    }

    /// Appends importer to the importer list.
    /// Importers registered earlier take precedence.
    pub fn register_resource_importer(&mut self, importer: impl Importer) -> ImporterId {
        self.importers.add_importer(Box::new(importer))
    }

    pub fn unregister_resource_importer(&mut self, id: ImporterId) -> bool {
        self.importers.remove_importer(id)
    }

    /// Returns importer that would be chosen to import location as specified type.
    pub fn try_get_resource_importer(
        &self,
        location: &Location,
        ty: ResourceType,
    ) -> Option<ImporterId> {
        self.importers.find(location, ty).map(|(id, _)| id)
    }

    pub fn importer_name(&self, id: ImporterId) -> Option<&str> {
        self.importers.name(id)
    }

    /// Appends disposer to the disposer list.
    /// Disposers registered earlier take precedence.
    pub fn register_resource_disposer(&mut self, disposer: impl Disposer) -> DisposerId {
        self.disposers.add_disposer(Box::new(disposer))
    }

    pub fn unregister_resource_disposer(&mut self, id: DisposerId) -> bool {
        self.disposers.remove_disposer(id)
    }

    pub fn try_get_resource_disposer(&self, resource: &Resource) -> Option<DisposerId> {
        self.disposers.find(resource).map(|(id, _)| id)
    }

    /// Registers name for the resource type.
    pub fn register_resource_type<T: Any>(&mut self, name: &str) -> Result<(), RegisterError> {
        match self.types.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(RegisterError::TypeNameTaken {
                name: name.to_owned(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(ResourceType::of::<T>());
                Ok(())
            }
        }
    }

    pub fn resource_type(&self, name: &str) -> Option<ResourceType> {
        self.types.get(name).copied()
    }

    /// Returns path of the location in its protocol catalogue.
    pub fn path_of(&self, location: &Location) -> Result<String, ResourceError> {
        let catalogue = self.catalogue(location.protocol())?;
        let path = guard(location, "looking up path", || {
            catalogue.id_to_path(location.id())
        })?;

        path.ok_or_else(|| ResourceError::UnmappedResourceGuid {
            location: location.clone(),
        })
    }

    /// Returns location of the path in protocol catalogue.
    pub fn locate(&self, protocol: &str, path: &str) -> Result<Location, ResourceError> {
        let catalogue = self.catalogue(protocol)?;
        let subject = format!("{protocol}:{path}");
        let id = guard(&subject, "looking up id", || catalogue.path_to_id(path))?;

        match id {
            None => Err(ResourceError::UnmappedResourcePath {
                protocol: protocol.to_owned(),
                path: path.to_owned(),
            }),
            Some(id) => Ok(Location::new(protocol, id)),
        }
    }

    /// Loads resource of type `T` with all its dependencies.
    pub fn load<T>(&self, location: &Location) -> Result<Arc<T>, ResourceError>
    where
        T: Any + Send + Sync,
    {
        let expected = ResourceType::of::<T>();
        let resource = self.load_dyn(location, expected)?;
        resource
            .downcast::<T>()
            .ok_or_else(|| ResourceError::EmptyResult {
                location: location.clone(),
                expected,
                found: resource.ty(),
            })
    }

    /// Loads resource of specified type with all its dependencies.
    #[tracing::instrument(skip(self))]
    pub fn load_dyn(&self, location: &Location, ty: ResourceType) -> Result<Resource, ResourceError> {
        let mut ctx = DependencyContext::new();
        self.load_with(location, ty, &mut ctx)
    }

    /// Loads resource of type registered under `type_name`.
    pub fn load_named(&self, location: &Location, type_name: &str) -> Result<Resource, ResourceError> {
        let ty = self
            .resource_type(type_name)
            .ok_or_else(|| ResourceError::NullResourceType {
                name: type_name.to_owned(),
            })?;

        self.load_dyn(location, ty)
    }

    /// Loads resource within existing context.
    ///
    /// Locations already resolved in the context are not imported again.
    /// Location that is being resolved right now yields its partial object.
    #[tracing::instrument(level = "debug", skip(self, ctx), fields(depth = ctx.depth()))]
    pub fn load_with(
        &self,
        location: &Location,
        ty: ResourceType,
        ctx: &mut DependencyContext,
    ) -> Result<Resource, ResourceError> {
        if let Some(cached) = ctx.cached(location) {
            let resource = match cached {
                Cached::Completed(resource) => {
                    tracing::debug!("'{}' is already loaded", location);
                    resource.clone()
                }
                Cached::InProgress(resource) => {
                    tracing::debug!("'{}' is in progress, using partial object", location);
                    resource.clone()
                }
                Cached::Failed(error) => return Err(error.clone()),
            };
            return check_type(location, ty, resource);
        }

        ctx.enter(location);
        let result = self.resolve(location, ty, ctx);
        ctx.leave();

        match &result {
            Ok(resource) => ctx.complete(location, resource.clone()),
            Err(error) => {
                tracing::debug!("Failed to load '{}'. {}", location, error);
                ctx.fail(location, error.clone());
            }
        }

        result
    }

    fn resolve(
        &self,
        location: &Location,
        ty: ResourceType,
        ctx: &mut DependencyContext,
    ) -> Result<Resource, ResourceError> {
        let path = self.path_of(location)?;

        let provider = self
            .providers
            .get(location.protocol())
            .ok_or_else(|| ResourceError::MissingProtocolProvider {
                protocol: location.protocol().to_owned(),
            })?;

        let mut streams = guard(location, "providing streams", || {
            provider.provide_streams(&path, ty)
        })?
        .ok_or_else(|| ResourceError::NullResourceStream {
            location: location.clone(),
            path: path.clone(),
        })?;

        let importer = guard(location, "choosing importer", || {
            self.importers.find(location, ty)
        })?;

        let Some((_, importer)) = importer else {
            drop(streams);
            return Err(ResourceError::MissingResourceImporter {
                location: location.clone(),
                ty,
            });
        };

        let raw = guard(location, "importing raw object", || {
            importer.raw_import(&mut streams)
        });
        drop(streams);
        let raw = raw?.map_err(|error| ResourceError::from_import(location, error))?;

        let scope = ctx.push_scope();
        let declared = guard(location, "declaring dependencies", || {
            importer.dependencies(&raw, scope)
        });
        let scope = ctx.pop_scope().unwrap_or_default();
        declared?;

        let partial = guard(location, "importing partially", || {
            importer.import_partially(&raw)
        })?
        .map_err(|error| ResourceError::from_import(location, error))?;

        let partial = check_type(location, ty, partial)?;
        ctx.begin(location, partial.clone());

        let descriptors = scope.into_descriptors();
        let mut resolved = ResolvedDependencies::with_capacity(descriptors.len());

        for descriptor in descriptors {
            match self.load_with(&descriptor.location, descriptor.ty, ctx) {
                Ok(resource) => resolved.insert(descriptor.key, Some(resource)),
                Err(error) => match self.config.dependencies {
                    DependencyPolicy::BestEffort => {
                        tracing::warn!(
                            "Dependency '{}' of '{}' failed to load. {}",
                            descriptor.key,
                            location,
                            error
                        );
                        resolved.insert(descriptor.key, None);
                    }
                    DependencyPolicy::Strict => return Err(error),
                },
            }
        }

        guard(location, "patching dependencies", || {
            importer.patch_dependencies(raw, &partial, &resolved)
        })?
        .map_err(|error| ResourceError::from_import(location, error))?;

        Ok(partial)
    }

    /// Releases resource with first disposer that can dispose it.
    /// Returns `false` if no disposer claims the resource.
    pub fn dispose(&self, resource: Resource) -> bool {
        match self.disposers.find(&resource) {
            None => {
                tracing::debug!("No disposer for '{}'", resource.ty());
                false
            }
            Some((_, disposer)) => {
                let ty = resource.ty();
                let ok = catch_unwind(AssertUnwindSafe(|| disposer.dispose(resource))).is_ok();
                if !ok {
                    tracing::error!("Disposer '{}' panicked on '{}'", disposer.name(), ty);
                }
                ok
            }
        }
    }

    fn catalogue(&self, protocol: &str) -> Result<&dyn Catalogue, ResourceError> {
        match self.catalogues.get(protocol) {
            Some(catalogue) => Ok(&**catalogue),
            None if self.providers.contains_key(protocol) => Err(ResourceError::MissingCatalogue {
                protocol: protocol.to_owned(),
            }),
            None => Err(ResourceError::UnknownProtocol {
                protocol: protocol.to_owned(),
            }),
        }
    }
}

fn check_type(
    location: &Location,
    expected: ResourceType,
    resource: Resource,
) -> Result<Resource, ResourceError> {
    if resource.ty() == expected {
        Ok(resource)
    } else {
        Err(ResourceError::EmptyResult {
            location: location.clone(),
            expected,
            found: resource.ty(),
        })
    }
}

fn check_protocol(protocol: &str) -> Result<(), RegisterError> {
    if is_valid_protocol(protocol) {
        Ok(())
    } else {
        Err(RegisterError::InvalidProtocol {
            protocol: protocol.to_owned(),
        })
    }
}

/// Runs plugin code, turning panics into [`ResourceError::Unknown`].
fn guard<T>(
    subject: &dyn std::fmt::Display,
    action: &str,
    f: impl FnOnce() -> T,
) -> Result<T, ResourceError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");

        tracing::error!("Panic while {} for '{}': {}", action, subject, message);

        ResourceError::Unknown {
            reason: format!("Panic while {action} for '{subject}': {message}"),
        }
    })
}
