//! Dependency-aware resource import pipeline.
//!
//! Resources are addressed by [`Location`], a protocol name paired with [`ResourceId`].
//! For every protocol [`Database`] keeps a [`Catalogue`] that maps ids to paths
//! and a [`Provider`] that opens byte [`Streams`] for the paths.
//! Ordered list of [`Importer`](import::Importer)s turns streams into typed objects.
//!
//! Importers declare dependencies of the object they import.
//! Dependencies are loaded recursively and handed back to the importer to patch the object.
//! Within one top-level load every location is imported at most once,
//! and cyclic references receive the partially imported object.

mod catalogue;
mod config;
mod context;
mod database;
mod dispose;
mod error;
mod gen;
mod id;
mod location;
mod provider;
mod resource;

pub mod import;
pub mod store;

pub use self::{
    catalogue::{Catalogue, MemoryCatalogue},
    config::{ConfigError, DatabaseConfig, DependencyPolicy},
    context::{Cached, DependencyContext},
    database::Database,
    dispose::{DisposeFn, Disposer, DisposerId},
    error::{ErrorKind, ImportError, RegisterError, ResourceError},
    gen::Generator,
    id::{ParseResourceIdError, ResourceId, ZeroIDError},
    location::{Location, ParseLocationError},
    provider::{Provider, Streams},
    resource::{Resource, ResourceType, WeakResource},
};
