use std::{any::Any, sync::Arc};

use hashbrown::{HashMap, HashSet};

use crate::{location::Location, resource::Resource, resource::ResourceType};

/// Named edge from a resource being imported to a resource it needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyDescriptor {
    /// Name of the edge, unique within one import.
    pub key: String,

    /// Location of the dependency.
    pub location: Location,

    /// Type the dependency is loaded as.
    pub ty: ResourceType,
}

impl DependencyDescriptor {
    pub fn new(key: impl Into<String>, location: Location, ty: ResourceType) -> Self {
        DependencyDescriptor {
            key: key.into(),
            location,
            ty,
        }
    }

    pub fn of<T: Any>(key: impl Into<String>, location: Location) -> Self {
        DependencyDescriptor::new(key, location, ResourceType::of::<T>())
    }
}

/// Dependency reference as it appears in resource documents.
///
/// ```json
/// { "key": "background", "ref": "file:0000000000000000000000000000002a" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DependencyRef {
    pub key: String,

    #[serde(rename = "ref")]
    pub location: Location,
}

impl DependencyRef {
    /// Converts reference into descriptor with specified type.
    pub fn into_descriptor(self, ty: ResourceType) -> DependencyDescriptor {
        DependencyDescriptor {
            key: self.key,
            location: self.location,
            ty,
        }
    }
}

/// Dependencies declared during one import.
///
/// Keeps declaration order.
/// First declaration under a key wins, later ones are ignored.
#[derive(Debug, Default)]
pub struct DependencyScope {
    descriptors: Vec<DependencyDescriptor>,
    keys: HashSet<String>,
}

impl DependencyScope {
    pub fn new() -> Self {
        DependencyScope::default()
    }

    /// Declares dependency.
    /// Returns `false` if the key was already declared in this scope.
    pub fn declare(&mut self, descriptor: DependencyDescriptor) -> bool {
        if self.keys.contains(&descriptor.key) {
            tracing::debug!(
                "Dependency '{}' is already declared, ignoring '{}'",
                descriptor.key,
                descriptor.location
            );
            return false;
        }

        self.keys.insert(descriptor.key.clone());
        self.descriptors.push(descriptor);
        true
    }

    /// Declares dependency of type `T`.
    pub fn declare_as<T: Any>(&mut self, key: impl Into<String>, location: Location) -> bool {
        self.declare(DependencyDescriptor::of::<T>(key, location))
    }

    pub fn get(&self, key: &str) -> Option<&DependencyDescriptor> {
        self.descriptors.iter().find(|d| d.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyDescriptor> + '_ {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns descriptors in declaration order.
    pub fn into_descriptors(self) -> Vec<DependencyDescriptor> {
        self.descriptors
    }
}

/// Dependencies resolved for one import.
///
/// Every declared key is present.
/// Dependencies that failed to load map to `None`.
#[derive(Debug, Default)]
pub struct ResolvedDependencies {
    resolved: HashMap<String, Option<Resource>>,
}

impl ResolvedDependencies {
    pub fn new() -> Self {
        ResolvedDependencies::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        ResolvedDependencies {
            resolved: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, key: String, resource: Option<Resource>) {
        self.resolved.insert(key, resource);
    }

    /// Returns resolved dependency.
    /// Returns `None` if dependency was not declared or failed to load.
    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.resolved.get(key)?.as_ref()
    }

    /// Returns resolved dependency of type `T`.
    pub fn get_as<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.get(key)?.downcast()
    }

    /// Checks if dependency was declared.
    pub fn contains_key(&self, key: &str) -> bool {
        self.resolved.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Resource>)> + '_ {
        self.resolved
            .iter()
            .map(|(key, resource)| (key.as_str(), resource.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
