use hashbrown::HashMap;

use crate::{
    error::ResourceError, import::DependencyScope, location::Location, resource::Resource,
};

enum CacheEntry {
    /// Partial object exists, dependencies are being resolved.
    InProgress(Resource),
    Completed(Resource),
    Failed(ResourceError),
}

/// State of a location in [`DependencyContext`].
#[derive(Clone, Copy, Debug)]
pub enum Cached<'a> {
    /// Object is built but may be not patched yet.
    InProgress(&'a Resource),
    Completed(&'a Resource),
    Failed(&'a ResourceError),
}

/// Bookkeeping of one top-level load.
///
/// Holds stack of dependency scopes and resolution cache.
/// Every location is imported at most once per context,
/// all later requests get cached object or error.
/// Cyclic requests get the partial object of the location being resolved.
#[derive(Default)]
pub struct DependencyContext {
    scopes: Vec<DependencyScope>,
    cache: HashMap<Location, CacheEntry>,

    /// Locations being resolved, outermost first.
    stack: Vec<Location>,
}

impl DependencyContext {
    pub fn new() -> Self {
        DependencyContext::default()
    }

    /// Opens new dependency scope and returns it.
    pub fn push_scope(&mut self) -> &mut DependencyScope {
        self.scopes.push(DependencyScope::new());
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Closes innermost dependency scope and transfers declarations to the caller.
    pub fn pop_scope(&mut self) -> Option<DependencyScope> {
        self.scopes.pop()
    }

    /// Returns innermost open scope.
    pub fn active_scope(&mut self) -> Option<&mut DependencyScope> {
        self.scopes.last_mut()
    }

    /// Returns number of open scopes.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Returns number of locations being resolved right now.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Checks if location is being resolved.
    pub fn is_resolving(&self, location: &Location) -> bool {
        self.stack.contains(location)
    }

    pub fn cached(&self, location: &Location) -> Option<Cached<'_>> {
        match self.cache.get(location)? {
            CacheEntry::InProgress(resource) => Some(Cached::InProgress(resource)),
            CacheEntry::Completed(resource) => Some(Cached::Completed(resource)),
            CacheEntry::Failed(error) => Some(Cached::Failed(error)),
        }
    }

    /// Returns number of locations in the cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub(crate) fn enter(&mut self, location: &Location) {
        self.stack.push(location.clone());
    }

    pub(crate) fn leave(&mut self) {
        self.stack.pop();
    }

    /// Records partial object for the location.
    pub(crate) fn begin(&mut self, location: &Location, partial: Resource) {
        self.cache
            .insert(location.clone(), CacheEntry::InProgress(partial));
    }

    pub(crate) fn complete(&mut self, location: &Location, resource: Resource) {
        self.cache
            .insert(location.clone(), CacheEntry::Completed(resource));
    }

    pub(crate) fn fail(&mut self, location: &Location, error: ResourceError) {
        self.cache.insert(location.clone(), CacheEntry::Failed(error));
    }
}
