use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::id::ResourceId;

/// Bidirectional map between resource ids and paths within one protocol.
///
/// Mapping is injective: one id per path and one path per id.
pub trait Catalogue: Send + Sync + 'static {
    /// Returns path mapped to the id.
    fn id_to_path(&self, id: ResourceId) -> Option<String>;

    /// Returns id mapped to the path.
    fn path_to_id(&self, path: &str) -> Option<ResourceId>;

    /// Maps id to path.
    ///
    /// Returns `false` and leaves catalogue untouched
    /// if either id or path is already mapped to something else.
    /// Adding exactly the same pair again succeeds.
    fn add_entry(&self, id: ResourceId, path: &str) -> bool;

    fn contains_id(&self, id: ResourceId) -> bool {
        self.id_to_path(id).is_some()
    }

    fn contains_path(&self, path: &str) -> bool {
        self.path_to_id(path).is_some()
    }
}

/// Pair of maps kept in sync.
#[derive(Default)]
pub(crate) struct Entries {
    paths: HashMap<ResourceId, String>,
    ids: HashMap<String, ResourceId>,
}

/// Outcome of inserting a pair into [`Entries`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Insert {
    Added,
    Exists,
    Conflict,
}

impl Entries {
    pub fn new() -> Self {
        Entries::default()
    }

    pub fn path(&self, id: ResourceId) -> Option<&str> {
        self.paths.get(&id).map(String::as_str)
    }

    pub fn id(&self, path: &str) -> Option<ResourceId> {
        self.ids.get(path).copied()
    }

    pub fn insert(&mut self, id: ResourceId, path: &str) -> Insert {
        match (self.paths.get(&id), self.ids.get(path)) {
            (None, None) => {
                self.paths.insert(id, path.to_owned());
                self.ids.insert(path.to_owned(), id);
                Insert::Added
            }
            (Some(existing), Some(&existing_id)) if existing == path && existing_id == id => {
                Insert::Exists
            }
            _ => Insert::Conflict,
        }
    }

    pub fn remove(&mut self, id: ResourceId) -> Option<String> {
        let path = self.paths.remove(&id)?;
        self.ids.remove(&path);
        Some(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &str)> + '_ {
        self.paths.iter().map(|(id, path)| (*id, path.as_str()))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

/// Catalogue that lives in memory only.
#[derive(Default)]
pub struct MemoryCatalogue {
    entries: RwLock<Entries>,
}

impl MemoryCatalogue {
    pub fn new() -> Self {
        MemoryCatalogue::default()
    }

    /// Creates catalogue from pairs.
    /// Pairs that conflict with earlier ones are skipped.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (ResourceId, &'a str)>) -> Self {
        let catalogue = MemoryCatalogue::new();
        for (id, path) in entries {
            if !catalogue.add_entry(id, path) {
                tracing::warn!("Skipping conflicting catalogue entry '{}' -> '{}'", id, path);
            }
        }
        catalogue
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Catalogue for MemoryCatalogue {
    fn id_to_path(&self, id: ResourceId) -> Option<String> {
        self.entries.read().path(id).map(str::to_owned)
    }

    fn path_to_id(&self, path: &str) -> Option<ResourceId> {
        self.entries.read().id(path)
    }

    fn add_entry(&self, id: ResourceId, path: &str) -> bool {
        self.entries.write().insert(id, path) != Insert::Conflict
    }
}
