use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use parking_lot::RwLock;

use crate::{
    catalogue::{Catalogue, Entries, Insert},
    gen::Generator,
    id::ResourceId,
};

use super::{
    sidecar::{is_catalogued_name, Sidecar, SidecarState},
    StoreError,
};

/// Catalogue backed by a directory tree.
///
/// Every directory keeps a sidecar file that maps file names to ids.
/// Catalogue paths are relative to the root and use `/` as separator.
/// Paths passed in are normalized first: empty and `.` components are dropped,
/// paths with `..` components are rejected.
///
/// Directories without a readable sidecar get fresh ids for all their files
/// and the sidecar is rewritten.
/// References to ids assigned earlier in such directory are lost.
pub struct FileCatalogue {
    root: PathBuf,
    entries: RwLock<Entries>,
    id_gen: Generator,
}

impl FileCatalogue {
    /// Opens catalogue rooted at specified directory.
    /// Assigns ids to new files and repairs broken sidecars.
    #[tracing::instrument]
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let root = dunce::canonicalize(root).map_err(|error| StoreError::CanonError {
            error,
            path: root.to_owned(),
        })?;

        let catalogue = FileCatalogue {
            root,
            entries: RwLock::new(Entries::new()),
            id_gen: Generator::new(),
        };

        catalogue.scan()?;
        Ok(catalogue)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns all entries sorted by path.
    pub fn entries(&self) -> Vec<(ResourceId, String)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|(id, path)| (id, path.to_owned()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns id of the file, assigning new one if needed.
    pub fn register_file(&self, path: &str) -> Result<ResourceId, StoreError> {
        let path = normalize_path(path)?;

        if let Some(id) = self.entries.read().id(&path) {
            return Ok(id);
        }

        let full = self.full_path(&path)?;
        if !full.is_file() {
            return Err(StoreError::NotAFile { path: full });
        }

        let (dir, name) = split_path(&path);
        if !is_catalogued_name(name) {
            return Err(StoreError::NotCatalogued { path: path.clone() });
        }

        let mut entries = self.entries.write();

        // Could be registered while lock was released.
        if let Some(id) = entries.id(&path) {
            return Ok(id);
        }

        let id = self.new_id(&entries);
        entries.insert(id, &path);
        if let Err(err) = self.write_sidecar(&entries, dir) {
            entries.remove(id);
            return Err(err);
        }

        tracing::debug!("Registered '{}' as '{}'", path, id);
        Ok(id)
    }

    fn new_id(&self, entries: &Entries) -> ResourceId {
        loop {
            let id = self.id_gen.generate();
            if entries.path(id).is_none() {
                return id;
            }
        }
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, StoreError> {
        let mut full = self.root.clone();
        for part in components(path)? {
            full.push(part);
        }
        Ok(full)
    }

    fn write_sidecar(&self, entries: &Entries, dir: &str) -> Result<(), StoreError> {
        let mut sidecar = Sidecar::default();
        for (id, path) in entries.iter() {
            let (entry_dir, name) = split_path(path);
            if entry_dir == dir {
                sidecar.entries.insert(name.to_owned(), id);
            }
        }

        sidecar.write(&self.full_path(dir)?)
    }

    fn scan(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write();

        let mut queue = VecDeque::new();
        queue.push_back(String::new());

        while let Some(rel_dir) = queue.pop_front() {
            let dir_path = self.full_path(&rel_dir)?;

            let mut files = Vec::new();
            let dir = std::fs::read_dir(&dir_path).map_err(|error| StoreError::ReadDirError {
                error,
                path: dir_path.clone(),
            })?;

            for e in dir {
                let e = match e {
                    Err(err) => {
                        tracing::error!(
                            "Failed to read entry in directory '{}'. {:#}",
                            dir_path.display(),
                            err,
                        );
                        continue;
                    }
                    Ok(e) => e,
                };

                let name = e.file_name();
                let Some(name) = name.to_str() else {
                    tracing::warn!(
                        "Skipping non UTF-8 file name '{}' in '{}'",
                        name.to_string_lossy(),
                        dir_path.display()
                    );
                    continue;
                };

                if name.starts_with('.') {
                    continue;
                }

                let ft = match e.file_type() {
                    Err(err) => {
                        tracing::error!("Failed to check '{}'. {:#}", e.path().display(), err);
                        continue;
                    }
                    Ok(ft) => ft,
                };

                if ft.is_dir() {
                    queue.push_back(join_path(&rel_dir, name));
                } else if ft.is_file() && is_catalogued_name(name) {
                    files.push(name.to_owned());
                }
            }

            files.sort();

            let sidecar = match Sidecar::read(&dir_path)? {
                SidecarState::Missing => {
                    if !files.is_empty() {
                        tracing::info!(
                            "No sidecar in '{}', assigning new ids",
                            dir_path.display()
                        );
                    }
                    None
                }
                SidecarState::Corrupted(err) => {
                    tracing::warn!(
                        "Sidecar in '{}' is corrupted, all files get new ids. {}",
                        dir_path.display(),
                        err
                    );
                    None
                }
                SidecarState::Valid(sidecar) => Some(sidecar),
            };

            let mut dirty = sidecar.is_none() && !files.is_empty();
            let known = sidecar.map(|s| s.entries).unwrap_or_default();

            if known.keys().any(|name| !files.contains(name)) {
                tracing::debug!("Dropping stale entries from '{}'", dir_path.display());
                dirty = true;
            }

            for name in &files {
                let path = join_path(&rel_dir, name);

                if let Some(&id) = known.get(name) {
                    match entries.insert(id, &path) {
                        Insert::Added | Insert::Exists => continue,
                        Insert::Conflict => {
                            tracing::warn!(
                                "Id '{}' of '{}' is already taken, assigning new id",
                                id,
                                path
                            );
                        }
                    }
                }

                let id = self.new_id(&entries);
                entries.insert(id, &path);
                dirty = true;
            }

            if dirty {
                self.write_sidecar(&entries, &rel_dir)?;
            }
        }

        Ok(())
    }
}

impl Catalogue for FileCatalogue {
    fn id_to_path(&self, id: ResourceId) -> Option<String> {
        self.entries.read().path(id).map(str::to_owned)
    }

    fn path_to_id(&self, path: &str) -> Option<ResourceId> {
        let path = normalize_path(path).ok()?;
        self.entries.read().id(&path)
    }

    fn add_entry(&self, id: ResourceId, path: &str) -> bool {
        let path = match normalize_path(path) {
            Ok(path) => path,
            Err(err) => {
                tracing::error!("Cannot add entry '{}'. {}", id, err);
                return false;
            }
        };

        let (dir, name) = split_path(&path);
        if !is_catalogued_name(name) {
            tracing::error!("Cannot add entry '{}' -> '{}'. Name is not catalogued", id, path);
            return false;
        }

        let mut entries = self.entries.write();
        match entries.insert(id, &path) {
            Insert::Conflict => false,
            Insert::Exists => true,
            Insert::Added => match self.write_sidecar(&entries, dir) {
                Ok(()) => true,
                Err(err) => {
                    tracing::error!("Failed to persist entry '{}' -> '{}'. {}", id, path, err);
                    entries.remove(id);
                    false
                }
            },
        }
    }
}

/// Splits path into meaningful components.
fn components(path: &str) -> Result<impl Iterator<Item = &str>, StoreError> {
    let parts = path.split('/').filter(|part| !matches!(*part, "" | "."));
    if parts.clone().any(|part| part == "..") {
        return Err(StoreError::OutsideOfRoot {
            path: path.to_owned(),
        });
    }
    Ok(parts)
}

/// Brings path to the form entries are stored in.
fn normalize_path(path: &str) -> Result<String, StoreError> {
    Ok(components(path)?.collect::<Vec<_>>().join("/"))
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

/// Splits catalogue path into directory and file name.
fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        None => ("", path),
        Some((dir, name)) => (dir, name),
    }
}
