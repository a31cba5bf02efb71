//! JSON documents that reference each other.
//!
//! Document is any JSON value. Top-level object may have `dependencies` array
//! of `{ "key": "...", "ref": "<protocol>:<id>" }` entries.

use arcana_resources::{
    import::{DependencyRef, DependencyScope, Importer, ResolvedDependencies},
    ImportError, Location, Resource, ResourceType, Streams, WeakResource,
};
use parking_lot::Mutex;

/// Reference from one document to another.
#[derive(Debug)]
pub struct Link {
    pub key: String,
    pub location: Location,

    /// `None` if referenced document failed to load.
    pub target: Option<WeakResource>,
}

#[derive(Debug)]
pub struct Document {
    pub value: serde_json::Value,
    links: Mutex<Vec<Link>>,
}

impl Document {
    pub fn with_links<R>(&self, f: impl FnOnce(&[Link]) -> R) -> R {
        f(&self.links.lock())
    }
}

pub struct RawDocument {
    value: serde_json::Value,
    refs: Vec<DependencyRef>,
}

pub struct DocumentImporter;

impl Importer for DocumentImporter {
    type Raw = RawDocument;

    fn name(&self) -> &str {
        "json-document"
    }

    fn can_import(&self, _location: &Location, ty: ResourceType) -> bool {
        ty.is::<Document>()
    }

    fn raw_import(&self, streams: &mut Streams) -> Result<RawDocument, ImportError> {
        let data = streams.read_primary().map_err(ImportError::other)?;
        let value: serde_json::Value =
            serde_json::from_slice(&data).map_err(ImportError::corrupted)?;

        let refs = match value.get("dependencies") {
            None => Vec::new(),
            Some(deps) => {
                serde_json::from_value(deps.clone()).map_err(ImportError::corrupted)?
            }
        };

        Ok(RawDocument { value, refs })
    }

    fn dependencies(&self, raw: &RawDocument, scope: &mut DependencyScope) {
        for r in &raw.refs {
            scope.declare(r.clone().into_descriptor(ResourceType::of::<Document>()));
        }
    }

    fn import_partially(&self, raw: &RawDocument) -> Result<Resource, ImportError> {
        Ok(Resource::new(Document {
            value: raw.value.clone(),
            links: Mutex::new(Vec::new()),
        }))
    }

    fn patch_dependencies(
        &self,
        raw: RawDocument,
        resource: &Resource,
        resolved: &ResolvedDependencies,
    ) -> Result<(), ImportError> {
        let document = resource
            .downcast_ref::<Document>()
            .ok_or_else(|| ImportError::other("resource is not a document"))?;

        let mut links = document.links.lock();
        for r in raw.refs {
            if links.iter().any(|link| link.key == r.key) {
                continue;
            }

            links.push(Link {
                target: resolved.get(&r.key).map(Resource::downgrade),
                key: r.key,
                location: r.location,
            });
        }

        Ok(())
    }
}
