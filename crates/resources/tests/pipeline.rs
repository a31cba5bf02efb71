use std::{
    io::{Cursor, Read},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use arcana_resources::{
    import::{DependencyRef, DependencyScope, Importer, ResolvedDependencies},
    Cached, Catalogue, Database, DatabaseConfig, DependencyContext, DisposeFn, Disposer, ErrorKind,
    ImportError, Location, MemoryCatalogue, RegisterError, Resource, ResourceId, ResourceType,
    Streams,
};
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::{json, Value};

const MEM: &str = "mem";

fn id(n: u128) -> ResourceId {
    ResourceId::new(n).unwrap()
}

fn loc(n: u128) -> Location {
    Location::new(MEM, id(n))
}

fn path(n: u128) -> String {
    format!("nodes/{n}.json")
}

fn node(name: &str, deps: &[(&str, u128)]) -> Value {
    let deps: Vec<Value> = deps
        .iter()
        .map(|(key, n)| json!({ "key": key, "ref": loc(*n).to_string() }))
        .collect();
    json!({ "name": name, "deps": deps })
}

/// Imported node graph element.
#[derive(Debug)]
struct Node {
    name: String,
    links: Mutex<Vec<(String, Option<Resource>)>>,
}

impl Node {
    fn link(&self, key: &str) -> Option<Resource> {
        self.links
            .lock()
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, r)| r.clone())
    }

    fn has_link(&self, key: &str) -> bool {
        self.links.lock().iter().any(|(k, _)| k == key)
    }
}

#[derive(serde::Deserialize)]
struct NodeData {
    name: String,

    #[serde(default)]
    deps: Vec<DependencyRef>,

    #[serde(default)]
    panic: bool,

    #[serde(default)]
    reject: bool,

    #[serde(default)]
    panic_deps: bool,
}

#[derive(Default)]
struct Stats {
    provided: AtomicUsize,
    released: AtomicUsize,
    imported: Mutex<Vec<String>>,

    /// Name of patched node, key of dependency and number of links dependency had at the moment.
    patched: Mutex<Vec<(String, String, usize)>>,

    /// Partial objects handed out by the importer.
    partials: Mutex<Vec<(String, Resource)>>,
}

impl Stats {
    fn imports_of(&self, name: &str) -> usize {
        self.imported.lock().iter().filter(|n| *n == name).count()
    }

    fn partial_of(&self, name: &str) -> Option<Resource> {
        self.partials
            .lock()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.clone())
    }
}

/// Stream that counts releases.
struct Tracked {
    data: Cursor<Vec<u8>>,
    stats: Arc<Stats>,
}

impl Read for Tracked {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.data.read(buf)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct NodeImporter {
    stats: Arc<Stats>,
}

impl Importer for NodeImporter {
    type Raw = NodeData;

    fn name(&self) -> &str {
        "node"
    }

    fn can_import(&self, _location: &Location, ty: ResourceType) -> bool {
        ty.is::<Node>()
    }

    fn raw_import(&self, streams: &mut Streams) -> Result<NodeData, ImportError> {
        let data = streams.read_primary().map_err(ImportError::other)?;
        let raw: NodeData = serde_json::from_slice(&data).map_err(ImportError::corrupted)?;
        self.stats.imported.lock().push(raw.name.clone());
        Ok(raw)
    }

    fn dependencies(&self, raw: &NodeData, scope: &mut DependencyScope) {
        if raw.panic_deps {
            panic!("node '{}' has unreadable dependencies", raw.name);
        }
        for dep in &raw.deps {
            scope.declare(dep.clone().into_descriptor(ResourceType::of::<Node>()));
        }
    }

    fn import_partially(&self, raw: &NodeData) -> Result<Resource, ImportError> {
        if raw.panic {
            panic!("node '{}' cannot be imported", raw.name);
        }

        let partial = Resource::new(Node {
            name: raw.name.clone(),
            links: Mutex::new(Vec::new()),
        });
        self.stats
            .partials
            .lock()
            .push((raw.name.clone(), partial.clone()));
        Ok(partial)
    }

    fn patch_dependencies(
        &self,
        raw: NodeData,
        resource: &Resource,
        dependencies: &ResolvedDependencies,
    ) -> Result<(), ImportError> {
        if raw.reject {
            return Err(ImportError::other("rejected"));
        }

        let node = resource.downcast_ref::<Node>().unwrap();

        for (key, dep) in dependencies.iter() {
            if let Some(dep) = dep.and_then(|d| d.downcast_ref::<Node>()) {
                let len = dep.links.lock().len();
                self.stats
                    .patched
                    .lock()
                    .push((raw.name.clone(), key.to_owned(), len));
            }
        }

        let mut links = node.links.lock();
        for dep in raw.deps {
            if links.iter().any(|(k, _)| *k == dep.key) {
                continue;
            }
            let resolved = dependencies.get(&dep.key).cloned();
            links.push((dep.key, resolved));
        }

        Ok(())
    }
}

/// Importer that claims everything.
#[derive(Debug)]
struct Label(&'static str);

struct LabelImporter(&'static str);

impl Importer for LabelImporter {
    type Raw = ();

    fn can_import(&self, _location: &Location, _ty: ResourceType) -> bool {
        true
    }

    fn raw_import(&self, _streams: &mut Streams) -> Result<(), ImportError> {
        Ok(())
    }

    fn import_partially(&self, _raw: &()) -> Result<Resource, ImportError> {
        Ok(Resource::new(Label(self.0)))
    }
}

struct Fixture {
    db: Database,
    stats: Arc<Stats>,
}

fn fixture(files: &[(u128, Value)], config: DatabaseConfig) -> Fixture {
    let stats = Arc::new(Stats::default());
    let mut db = Database::with_config(config);

    let paths: Vec<(ResourceId, String)> = files.iter().map(|(n, _)| (id(*n), path(*n))).collect();
    let catalogue =
        MemoryCatalogue::from_entries(paths.iter().map(|(id, path)| (*id, path.as_str())));
    db.register_identifier_catalogue(MEM, catalogue).unwrap();

    let contents: HashMap<String, Vec<u8>> = files
        .iter()
        .map(|(n, value)| (path(*n), serde_json::to_vec(value).unwrap()))
        .collect();

    let provider_stats = stats.clone();
    db.register_protocol_provider(MEM, move |path: &str, _ty: ResourceType| -> Option<Streams> {
        provider_stats.provided.fetch_add(1, Ordering::SeqCst);
        let data = contents.get(path)?.clone();
        Some(Streams::new(Tracked {
            data: Cursor::new(data),
            stats: provider_stats.clone(),
        }))
    })
    .unwrap();

    db.register_resource_importer(NodeImporter {
        stats: stats.clone(),
    });

    Fixture { db, stats }
}

fn load(fixture: &Fixture, n: u128) -> Result<Arc<Node>, arcana_resources::ResourceError> {
    fixture.db.load::<Node>(&loc(n))
}

#[test]
fn cycle_terminates_with_shared_objects() {
    let f = fixture(
        &[(1, node("a", &[("b", 2)])), (2, node("b", &[("a", 1)]))],
        DatabaseConfig::default(),
    );

    let a = f.db.load_dyn(&loc(1), ResourceType::of::<Node>()).unwrap();
    let a_node = a.downcast_ref::<Node>().unwrap();
    assert_eq!(a_node.name, "a");

    let b = a_node.link("b").unwrap();
    let b_node = b.downcast_ref::<Node>().unwrap();
    assert_eq!(b_node.name, "b");

    let back = b_node.link("a").unwrap();
    assert!(Resource::ptr_eq(&back, &a));

    assert_eq!(f.stats.imports_of("a"), 1);
    assert_eq!(f.stats.imports_of("b"), 1);

    // `b` was patched while `a` was still partial.
    assert!(f
        .stats
        .patched
        .lock()
        .contains(&("b".to_owned(), "a".to_owned(), 0)));
}

#[test]
fn self_reference() {
    let f = fixture(&[(1, node("a", &[("me", 1)]))], DatabaseConfig::default());

    let a = f.db.load_dyn(&loc(1), ResourceType::of::<Node>()).unwrap();
    let me = a.downcast_ref::<Node>().unwrap().link("me").unwrap();
    assert!(Resource::ptr_eq(&me, &a));
    assert_eq!(f.stats.imports_of("a"), 1);
}

#[test]
fn shared_dependency_imported_once() {
    let f = fixture(
        &[
            (1, node("a", &[("b", 2), ("c", 3), ("also-c", 3)])),
            (2, node("b", &[("c", 3)])),
            (3, node("c", &[])),
        ],
        DatabaseConfig::default(),
    );

    let a = load(&f, 1).unwrap();
    let b = a.link("b").unwrap();
    let c = a.link("c").unwrap();
    let also_c = a.link("also-c").unwrap();
    let b_c = b.downcast_ref::<Node>().unwrap().link("c").unwrap();

    assert!(Resource::ptr_eq(&c, &also_c));
    assert!(Resource::ptr_eq(&c, &b_c));
    assert_eq!(f.stats.imports_of("c"), 1);
}

#[test]
fn first_declaration_of_key_wins() {
    let f = fixture(
        &[
            (1, node("a", &[("x", 2), ("x", 3)])),
            (2, node("b", &[])),
            (3, node("c", &[])),
        ],
        DatabaseConfig::default(),
    );

    let a = load(&f, 1).unwrap();
    let x = a.link("x").unwrap();
    assert_eq!(x.downcast_ref::<Node>().unwrap().name, "b");
    assert_eq!(f.stats.imports_of("c"), 0);
}

#[test]
fn same_key_in_different_importers() {
    let f = fixture(
        &[
            (1, node("a", &[("next", 2)])),
            (2, node("b", &[("next", 3)])),
            (3, node("c", &[])),
        ],
        DatabaseConfig::default(),
    );

    let a = load(&f, 1).unwrap();
    let b = a.link("next").unwrap();
    let c = b.downcast_ref::<Node>().unwrap().link("next").unwrap();
    assert_eq!(c.downcast_ref::<Node>().unwrap().name, "c");
}

#[test]
fn top_level_loads_are_independent() {
    let f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    let first = load(&f, 1).unwrap();
    let second = load(&f, 1).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(f.stats.imports_of("a"), 2);
}

#[test]
fn streams_released_exactly_once() {
    let f = fixture(
        &[(1, node("a", &[("b", 2)])), (2, node("b", &[("a", 1)]))],
        DatabaseConfig::default(),
    );

    load(&f, 1).unwrap();
    assert_eq!(f.stats.provided.load(Ordering::SeqCst), 2);
    assert_eq!(f.stats.released.load(Ordering::SeqCst), 2);
}

#[test]
fn unknown_protocol() {
    let f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    let err = f
        .db
        .load::<Node>(&Location::new("nowhere", id(1)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownProtocol);
    assert_eq!(f.stats.provided.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_catalogue_and_provider() {
    let mut f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    f.db.register_protocol_provider("bare", |_: &str, _: ResourceType| -> Option<Streams> {
        None
    })
    .unwrap();
    let err = f.db.load::<Node>(&Location::new("bare", id(1))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingCatalogue);

    f.db.register_identifier_catalogue("listed", MemoryCatalogue::from_entries([(id(1), "a")]))
        .unwrap();
    let err = f
        .db
        .load::<Node>(&Location::new("listed", id(1)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingProtocolProvider);
}

#[test]
fn unmapped_id_and_path() {
    let f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    let err = load(&f, 42).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnmappedResourceGuid);
    assert_eq!(f.stats.provided.load(Ordering::SeqCst), 0);

    assert_eq!(f.db.locate(MEM, &path(1)).unwrap(), loc(1));
    assert_eq!(f.db.path_of(&loc(1)).unwrap(), path(1));

    let err = f.db.locate(MEM, "nodes/missing.json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnmappedResourcePath);
}

#[test]
fn provider_without_streams() {
    let f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    assert!(f
        .db
        .try_get_identifier_catalogue(MEM)
        .unwrap()
        .add_entry(id(2), "nodes/ghost.json"));

    let err = load(&f, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullResourceStream);
    assert_eq!(f.stats.provided.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_importer_releases_streams() {
    #[derive(Debug)]
    struct Unknown;

    let f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    let err = f.db.load::<Unknown>(&loc(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingResourceImporter);
    assert_eq!(f.stats.provided.load(Ordering::SeqCst), 1);
    assert_eq!(f.stats.released.load(Ordering::SeqCst), 1);
}

#[test]
fn corrupted_data() {
    let f = fixture(&[(1, json!({ "nombre": "a" }))], DatabaseConfig::default());

    let err = load(&f, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptedResourceData);
    assert_eq!(f.stats.released.load(Ordering::SeqCst), 1);
}

#[test]
fn importer_panic_becomes_unknown() {
    let f = fixture(
        &[
            (1, json!({ "name": "a", "panic": true })),
            (2, node("b", &[])),
        ],
        DatabaseConfig::default(),
    );

    let err = load(&f, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);

    // Database remains usable.
    assert_eq!(load(&f, 2).unwrap().name, "b");
}

#[test]
fn provider_panic_becomes_unknown() {
    let mut db = Database::new();
    db.register_identifier_catalogue(MEM, MemoryCatalogue::from_entries([(id(1), "a")]))
        .unwrap();
    db.register_protocol_provider(MEM, |path: &str, _: ResourceType| -> Option<Streams> {
        panic!("cannot open '{path}'")
    })
    .unwrap();
    db.register_resource_importer(LabelImporter("label"));

    let err = db.load::<Label>(&loc(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert!(err.to_string().contains("cannot open 'a'"));
}

#[test]
fn catalogue_panic_becomes_unknown() {
    struct Cursed;

    impl Catalogue for Cursed {
        fn id_to_path(&self, id: ResourceId) -> Option<String> {
            panic!("id {id} is cursed")
        }

        fn path_to_id(&self, path: &str) -> Option<ResourceId> {
            panic!("path '{path}' is cursed")
        }

        fn add_entry(&self, _id: ResourceId, _path: &str) -> bool {
            false
        }
    }

    let mut f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());
    f.db.register_identifier_catalogue("cursed", Cursed).unwrap();

    let err = f
        .db
        .load::<Node>(&Location::new("cursed", id(2)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);

    let err = f.db.locate("cursed", "b.json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);

    // Other protocols are unaffected.
    assert_eq!(load(&f, 1).unwrap().name, "a");
}

#[test]
fn dependencies_panic_unwinds_scope() {
    let f = fixture(
        &[(1, json!({ "name": "a", "panic_deps": true }))],
        DatabaseConfig::default(),
    );

    let mut ctx = DependencyContext::new();
    let err = f
        .db
        .load_with(&loc(1), ResourceType::of::<Node>(), &mut ctx)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(ctx.scope_depth(), 0);
    assert_eq!(ctx.depth(), 0);
    assert!(matches!(ctx.cached(&loc(1)), Some(Cached::Failed(_))));
    assert_eq!(f.stats.released.load(Ordering::SeqCst), 1);
}

#[test]
fn rejected_patch_in_cycle() {
    let a = json!({
        "name": "a",
        "reject": true,
        "deps": [{ "key": "b", "ref": loc(2).to_string() }],
    });
    let f = fixture(
        &[(1, a), (2, node("b", &[("a", 1)]))],
        DatabaseConfig::default(),
    );

    let mut ctx = DependencyContext::new();
    let err = f
        .db
        .load_with(&loc(1), ResourceType::of::<Node>(), &mut ctx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);

    assert!(matches!(ctx.cached(&loc(1)), Some(Cached::Failed(_))));
    let b = match ctx.cached(&loc(2)) {
        Some(Cached::Completed(b)) => b.clone(),
        _ => panic!("Dependency must be completed"),
    };

    // `b` keeps partial object of `a` it was patched with.
    let a_partial = f.stats.partial_of("a").unwrap();
    let back = b.downcast_ref::<Node>().unwrap().link("a").unwrap();
    assert!(Resource::ptr_eq(&back, &a_partial));
    assert!(!a_partial.downcast_ref::<Node>().unwrap().has_link("b"));

    assert_eq!(ctx.depth(), 0);
    assert_eq!(ctx.scope_depth(), 0);
}

#[test]
fn strict_failure_in_cycle() {
    let f = fixture(
        &[
            (1, node("a", &[("b", 2)])),
            (2, node("b", &[("a", 1), ("lost", 42)])),
        ],
        DatabaseConfig::strict(),
    );

    let mut ctx = DependencyContext::new();
    let err = f
        .db
        .load_with(&loc(1), ResourceType::of::<Node>(), &mut ctx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnmappedResourceGuid);

    for n in [1, 2, 42] {
        match ctx.cached(&loc(n)) {
            Some(Cached::Failed(err)) => {
                assert_eq!(err.kind(), ErrorKind::UnmappedResourceGuid)
            }
            _ => panic!("'{}' must be failed", loc(n)),
        }
    }
    assert_eq!(f.stats.imports_of("a"), 1);
    assert_eq!(f.stats.imports_of("b"), 1);
    assert_eq!(ctx.depth(), 0);
    assert_eq!(ctx.scope_depth(), 0);
}

#[test]
fn best_effort_dependencies() {
    let f = fixture(
        &[(1, node("a", &[("lost", 42), ("b", 2)])), (2, node("b", &[]))],
        DatabaseConfig::default(),
    );

    let a = load(&f, 1).unwrap();
    assert!(a.has_link("lost"));
    assert!(a.link("lost").is_none());
    assert!(a.link("b").is_some());
}

#[test]
fn strict_dependencies() {
    let f = fixture(
        &[(1, node("a", &[("b", 2), ("lost", 42)])), (2, node("b", &[]))],
        DatabaseConfig::strict(),
    );

    let err = load(&f, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnmappedResourceGuid);
}

#[test]
fn failures_are_cached_in_context() {
    let f = fixture(
        &[
            (1, node("a", &[("broken", 3), ("b", 2)])),
            (2, node("b", &[("broken", 3)])),
            (3, json!({ "name": "broken", "reject": true })),
        ],
        DatabaseConfig::default(),
    );

    let mut ctx = DependencyContext::new();
    let a = f
        .db
        .load_with(&loc(1), ResourceType::of::<Node>(), &mut ctx)
        .unwrap();

    assert_eq!(f.stats.imports_of("broken"), 1);
    assert!(a.downcast_ref::<Node>().unwrap().link("broken").is_none());

    match ctx.cached(&loc(3)) {
        Some(Cached::Failed(err)) => assert_eq!(err.kind(), ErrorKind::Unknown),
        _ => panic!("Failure must be cached"),
    }
    assert!(matches!(ctx.cached(&loc(1)), Some(Cached::Completed(_))));
    assert_eq!(ctx.depth(), 0);
    assert_eq!(ctx.scope_depth(), 0);

    // Loading again within the same context returns cached outcomes.
    let again = f
        .db
        .load_with(&loc(1), ResourceType::of::<Node>(), &mut ctx)
        .unwrap();
    assert!(Resource::ptr_eq(&a, &again));
    let err = f
        .db
        .load_with(&loc(3), ResourceType::of::<Node>(), &mut ctx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(f.stats.imports_of("a"), 1);
}

#[test]
fn importer_order_and_unregister() {
    let mut f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    let first = f.db.register_resource_importer(LabelImporter("first"));
    let second = f.db.register_resource_importer(LabelImporter("second"));
    assert_ne!(first, second);

    // Node importer was registered before both.
    assert_eq!(
        f.db.try_get_resource_importer(&loc(1), ResourceType::of::<Node>())
            .and_then(|id| f.db.importer_name(id)),
        Some("node")
    );

    let label = f.db.load::<Label>(&loc(1)).unwrap();
    assert_eq!(label.0, "first");

    assert!(f.db.unregister_resource_importer(first));
    assert!(!f.db.unregister_resource_importer(first));

    let label = f.db.load::<Label>(&loc(1)).unwrap();
    assert_eq!(label.0, "second");
}

#[test]
fn wrong_object_type() {
    struct Liar;

    impl Importer for Liar {
        type Raw = ();

        fn can_import(&self, _location: &Location, ty: ResourceType) -> bool {
            ty.is::<Node>()
        }

        fn raw_import(&self, _streams: &mut Streams) -> Result<(), ImportError> {
            Ok(())
        }

        fn import_partially(&self, _raw: &()) -> Result<Resource, ImportError> {
            Ok(Resource::new(Label("not a node")))
        }
    }

    let mut db = Database::new();
    db.register_identifier_catalogue(MEM, MemoryCatalogue::from_entries([(id(1), "a")]))
        .unwrap();
    db.register_protocol_provider(MEM, |_: &str, _: ResourceType| -> Option<Streams> {
        Some(Streams::new(std::io::empty()))
    })
    .unwrap();
    db.register_resource_importer(Liar);

    let err = db.load::<Node>(&loc(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyResult);
}

#[test]
fn load_by_type_name() {
    let mut f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    f.db.register_resource_type::<Node>("node").unwrap();
    assert_eq!(
        f.db.register_resource_type::<Label>("node"),
        Err(RegisterError::TypeNameTaken {
            name: "node".to_owned()
        })
    );

    let a = f.db.load_named(&loc(1), "node").unwrap();
    assert_eq!(a.downcast_ref::<Node>().unwrap().name, "a");

    let err = f.db.load_named(&loc(1), "mesh").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullResourceType);
}

#[test]
fn exclusive_registration() {
    let mut f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    assert_eq!(
        f.db.register_identifier_catalogue(MEM, MemoryCatalogue::new()),
        Err(RegisterError::CatalogueTaken {
            protocol: MEM.to_owned()
        })
    );
    assert_eq!(
        f.db.register_protocol_provider(MEM, |_: &str, _: ResourceType| -> Option<Streams> {
            None
        }),
        Err(RegisterError::ProviderTaken {
            protocol: MEM.to_owned()
        })
    );

    assert!(f.db.unregister_identifier_catalogue(MEM).is_some());
    assert!(f.db.try_get_identifier_catalogue(MEM).is_none());
    assert_eq!(load(&f, 1).unwrap_err().kind(), ErrorKind::MissingCatalogue);

    f.db.register_identifier_catalogue(MEM, MemoryCatalogue::from_entries([(id(1), "x")]))
        .unwrap();
    assert!(f.db.unregister_protocol_provider(MEM).is_some());
    assert!(f.db.try_get_protocol_provider(MEM).is_none());
    assert_eq!(
        load(&f, 1).unwrap_err().kind(),
        ErrorKind::MissingProtocolProvider
    );
}

#[test]
fn protocol_must_fit_location() {
    let mut f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());

    let no_streams = |_: &str, _: ResourceType| -> Option<Streams> { None };

    for protocol in ["", "mem:2"] {
        assert_eq!(
            f.db.register_identifier_catalogue(protocol, MemoryCatalogue::new()),
            Err(RegisterError::InvalidProtocol {
                protocol: protocol.to_owned()
            })
        );
        assert_eq!(
            f.db.register_protocol_provider(protocol, no_streams),
            Err(RegisterError::InvalidProtocol {
                protocol: protocol.to_owned()
            })
        );
        assert!(f.db.try_get_identifier_catalogue(protocol).is_none());
        assert!(f.db.try_get_protocol_provider(protocol).is_none());
    }

    assert_eq!(
        f.db.locate(MEM, &path(1)).unwrap().to_string().parse::<Location>(),
        Ok(loc(1))
    );
}

#[test]
fn dispose_resources() {
    static DISPOSED: AtomicUsize = AtomicUsize::new(0);

    struct Panicky;

    impl Disposer for Panicky {
        fn can_dispose(&self, resource: &Resource) -> bool {
            resource.is::<Label>()
        }

        fn dispose(&self, _resource: Resource) {
            panic!("cannot dispose labels");
        }
    }

    let mut f = fixture(&[(1, node("a", &[]))], DatabaseConfig::default());
    let disposer = f
        .db
        .register_resource_disposer(DisposeFn::new(|node: Arc<Node>| {
            assert_eq!(node.name, "a");
            DISPOSED.fetch_add(1, Ordering::SeqCst);
        }));
    f.db.register_resource_disposer(Panicky);

    let a = f.db.load_dyn(&loc(1), ResourceType::of::<Node>()).unwrap();
    assert_eq!(f.db.try_get_resource_disposer(&a), Some(disposer));
    assert!(f.db.dispose(a));
    assert_eq!(DISPOSED.load(Ordering::SeqCst), 1);

    assert!(!f.db.dispose(Resource::new(42u32)));
    assert!(!f.db.dispose(Resource::new(Label("x"))));

    assert!(f.db.unregister_resource_disposer(disposer));
    let a = f.db.load_dyn(&loc(1), ResourceType::of::<Node>()).unwrap();
    assert!(!f.db.dispose(a));
}
