use std::path::{Path, PathBuf};

use arcana_resources::{
    store::{FileCatalogue, FileProvider},
    Cached, Database, DatabaseConfig, DependencyContext, Location, Resource, ResourceType,
    WeakResource,
};
use clap::{Parser, Subcommand};
use hashbrown::HashSet;
use miette::{Context, IntoDiagnostic};

use self::document::{Document, DocumentImporter};

mod document;

/// Protocol under which files of the root directory are registered.
const PROTOCOL: &str = "file";

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab-case")]
enum Command {
    /// Catalogues all files under the root and prints their ids.
    /// Files without ids get new ones.
    Scan {
        /// Path to the resource root directory.
        #[arg(value_name = "root")]
        root: PathBuf,
    },
    /// Prints location of the file.
    Locate {
        /// Path to the resource root directory.
        #[arg(value_name = "root")]
        root: PathBuf,

        /// Path of the file relative to the root, with `/` separators.
        #[arg(value_name = "path")]
        path: String,
    },
    /// Loads JSON document with all its dependencies and prints dependency tree.
    Resolve {
        /// Path to the resource root directory.
        #[arg(value_name = "root")]
        root: PathBuf,

        /// Location or path of the document.
        #[arg(value_name = "target")]
        target: String,

        /// Path to database config file.
        #[arg(long = "config", value_name = "path")]
        config: Option<PathBuf>,

        /// Fail if any dependency fails to load.
        #[arg(long = "strict")]
        strict: bool,
    },
}

#[derive(Debug, Parser)]
#[command(name = "resdb")]
#[command(about = "Arcana resource database CLI")]
#[command(rename_all = "kebab-case")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() -> miette::Result<()> {
    install_tracing_subscriber();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan { root } => {
            let catalogue = open_catalogue(&root)?;
            for (id, path) in catalogue.entries() {
                println!("{PROTOCOL}:{id} {path}");
            }
        }
        Command::Locate { root, path } => {
            let db = open_database(&root, DatabaseConfig::default())?;
            let location = db.locate(PROTOCOL, &path).into_diagnostic()?;
            println!("{location}");
        }
        Command::Resolve {
            root,
            target,
            config,
            strict,
        } => {
            let mut config = match config {
                None => DatabaseConfig::default(),
                Some(path) => DatabaseConfig::read(&path).into_diagnostic()?,
            };
            if strict {
                config = DatabaseConfig::strict();
            }

            let db = open_database(&root, config)?;

            let location = match target.parse::<Location>() {
                Ok(location) => location,
                Err(_) => db.locate(PROTOCOL, &target).into_diagnostic()?,
            };

            // Context keeps every loaded document alive while tree is printed.
            let mut ctx = DependencyContext::new();
            let document = db
                .load_with(&location, ResourceType::of::<Document>(), &mut ctx)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to resolve '{target}'"))?;

            let mut visited = HashSet::new();
            print_tree(&db, &ctx, &location, None, Some(document), 0, &mut visited);
        }
    }

    Ok(())
}

fn open_catalogue(root: &Path) -> miette::Result<FileCatalogue> {
    FileCatalogue::open(root)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to open resources at '{}'", root.display()))
}

fn open_database(root: &Path, config: DatabaseConfig) -> miette::Result<Database> {
    let catalogue = open_catalogue(root)?;
    let provider = FileProvider::new(catalogue.root());

    let mut db = Database::with_config(config);
    db.register_identifier_catalogue(PROTOCOL, catalogue)
        .into_diagnostic()?;
    db.register_protocol_provider(PROTOCOL, provider)
        .into_diagnostic()?;
    db.register_resource_importer(DocumentImporter);
    db.register_resource_type::<Document>("document")
        .into_diagnostic()?;

    Ok(db)
}

fn print_tree(
    db: &Database,
    ctx: &DependencyContext,
    location: &Location,
    key: Option<&str>,
    resource: Option<Resource>,
    depth: usize,
    visited: &mut HashSet<Location>,
) {
    let indent = "  ".repeat(depth);
    let prefix = match key {
        None => String::new(),
        Some(key) => format!("{key} -> "),
    };
    let path = db.path_of(location).unwrap_or_default();

    let Some(resource) = resource else {
        match ctx.cached(location) {
            Some(Cached::Failed(err)) => {
                println!("{indent}{prefix}{location} {path} (failed: {err})")
            }
            _ => println!("{indent}{prefix}{location} {path} (missing)"),
        }
        return;
    };

    if !visited.insert(location.clone()) {
        println!("{indent}{prefix}{location} {path} (seen)");
        return;
    }

    let Some(document) = resource.downcast_ref::<Document>() else {
        println!("{indent}{prefix}{location} {path} ({})", resource.ty());
        return;
    };

    match document.value.get("name").and_then(|name| name.as_str()) {
        None => println!("{indent}{prefix}{location} {path}"),
        Some(name) => println!("{indent}{prefix}{location} {path} '{name}'"),
    }

    document.with_links(|links| {
        for link in links {
            let target = link.target.as_ref().and_then(WeakResource::upgrade);
            print_tree(
                db,
                ctx,
                &link.location,
                Some(&link.key),
                target,
                depth + 1,
                visited,
            );
        }
    });
}

fn install_tracing_subscriber() {
    use tracing_subscriber::layer::SubscriberExt as _;
    if let Err(err) = tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .finish()
            .with(tracing_error::ErrorLayer::default()),
    ) {
        panic!("Failed to install tracing subscriber: {}", err);
    }
}
