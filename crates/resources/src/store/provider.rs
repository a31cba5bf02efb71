use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::{
    provider::{Provider, Streams},
    resource::ResourceType,
};

use super::sidecar::OPTIONS_EXTENSION;

/// Provides streams of files under root directory.
///
/// Paths are the same as in [`FileCatalogue`](super::FileCatalogue).
/// File `<path>.options` next to the resource file becomes options stream.
pub struct FileProvider {
    root: PathBuf,
}

impl FileProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileProvider { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Option<PathBuf> {
        let mut full = self.root.clone();
        for part in path.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    tracing::error!("Path '{}' points outside of '{}'", path, self.root.display());
                    return None;
                }
                part => full.push(part),
            }
        }
        Some(full)
    }
}

impl Provider for FileProvider {
    fn provide_streams(&self, path: &str, _ty: ResourceType) -> Option<Streams> {
        let full = self.full_path(path)?;

        let primary = match File::open(&full) {
            Ok(file) => file,
            Err(err) => {
                tracing::error!("Failed to open '{}'. {:#}", full.display(), err);
                return None;
            }
        };

        let mut streams = Streams::new(BufReader::new(primary));

        let mut options_path = full.into_os_string();
        options_path.push(".");
        options_path.push(OPTIONS_EXTENSION);
        let options_path = PathBuf::from(options_path);

        if options_path.is_file() {
            match File::open(&options_path) {
                Ok(file) => streams = streams.with_options(BufReader::new(file)),
                Err(err) => {
                    tracing::warn!(
                        "Failed to open options '{}'. {:#}",
                        options_path.display(),
                        err
                    );
                }
            }
        }

        Some(streams)
    }
}
