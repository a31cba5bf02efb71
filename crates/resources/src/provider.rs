use std::{fmt, io::Read};

use crate::resource::ResourceType;

/// Byte streams backing one resource.
///
/// Dropping `Streams` releases both streams.
pub struct Streams {
    /// Resource data.
    pub primary: Box<dyn Read + Send>,

    /// Side-channel stream with import options, if any.
    pub options: Option<Box<dyn Read + Send>>,
}

impl Streams {
    pub fn new(primary: impl Read + Send + 'static) -> Self {
        Streams {
            primary: Box::new(primary),
            options: None,
        }
    }

    pub fn with_options(mut self, options: impl Read + Send + 'static) -> Self {
        self.options = Some(Box::new(options));
        self
    }

    /// Reads whole primary stream.
    pub fn read_primary(&mut self) -> std::io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.primary.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Reads whole options stream.
    /// Returns `None` if there is no options stream.
    pub fn read_options(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        match &mut self.options {
            None => Ok(None),
            Some(options) => {
                let mut data = Vec::new();
                options.read_to_end(&mut data)?;
                Ok(Some(data))
            }
        }
    }
}

impl fmt::Debug for Streams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streams")
            .field("options", &self.options.is_some())
            .finish_non_exhaustive()
    }
}

/// Opens streams for paths of one protocol.
///
/// Providers may perform I/O and are not assumed to cache anything.
/// Returned streams are owned and released by the caller.
pub trait Provider: Send + Sync + 'static {
    /// Returns streams for the path.
    /// If resource cannot be opened, returns `None`.
    fn provide_streams(&self, path: &str, ty: ResourceType) -> Option<Streams>;
}

impl<F> Provider for F
where
    F: Fn(&str, ResourceType) -> Option<Streams> + Send + Sync + 'static,
{
    fn provide_streams(&self, path: &str, ty: ResourceType) -> Option<Streams> {
        self(path, ty)
    }
}
