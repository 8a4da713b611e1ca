use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while loading one or more ROM images into memory.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is {size} bytes, which does not fit at offset {offset:#06x} in a 64 KiB address space")]
    TooLarge {
        path: PathBuf,
        size: usize,
        offset: u16,
    },
}
