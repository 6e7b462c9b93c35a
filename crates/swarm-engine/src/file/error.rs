use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::memory::MemoryError;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("unable to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to query size of {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no space to load {}: {source}", .path.display())]
    Memory {
        path: PathBuf,
        #[source]
        source: MemoryError,
    },

    #[error("failed reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("short read of {}: expected {expected} bytes, got {read}", .path.display())]
    ShortRead {
        path: PathBuf,
        expected: usize,
        read: usize,
    },

    #[error("failed writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
