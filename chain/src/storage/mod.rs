//! Storage backends for the chain.
//!
//! This module provides concrete implementations of the
//! [`crate::consensus::store::BlockStore`] trait, including:
//!
//! - an in-memory store ([`mem::InMemoryBlockStore`]) suitable for tests,
//! - a directory-backed store ([`file::FileBlockStore`]) writing one file
//!   per block, named `{index}_{previous_hash}_{hash}`.

use thiserror::Error;

use crate::types::ParseError;

pub mod file;
pub mod mem;

pub use file::{FileBlockStore, FileStoreConfig};
pub use mem::InMemoryBlockStore;

/// Storage-level error type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying filesystem error.
    #[error("block store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A persisted block file could not be decoded.
    #[error("persisted block {file} is malformed: {source}")]
    Corrupted {
        file: String,
        #[source]
        source: ParseError,
    },
    /// Only sealed blocks can be persisted.
    #[error("block at index {0} is not sealed")]
    Unsealed(u64),
}
