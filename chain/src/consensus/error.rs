use thiserror::Error;

use crate::ledger::ChainError;
use crate::storage::StorageError;
use crate::types::{BlockError, BlockHash, ParseError};

/// Error type returned when a block or transaction fails validation.
///
/// The reason string is the observable diagnostic: it is logged and
/// reflected in the rejecting judgement's log line.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Rule violation with a fixed reason.
    #[error("invalid: {0}")]
    Invalid(&'static str),
    /// Rule violation with a dynamic reason.
    #[error("invalid: {0}")]
    Custom(String),
}

impl ValidationError {
    /// Human-readable reason without the `invalid:` prefix.
    pub fn reason(&self) -> &str {
        match self {
            ValidationError::Invalid(msg) => msg,
            ValidationError::Custom(msg) => msg,
        }
    }
}

/// High-level errors that can occur in the consensus engine.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Underlying validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The block tree refused the block.
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// A block lifecycle precondition was violated.
    #[error(transparent)]
    Block(#[from] BlockError),
    /// Persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// A wire payload could not be decoded.
    #[error("malformed payload: {0}")]
    Parse(#[from] ParseError),
    /// The engine has no genesis block yet.
    #[error("chain has no genesis block")]
    NoGenesis,
    /// A block referenced by hash is not attached.
    #[error("unknown block {0}")]
    UnknownBlock(BlockHash),
}
