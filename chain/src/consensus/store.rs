//! Storage abstraction used by the consensus engine.

use crate::storage::StorageError;
use crate::types::{Block, BlockHash};

/// Abstract persistence interface used by the consensus engine.
///
/// Persisted blocks are append-only: pruning a branch never deletes its
/// files but records the branch root instead. On restart the engine
/// replays [`BlockStore::load_blocks`] through the tree without
/// validation and then prunes every root from
/// [`BlockStore::load_pruned_roots`] again.
pub trait BlockStore {
    /// Persists a sealed block.
    fn put_block(&mut self, block: &Block) -> Result<(), StorageError>;

    /// Returns every persisted block in increasing index order, or `None`
    /// if the store does not hold exactly one genesis block.
    fn load_blocks(&self) -> Result<Option<Vec<Block>>, StorageError>;

    /// Records the root of a pruned branch.
    fn put_pruned_root(&mut self, root: &BlockHash) -> Result<(), StorageError>;

    /// Every recorded pruned root, oldest first.
    fn load_pruned_roots(&self) -> Result<Vec<BlockHash>, StorageError>;
}
