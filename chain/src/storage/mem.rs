//! In-memory block store.
//!
//! This implementation is useful for unit tests and multi-node
//! simulations. It keeps blocks in insertion order and returns them
//! sorted by index on load.

use crate::consensus::store::BlockStore;
use crate::storage::StorageError;
use crate::types::{Block, BlockHash};

/// In-memory implementation of [`BlockStore`].
#[derive(Default)]
pub struct InMemoryBlockStore {
    blocks: Vec<Block>,
    pruned_roots: Vec<BlockHash>,
}

impl InMemoryBlockStore {
    /// Creates a new, empty in-memory block store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if no blocks are stored.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockStore for InMemoryBlockStore {
    fn put_block(&mut self, block: &Block) -> Result<(), StorageError> {
        if !block.is_sealed() {
            return Err(StorageError::Unsealed(block.header.index));
        }
        self.blocks.push(block.clone());
        Ok(())
    }

    fn load_blocks(&self) -> Result<Option<Vec<Block>>, StorageError> {
        let genesis_count = self.blocks.iter().filter(|b| b.header.index == 0).count();
        if genesis_count != 1 {
            return Ok(None);
        }
        let mut blocks = self.blocks.clone();
        blocks.sort_by_key(|b| b.header.index);
        Ok(Some(blocks))
    }

    fn put_pruned_root(&mut self, root: &BlockHash) -> Result<(), StorageError> {
        self.pruned_roots.push(*root);
        Ok(())
    }

    fn load_pruned_roots(&self) -> Result<Vec<BlockHash>, StorageError> {
        Ok(self.pruned_roots.clone())
    }
}
