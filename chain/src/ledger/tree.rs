// chain/src/ledger/tree.rs

//! Block tree with dangling blocks, branch pruning and tip caches.
//!
//! The tree is an arena of nodes addressed by slot index, with a hash
//! index on the side. Every attached block has exactly one parent slot
//! except genesis. Blocks whose parent is unknown wait in a dangling set
//! keyed by the missing parent's hash until the parent arrives.
//!
//! Each leaf carries a [`Registrations`] cache that equals the replay of
//! its branch from genesis. Interior blocks never carry a cache.
//!
//! Pruned branches are remembered by hash so that re-delivered blocks are
//! recognised. Only the most recent [`MAX_DEAD_BRANCHES`] are kept; older
//! ones are forgotten along with every hash that belonged to them.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use thiserror::Error;

use super::registry::Registrations;
use crate::types::{Block, BlockHash, PublicKey};

/// Pruned branches remembered before the oldest is forgotten.
pub const MAX_DEAD_BRANCHES: usize = 256;

/// Errors raised when a block cannot be placed in the tree at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("block at index {0} is not sealed")]
    Unsealed(u64),
    #[error("a genesis block is already present")]
    SecondGenesis,
    #[error("genesis block cannot be pruned")]
    PruneGenesis,
    #[error("unknown block {0}")]
    UnknownBlock(BlockHash),
}

/// Outcome of [`Chain::attach`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The block is now part of the tree.
    Attached,
    /// The parent is unknown; the block waits for it.
    Dangling,
    /// The block is already attached or already dangling.
    AlreadyPresent,
}

struct Node {
    block: Block,
    hash: BlockHash,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Root of a pruned subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeadBranch {
    pub hash: BlockHash,
    pub parent: BlockHash,
    pub index: u64,
}

/// Result of [`Chain::prune_branch`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pruned {
    /// Attached blocks taken out of the tree, root first.
    pub removed: Vec<BlockHash>,
    /// Hashes of older dead branches that are no longer remembered.
    pub forgotten: Vec<BlockHash>,
}

/// Tree of sealed blocks rooted at genesis.
#[derive(Default)]
pub struct Chain {
    nodes: Vec<Option<Node>>,
    /// Slots emptied by pruning, reused by later attaches.
    free: Vec<usize>,
    by_hash: HashMap<BlockHash, usize>,
    genesis: Option<usize>,
    /// Blocks waiting for their parent, keyed by the parent hash.
    dangling: HashMap<BlockHash, Vec<Block>>,
    dangling_hashes: HashSet<BlockHash>,
    tip_caches: HashMap<BlockHash, Registrations>,
    dead_branches: VecDeque<DeadBranch>,
    /// Every pruned hash, mapped to the root of its dead branch.
    pruned: HashMap<BlockHash, BlockHash>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a sealed block.
    ///
    /// Index 0 becomes the genesis if none exists yet. Any other block
    /// attaches under its parent or, if the parent is unknown, joins the
    /// dangling set. Attaching a block never pulls its dangling children
    /// in; callers decide via [`Chain::take_dangling_children`].
    pub fn attach(&mut self, block: Block) -> Result<AttachOutcome, ChainError> {
        let hash = block.hash.ok_or(ChainError::Unsealed(block.header.index))?;
        if self.by_hash.contains_key(&hash) || self.dangling_hashes.contains(&hash) {
            return Ok(AttachOutcome::AlreadyPresent);
        }

        if block.header.index == 0 {
            if self.genesis.is_some() {
                return Err(ChainError::SecondGenesis);
            }
            let mut registrations = Registrations::new();
            registrations.apply_block(&block);
            let slot = self.insert_node(block, hash, None);
            self.genesis = Some(slot);
            self.tip_caches.insert(hash, registrations);
            tracing::debug!(%hash, "attached genesis");
            return Ok(AttachOutcome::Attached);
        }

        let parent_hash = block.header.previous_hash;
        let Some(&parent_slot) = self.by_hash.get(&parent_hash) else {
            tracing::debug!(index = block.header.index, %hash, parent = %parent_hash, "parent unknown; block dangling");
            self.dangling_hashes.insert(hash);
            self.dangling.entry(parent_hash).or_default().push(block);
            return Ok(AttachOutcome::Dangling);
        };

        let parent_was_leaf = self.node(parent_slot).children.is_empty();
        let mut registrations = if parent_was_leaf {
            match self.tip_caches.remove(&parent_hash) {
                Some(cache) => cache,
                None => self.replay(parent_slot),
            }
        } else {
            self.replay(parent_slot)
        };
        registrations.apply_block(&block);

        let index = block.header.index;
        let slot = self.insert_node(block, hash, Some(parent_slot));
        self.node_mut(parent_slot).children.push(slot);
        self.tip_caches.insert(hash, registrations);
        tracing::debug!(index, %hash, "attached block");
        Ok(AttachOutcome::Attached)
    }

    fn insert_node(&mut self, block: Block, hash: BlockHash, parent: Option<usize>) -> usize {
        let node = Node {
            block,
            hash,
            parent,
            children: Vec::new(),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.by_hash.insert(hash, slot);
        slot
    }

    /// Live slots always hold a node; pruned slots are never addressed.
    fn node(&self, slot: usize) -> &Node {
        match self.nodes.get(slot) {
            Some(Some(node)) => node,
            _ => unreachable!("slot {slot} is not live"),
        }
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node {
        match self.nodes.get_mut(slot) {
            Some(Some(node)) => node,
            _ => unreachable!("slot {slot} is not live"),
        }
    }

    /// Removes and returns the blocks that were waiting for `parent`.
    pub fn take_dangling_children(&mut self, parent: &BlockHash) -> Vec<Block> {
        let blocks = self.dangling.remove(parent).unwrap_or_default();
        for block in &blocks {
            if let Some(hash) = block.hash {
                self.dangling_hashes.remove(&hash);
            }
        }
        blocks
    }

    pub fn genesis(&self) -> Option<&Block> {
        self.genesis.map(|slot| &self.node(slot).block)
    }

    /// Number of attached blocks.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn dangling_count(&self) -> usize {
        self.dangling_hashes.len()
    }

    pub fn is_dangling(&self, hash: &BlockHash) -> bool {
        self.dangling_hashes.contains(hash)
    }

    /// Returns `true` if the block belonged to a remembered pruned branch.
    pub fn is_pruned(&self, hash: &BlockHash) -> bool {
        self.pruned.contains_key(hash)
    }

    /// The remembered dead branch rooted at `hash`, if any.
    pub fn dead_branch(&self, hash: &BlockHash) -> Option<&DeadBranch> {
        self.dead_branches.iter().find(|d| &d.hash == hash)
    }

    /// Files `block` under the pruned branch of its parent, together with
    /// every block dangling below it. Returns `false` and does nothing if
    /// the parent is not pruned.
    pub fn discard_pruned_descendant(&mut self, block: &Block) -> bool {
        let Some(hash) = block.hash else {
            return false;
        };
        let Some(&root) = self.pruned.get(&block.header.previous_hash) else {
            return false;
        };
        self.pruned.insert(hash, root);
        self.drop_dangling_below(vec![hash], root);
        true
    }

    /// Drops every block dangling, transitively, on one of `hashes`.
    fn drop_dangling_below(&mut self, mut hashes: Vec<BlockHash>, root: BlockHash) {
        while let Some(h) = hashes.pop() {
            for block in self.dangling.remove(&h).unwrap_or_default() {
                if let Some(bh) = block.hash {
                    self.dangling_hashes.remove(&bh);
                    self.pruned.insert(bh, root);
                    hashes.push(bh);
                }
            }
        }
    }

    pub fn find_by_hash(&self, hash: &BlockHash) -> Option<&Block> {
        self.by_hash.get(hash).map(|&slot| &self.node(slot).block)
    }

    /// First block with `index` in breadth-first order from genesis.
    pub fn find_by_index(&self, index: u64) -> Option<&Block> {
        self.bfs_slots()
            .into_iter()
            .map(|slot| &self.node(slot).block)
            .find(|block| block.header.index == index)
    }

    fn bfs_slots(&self) -> Vec<usize> {
        let Some(root) = self.genesis else {
            return Vec::new();
        };
        self.bfs_from(root)
    }

    fn bfs_from(&self, root: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(slot) = queue.pop_front() {
            order.push(slot);
            queue.extend(self.node(slot).children.iter().copied());
        }
        order
    }

    /// Blocks without children, in breadth-first order.
    pub fn leaves(&self) -> Vec<&Block> {
        self.bfs_slots()
            .into_iter()
            .map(|slot| self.node(slot))
            .filter(|node| node.children.is_empty())
            .map(|node| &node.block)
            .collect()
    }

    /// The leaf with the highest index. Ties go to the earlier leaf in
    /// breadth-first order.
    pub fn latest_block(&self) -> Option<&Block> {
        self.leaves()
            .into_iter()
            .fold(None, |best: Option<&Block>, leaf| match best {
                Some(b) if b.header.index >= leaf.header.index => Some(b),
                _ => Some(leaf),
            })
    }

    /// `hash` and all its descendants, root first, breadth-first.
    pub fn subtree(&self, hash: &BlockHash) -> Vec<&Block> {
        self.by_hash
            .get(hash)
            .map(|&slot| {
                self.bfs_from(slot)
                    .into_iter()
                    .map(|s| &self.node(s).block)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Walks from genesis down the single-child path and returns the
    /// first block with more than one child, or the tip if there is none.
    pub fn first_branching_block(&self) -> Option<&Block> {
        let mut slot = self.genesis?;
        loop {
            let node = self.node(slot);
            match node.children.as_slice() {
                [only] => slot = *only,
                _ => return Some(&node.block),
            }
        }
    }

    /// Up to `depth` blocks walking back from `hash`, starting with it.
    pub fn ancestors(&self, hash: &BlockHash, depth: usize) -> Vec<&Block> {
        let mut out = Vec::new();
        let mut cursor = self.by_hash.get(hash).copied();
        while let Some(slot) = cursor {
            if out.len() == depth {
                break;
            }
            let node = self.node(slot);
            out.push(&node.block);
            cursor = node.parent;
        }
        out
    }

    /// Slots on the path genesis..=slot, genesis first.
    fn path_to(&self, slot: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cursor = Some(slot);
        while let Some(s) = cursor {
            path.push(s);
            cursor = self.node(s).parent;
        }
        path.reverse();
        path
    }

    fn replay(&self, slot: usize) -> Registrations {
        let mut registrations = Registrations::new();
        for s in self.path_to(slot) {
            registrations.apply_block(&self.node(s).block);
        }
        registrations
    }

    /// Registrations as of `hash`. Leaves answer from their cache;
    /// interior blocks are replayed from genesis.
    pub fn registrations_at(&self, hash: &BlockHash) -> Option<Registrations> {
        if let Some(cache) = self.tip_caches.get(hash) {
            return Some(cache.clone());
        }
        self.by_hash.get(hash).map(|&slot| self.replay(slot))
    }

    /// Replays the caches up to the first block at `index`.
    pub fn registration_caches_for(&self, index: u64) -> Option<Registrations> {
        let hash = self.find_by_index(index)?.hash?;
        self.registrations_at(&hash)
    }

    /// Cached registrations of a leaf.
    pub fn tip_registrations(&self, leaf: &BlockHash) -> Option<&Registrations> {
        self.tip_caches.get(leaf)
    }

    /// Admission order per leaf.
    pub fn get_admissions(&self) -> Vec<(BlockHash, Vec<PublicKey>)> {
        self.per_leaf(Registrations::admission_order)
    }

    /// Doctor set per leaf.
    pub fn get_doctors(&self) -> Vec<(BlockHash, Vec<PublicKey>)> {
        self.per_leaf(|r| r.doctors().into_iter().collect())
    }

    /// Vaccine set per leaf.
    pub fn get_vaccines(&self) -> Vec<(BlockHash, Vec<String>)> {
        self.per_leaf(|r| r.vaccines().into_iter().collect())
    }

    fn per_leaf<T>(&self, f: impl Fn(&Registrations) -> T) -> Vec<(BlockHash, T)> {
        self.leaves()
            .into_iter()
            .filter_map(|leaf| {
                let hash = leaf.hash?;
                let cache = self.tip_caches.get(&hash)?;
                Some((hash, f(cache)))
            })
            .collect()
    }

    /// Removes `hash` and its whole subtree.
    ///
    /// The root is recorded as a dead branch. Blocks dangling on any
    /// removed block are dropped too. If the parent becomes a leaf its
    /// cache is rebuilt.
    pub fn prune_branch(&mut self, hash: &BlockHash) -> Result<Pruned, ChainError> {
        let &root = self
            .by_hash
            .get(hash)
            .ok_or(ChainError::UnknownBlock(*hash))?;
        let parent = self.node(root).parent.ok_or(ChainError::PruneGenesis)?;

        let dead = DeadBranch {
            hash: *hash,
            parent: self.node(parent).hash,
            index: self.node(root).block.header.index,
        };

        let mut removed = Vec::new();
        for slot in self.bfs_from(root) {
            if let Some(node) = self.nodes[slot].take() {
                self.by_hash.remove(&node.hash);
                self.tip_caches.remove(&node.hash);
                self.pruned.insert(node.hash, *hash);
                self.free.push(slot);
                removed.push(node.hash);
            }
        }
        self.drop_dangling_below(removed.clone(), *hash);

        let parent_node = self.node_mut(parent);
        parent_node.children.retain(|&c| c != root);
        if parent_node.children.is_empty() {
            let parent_hash = parent_node.hash;
            let cache = self.replay(parent);
            self.tip_caches.insert(parent_hash, cache);
        }

        self.dead_branches.push_back(dead);
        let mut forgotten = Vec::new();
        while self.dead_branches.len() > MAX_DEAD_BRANCHES {
            let Some(oldest) = self.dead_branches.pop_front() else {
                break;
            };
            self.pruned.retain(|h, r| {
                if *r == oldest.hash {
                    forgotten.push(*h);
                    false
                } else {
                    true
                }
            });
        }

        tracing::info!(root = %hash, index = dead.index, removed = removed.len(), "pruned branch");
        Ok(Pruned { removed, forgotten })
    }

    /// Roots of pruned branches at or above `index`.
    pub fn dead_branches_since(&self, index: u64) -> Vec<BlockHash> {
        self.dead_branches
            .iter()
            .filter(|d| d.index >= index)
            .map(|d| d.hash)
            .collect()
    }

    fn fmt_subtree(&self, f: &mut fmt::Formatter<'_>, slot: usize, depth: usize) -> fmt::Result {
        let node = self.node(slot);
        writeln!(
            f,
            "{:indent$}{} {} ({} txs, {})",
            "",
            node.block.header.index,
            node.hash,
            node.block.transactions.len(),
            node.block.header.creator.short(),
            indent = depth * 2
        )?;
        for &child in &node.children {
            self.fmt_subtree(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.genesis {
            Some(root) => self.fmt_subtree(f, root, 0),
            None => writeln!(f, "<empty chain>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::types::{Permission, PermissionTransaction, Transaction, WireFormat};

    const VERSION: &str = "0.0.1";

    fn keypair(seed: u8) -> Keypair {
        Keypair::from_seed(&[seed; 32])
    }

    fn genesis(kp: &Keypair) -> Block {
        Block::genesis(kp, VERSION, 100, &WireFormat::default())
    }

    fn child(parent: &Block, creator: &Keypair, ts: u64, txs: Vec<Transaction>) -> Block {
        let fmt = WireFormat::default();
        let mut block = Block::successor_of(parent, VERSION, creator.public_key().clone(), ts)
            .expect("parent sealed");
        for tx in txs {
            block.add_transaction(tx).expect("unsealed");
        }
        block.sign(creator, &fmt).expect("sign");
        block.update_hash(&fmt).expect("seal");
        block
    }

    fn admission(k: &Keypair) -> Transaction {
        PermissionTransaction::new(VERSION, 1, Permission::Admission, k.public_key().clone())
            .sign(k)
            .into()
    }

    fn hash(b: &Block) -> BlockHash {
        b.hash.expect("sealed")
    }

    #[test]
    fn attach_linear_chain_and_lookup() {
        let a = keypair(1);
        let g = genesis(&a);
        let b1 = child(&g, &a, 105, vec![]);
        let b2 = child(&b1, &a, 110, vec![]);

        let mut chain = Chain::new();
        assert_eq!(chain.attach(g.clone()), Ok(AttachOutcome::Attached));
        assert_eq!(chain.attach(b1.clone()), Ok(AttachOutcome::Attached));
        assert_eq!(chain.attach(b2.clone()), Ok(AttachOutcome::Attached));
        assert_eq!(chain.attach(b2.clone()), Ok(AttachOutcome::AlreadyPresent));

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.find_by_index(1), Some(&b1));
        assert_eq!(chain.find_by_hash(&hash(&b2)), Some(&b2));
        assert_eq!(chain.leaves(), vec![&b2]);
        assert_eq!(chain.latest_block(), Some(&b2));
        assert!(chain.tip_registrations(&hash(&b1)).is_none());
        assert!(chain.tip_registrations(&hash(&b2)).is_some());
    }

    #[test]
    fn unsealed_block_and_second_genesis_are_rejected() {
        let a = keypair(1);
        let g = genesis(&a);
        let mut chain = Chain::new();
        chain.attach(g.clone()).expect("genesis");

        let unsealed = Block::successor_of(&g, VERSION, a.public_key().clone(), 1).expect("sealed");
        assert_eq!(chain.attach(unsealed), Err(ChainError::Unsealed(1)));
        assert_eq!(
            chain.attach(Block::genesis(&keypair(2), VERSION, 1, &WireFormat::default())),
            Err(ChainError::SecondGenesis)
        );
    }

    #[test]
    fn dangling_blocks_reattach_transitively() {
        let a = keypair(1);
        let g = genesis(&a);
        let b1 = child(&g, &a, 105, vec![]);
        let b2 = child(&b1, &a, 110, vec![]);
        let b3 = child(&b2, &a, 115, vec![]);

        let mut chain = Chain::new();
        chain.attach(g).expect("genesis");
        assert_eq!(chain.attach(b3.clone()), Ok(AttachOutcome::Dangling));
        assert_eq!(chain.attach(b2.clone()), Ok(AttachOutcome::Dangling));
        assert_eq!(chain.attach(b3.clone()), Ok(AttachOutcome::AlreadyPresent));
        assert_eq!(chain.dangling_count(), 2);

        let mut pending = vec![b1.clone()];
        while let Some(block) = pending.pop() {
            let h = hash(&block);
            assert_eq!(chain.attach(block), Ok(AttachOutcome::Attached));
            pending.extend(chain.take_dangling_children(&h));
        }

        assert_eq!(chain.dangling_count(), 0);
        assert_eq!(chain.latest_block(), Some(&b3));
    }

    #[test]
    fn fork_keeps_separate_caches_per_leaf() {
        let (a, b) = (keypair(1), keypair(2));
        let g = genesis(&a);
        let left = child(&g, &a, 105, vec![admission(&b)]);
        let right = child(&g, &a, 106, vec![]);

        let mut chain = Chain::new();
        chain.attach(g.clone()).expect("genesis");
        chain.attach(left.clone()).expect("left");
        chain.attach(right.clone()).expect("right");

        let admissions = chain.get_admissions();
        assert_eq!(admissions.len(), 2);
        assert_eq!(admissions[0], (hash(&left), vec![b.public_key().clone(), a.public_key().clone()]));
        assert_eq!(admissions[1], (hash(&right), vec![a.public_key().clone()]));
        assert_eq!(chain.first_branching_block(), Some(&g));
    }

    #[test]
    fn prune_removes_subtree_and_restores_parent_cache() {
        let (a, b) = (keypair(1), keypair(2));
        let g = genesis(&a);
        let b1 = child(&g, &a, 105, vec![admission(&b)]);
        let b2 = child(&b1, &b, 110, vec![]);

        let mut chain = Chain::new();
        chain.attach(g.clone()).expect("genesis");
        chain.attach(b1.clone()).expect("b1");
        chain.attach(b2.clone()).expect("b2");

        let pruned = chain.prune_branch(&hash(&b1)).expect("prune");
        assert_eq!(pruned.removed, vec![hash(&b1), hash(&b2)]);
        assert!(pruned.forgotten.is_empty());
        assert!(chain.find_by_hash(&hash(&b2)).is_none());
        assert!(chain.is_pruned(&hash(&b2)));
        assert_eq!(chain.leaves(), vec![&g]);
        assert_eq!(
            chain.tip_registrations(&hash(&g)).map(Registrations::admission_order),
            Some(vec![a.public_key().clone()])
        );
        assert_eq!(chain.dead_branches_since(1), vec![hash(&b1)]);
        assert_eq!(chain.dead_branch(&hash(&b1)).map(|d| d.parent), Some(hash(&g)));
        assert_eq!(chain.prune_branch(&hash(&g)), Err(ChainError::PruneGenesis));
    }

    #[test]
    fn pruning_drops_blocks_dangling_below_the_branch() {
        let a = keypair(1);
        let g = genesis(&a);
        let b1 = child(&g, &a, 105, vec![]);
        let b2 = child(&b1, &a, 110, vec![]);
        let b3 = child(&b2, &a, 115, vec![]);

        let mut chain = Chain::new();
        chain.attach(g).expect("genesis");
        chain.attach(b1.clone()).expect("b1");
        chain.attach(b3.clone()).expect("b3 dangles on b2");
        chain.attach(b2.clone()).expect("b2");
        // b3 is still dangling: nobody pulled it in.
        chain.prune_branch(&hash(&b1)).expect("prune");

        assert_eq!(chain.dangling_count(), 0);
        assert!(chain.is_pruned(&hash(&b3)));
    }

    #[test]
    fn interior_registrations_are_replayed() {
        let (a, b) = (keypair(1), keypair(2));
        let g = genesis(&a);
        let b1 = child(&g, &a, 105, vec![admission(&b)]);
        let b2 = child(&b1, &b, 110, vec![]);

        let mut chain = Chain::new();
        for block in [g, b1, b2] {
            chain.attach(block).expect("attach");
        }

        let at1 = chain.registration_caches_for(1).expect("index 1");
        assert_eq!(at1.admission_order(), vec![b.public_key().clone(), a.public_key().clone()]);
        let at2 = chain.registration_caches_for(2).expect("index 2");
        assert_eq!(at2.admission_order(), vec![a.public_key().clone(), b.public_key().clone()]);
        assert!(chain.registration_caches_for(3).is_none());
    }

    #[test]
    fn display_renders_one_line_per_block() {
        let a = keypair(1);
        let g = genesis(&a);
        let b1 = child(&g, &a, 105, vec![]);
        let mut chain = Chain::new();
        chain.attach(g).expect("genesis");
        chain.attach(b1).expect("b1");

        let rendered = chain.to_string();
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.lines().nth(1).expect("second line").starts_with("  1 "));
    }

    #[test]
    fn descendants_of_pruned_blocks_join_the_dead_branch() {
        let a = keypair(1);
        let g = genesis(&a);
        let b1 = child(&g, &a, 105, vec![]);
        let b2 = child(&b1, &a, 110, vec![]);
        let b3 = child(&b2, &a, 115, vec![]);

        let mut chain = Chain::new();
        chain.attach(g.clone()).expect("genesis");
        chain.attach(b1.clone()).expect("b1");
        chain.prune_branch(&hash(&b1)).expect("prune");

        // b3 arrives first and dangles on b2, which only then shows up.
        assert_eq!(chain.attach(b3.clone()), Ok(AttachOutcome::Dangling));
        assert!(!chain.discard_pruned_descendant(&b3));
        assert!(chain.discard_pruned_descendant(&b2));

        assert_eq!(chain.dangling_count(), 0);
        assert!(chain.is_pruned(&hash(&b2)));
        assert!(chain.is_pruned(&hash(&b3)));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn pruned_slots_are_reused() {
        let a = keypair(1);
        let g = genesis(&a);
        let left = child(&g, &a, 105, vec![]);
        let right = child(&g, &a, 106, vec![]);

        let mut chain = Chain::new();
        chain.attach(g.clone()).expect("genesis");
        chain.attach(left.clone()).expect("left");
        chain.prune_branch(&hash(&left)).expect("prune");
        chain.attach(right.clone()).expect("right");

        assert_eq!(chain.nodes.len(), 2);
        assert_eq!(chain.leaves(), vec![&right]);
        assert_eq!(chain.find_by_hash(&hash(&right)), Some(&right));
    }

    #[test]
    fn oldest_dead_branches_are_forgotten() {
        let a = keypair(1);
        let g = genesis(&a);
        let mut chain = Chain::new();
        chain.attach(g.clone()).expect("genesis");

        let mut roots = Vec::new();
        for i in 0..=MAX_DEAD_BRANCHES as u64 {
            let b = child(&g, &a, 200 + i, vec![]);
            chain.attach(b.clone()).expect("attach");
            let pruned = chain.prune_branch(&hash(&b)).expect("prune");
            roots.push(hash(&b));
            if i < MAX_DEAD_BRANCHES as u64 {
                assert!(pruned.forgotten.is_empty());
            } else {
                assert_eq!(pruned.forgotten, vec![roots[0]]);
            }
        }

        assert!(!chain.is_pruned(&roots[0]));
        assert!(chain.dead_branch(&roots[0]).is_none());
        assert!(chain.is_pruned(&roots[MAX_DEAD_BRANCHES]));
        assert_eq!(chain.dead_branches_since(0).len(), MAX_DEAD_BRANCHES);
    }
}
