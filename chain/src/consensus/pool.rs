//! Pending transaction pool and the set of transactions dropped as invalid.

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::types::Transaction;

/// Invalid transactions remembered before the oldest are forgotten.
const INVALID_CAPACITY: NonZeroUsize = NonZeroUsize::new(4096).unwrap();

/// Abstract transaction pool interface.
///
/// Consensus does not care how pending transactions are stored; it only
/// needs set semantics keyed by full value equality and a deterministic
/// draining order.
pub trait TxPool {
    /// Adds a transaction. Returns `false` if an equal one is pending.
    fn add(&mut self, tx: Transaction) -> bool;

    /// Removes and returns the next pending transaction.
    fn pop(&mut self) -> Option<Transaction>;

    fn contains(&self, tx: &Transaction) -> bool;

    /// Removes every listed transaction that is pending.
    fn discard_multiple(&mut self, txs: &[Transaction]);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-adds a batch, skipping ones already pending.
    fn add_multiple(&mut self, txs: Vec<Transaction>) {
        for tx in txs {
            self.add(tx);
        }
    }
}

/// FIFO transaction pool with a membership index.
#[derive(Default)]
pub struct TransactionPool {
    queue: VecDeque<Transaction>,
    members: HashSet<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TxPool for TransactionPool {
    fn add(&mut self, tx: Transaction) -> bool {
        if !self.members.insert(tx.clone()) {
            return false;
        }
        self.queue.push_back(tx);
        true
    }

    fn pop(&mut self) -> Option<Transaction> {
        let tx = self.queue.pop_front()?;
        self.members.remove(&tx);
        Some(tx)
    }

    fn contains(&self, tx: &Transaction) -> bool {
        self.members.contains(tx)
    }

    fn discard_multiple(&mut self, txs: &[Transaction]) {
        let mut removed = false;
        for tx in txs {
            removed |= self.members.remove(tx);
        }
        if removed {
            let members = &self.members;
            self.queue.retain(|tx| members.contains(tx));
        }
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Transactions diverted out of blocks because they failed validation.
///
/// Only the most recently diverted ones are kept.
pub struct InvalidTransactions {
    recent: LruCache<Transaction, ()>,
}

impl Default for InvalidTransactions {
    fn default() -> Self {
        Self::with_capacity(INVALID_CAPACITY)
    }
}

impl InvalidTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: NonZeroUsize) -> Self {
        Self {
            recent: LruCache::new(cap),
        }
    }

    pub fn insert(&mut self, tx: Transaction) {
        self.recent.put(tx, ());
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.recent.contains(tx)
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}
