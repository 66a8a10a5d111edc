//! Time-based round-robin creator election.
//!
//! The same formula answers "whose turn is it now" for the local driver
//! and "was this block's creator legitimate" for received blocks. Time
//! since the branch tip is cut into windows of `block_time` seconds; each
//! window belongs to the next key in the branch's admission order, so a
//! missed window simply hands the turn to the following node.

use crate::ledger::Chain;
use crate::types::{Block, BlockHash, PublicKey};

/// Returns the key obligated to produce the block at `now`, given the
/// branch's admission order and the tip's timestamp.
///
/// Returns `None` for an empty roster or a zero `block_time`. `now` may
/// precede `last_block_timestamp` when checking historical blocks; the
/// window index is floored in that case.
pub fn next_creator(
    admission_order: &[PublicKey],
    last_block_timestamp: u64,
    now: u64,
    block_time: u64,
) -> Option<&PublicKey> {
    if admission_order.is_empty() || block_time == 0 {
        return None;
    }
    let elapsed = now as i128 - last_block_timestamp as i128;
    let slot = elapsed.div_euclid(block_time as i128);
    let idx = slot.rem_euclid(admission_order.len() as i128) as usize;
    admission_order.get(idx)
}

/// The creator `block` should have, judged from its parent's state.
///
/// Returns `None` if the parent is unknown or has no admissions.
pub fn expected_creator(chain: &Chain, block: &Block, block_time: u64) -> Option<PublicKey> {
    let parent = chain.find_by_hash(&block.header.previous_hash)?;
    let registrations = chain.registrations_at(&block.header.previous_hash)?;
    let order = registrations.admission_order();
    next_creator(&order, parent.header.timestamp, block.header.timestamp, block_time).cloned()
}

/// Returns `true` if `block` was produced by the elected creator.
pub fn is_created_by_expected_creator(chain: &Chain, block: &Block, block_time: u64) -> bool {
    expected_creator(chain, block, block_time).is_some_and(|k| k == block.header.creator)
}

/// Elected creator at `now` for every live branch, keyed by leaf hash.
pub fn due_creators(chain: &Chain, now: u64, block_time: u64) -> Vec<(BlockHash, PublicKey)> {
    chain
        .leaves()
        .into_iter()
        .filter_map(|leaf| {
            let hash = leaf.hash?;
            let order = chain.tip_registrations(&hash)?.admission_order();
            let creator = next_creator(&order, leaf.header.timestamp, now, block_time)?;
            Some((hash, creator.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::types::{Permission, PermissionTransaction, WireFormat};

    fn key(byte: u8) -> PublicKey {
        PublicKey(vec![byte; 32])
    }

    #[test]
    fn rotation_follows_elapsed_windows() {
        let order = [key(b'A'), key(b'B'), key(b'C')];

        assert_eq!(next_creator(&order, 100, 112, 5), Some(&key(b'C')));
        assert_eq!(next_creator(&order, 100, 127, 5), Some(&key(b'C')));
        assert_eq!(next_creator(&order, 100, 100, 5), Some(&key(b'A')));
        assert_eq!(next_creator(&order, 100, 105, 5), Some(&key(b'B')));
    }

    #[test]
    fn negative_elapsed_is_floored() {
        let order = [key(1), key(2), key(3)];
        // elapsed -1 => slot -1 => last key.
        assert_eq!(next_creator(&order, 100, 99, 5), Some(&key(3)));
    }

    #[test]
    fn empty_roster_or_zero_block_time_elects_nobody() {
        assert_eq!(next_creator(&[], 0, 10, 5), None);
        assert_eq!(next_creator(&[key(1)], 0, 10, 0), None);
    }

    #[test]
    fn received_block_creator_is_checked_against_parent_state() {
        let fmt = WireFormat::default();
        let a = Keypair::from_seed(&[1; 32]);
        let b = Keypair::from_seed(&[2; 32]);
        let genesis = Block::genesis(&a, "0.0.1", 1_000, &fmt);

        let mut chain = Chain::new();
        chain.attach(genesis.clone()).expect("genesis");

        let mut by_a = Block::successor_of(&genesis, "0.0.1", a.public_key().clone(), 1_003)
            .expect("sealed parent");
        by_a.add_transaction(
            PermissionTransaction::new("0.0.1", 1_001, Permission::Admission, b.public_key().clone())
                .sign(&b)
                .into(),
        )
        .expect("unsealed");
        by_a.sign(&a, &fmt).expect("sign");
        by_a.update_hash(&fmt).expect("seal");
        assert!(is_created_by_expected_creator(&chain, &by_a, 5));

        let mut by_b = Block::successor_of(&genesis, "0.0.1", b.public_key().clone(), 1_003)
            .expect("sealed parent");
        by_b.sign(&b, &fmt).expect("sign");
        by_b.update_hash(&fmt).expect("seal");
        assert!(!is_created_by_expected_creator(&chain, &by_b, 5));

        chain.attach(by_a).expect("attach");
        let due = due_creators(&chain, 1_003, 5);
        assert_eq!(due.len(), 1);
        // Roster after the block is [b, a]; window 0 belongs to b.
        assert_eq!(&due[0].1, b.public_key());
    }
}
