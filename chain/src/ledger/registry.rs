//! Registration caches derived from the transactions of a branch.
//!
//! [`Registrations`] is the state a branch has accumulated from genesis:
//! the admission rotation order, the doctor set and the vaccine set. It
//! is always derivable by replaying blocks in ancestor order through
//! [`Registrations::apply_block`].

use std::collections::{BTreeSet, VecDeque};

use crate::types::{Block, Permission, PublicKey, Transaction};

/// Admission order, doctors and vaccines at one point of a branch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registrations {
    /// Rotation roster. The front is served first; creators move to the
    /// back once they produce a block.
    admissions: VecDeque<PublicKey>,
    doctors: BTreeSet<PublicKey>,
    vaccines: BTreeSet<String>,
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one attached block.
    ///
    /// Transactions are applied in block order: admission requests push
    /// the sender to the front of the rotation, doctor requests join the
    /// doctor set, vaccine registrations join the vaccine set. Afterwards
    /// the block's creator moves to the back of the rotation if it holds
    /// an admission, which includes one it acquired in this very block.
    pub fn apply_block(&mut self, block: &Block) {
        for tx in &block.transactions {
            match tx {
                Transaction::Permission(p) => match p.requested_permission {
                    Permission::Admission => {
                        if !self.admissions.contains(&p.sender_pubkey) {
                            self.admissions.push_front(p.sender_pubkey.clone());
                        }
                    }
                    Permission::Doctor => {
                        self.doctors.insert(p.sender_pubkey.clone());
                    }
                    Permission::Patient => {}
                },
                Transaction::Vaccine(v) => {
                    self.vaccines.insert(v.vaccine.clone());
                }
                Transaction::Vaccination(_) => {}
            }
        }

        let creator = &block.header.creator;
        if let Some(pos) = self.admissions.iter().position(|k| k == creator) {
            if let Some(key) = self.admissions.remove(pos) {
                self.admissions.push_back(key);
            }
        }
    }

    /// Rotation roster, front first.
    pub fn admission_order(&self) -> Vec<PublicKey> {
        self.admissions.iter().cloned().collect()
    }

    pub fn admission_count(&self) -> usize {
        self.admissions.len()
    }

    pub fn is_admission(&self, key: &PublicKey) -> bool {
        self.admissions.contains(key)
    }

    pub fn is_doctor(&self, key: &PublicKey) -> bool {
        self.doctors.contains(key)
    }

    pub fn has_vaccine(&self, vaccine: &str) -> bool {
        self.vaccines.contains(vaccine)
    }

    pub fn doctors(&self) -> BTreeSet<PublicKey> {
        self.doctors.clone()
    }

    pub fn vaccines(&self) -> BTreeSet<String> {
        self.vaccines.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::types::{BlockHash, PermissionTransaction, VaccineTransaction};

    fn key(seed: u8) -> Keypair {
        Keypair::from_seed(&[seed; 32])
    }

    fn block_by(creator: &Keypair, txs: Vec<Transaction>) -> Block {
        let mut b = Block::new_successor(0, BlockHash::GENESIS_PARENT, "0.0.1", creator.public_key().clone(), 1);
        b.transactions = txs;
        b
    }

    fn admission(k: &Keypair) -> Transaction {
        PermissionTransaction::new("0.0.1", 1, Permission::Admission, k.public_key().clone())
            .sign(k)
            .into()
    }

    #[test]
    fn self_admission_lands_at_the_back() {
        let a = key(1);
        let mut reg = Registrations::new();
        reg.apply_block(&block_by(&a, vec![admission(&a)]));
        assert_eq!(reg.admission_order(), vec![a.public_key().clone()]);
    }

    #[test]
    fn new_admissions_go_to_the_front_and_creator_rotates_to_the_back() {
        let (a, b, c) = (key(1), key(2), key(3));
        let mut reg = Registrations::new();
        reg.apply_block(&block_by(&a, vec![admission(&a)]));
        reg.apply_block(&block_by(&a, vec![admission(&b), admission(&c)]));

        // c pushed in front of b, both in front of creator a.
        assert_eq!(
            reg.admission_order(),
            vec![c.public_key().clone(), b.public_key().clone(), a.public_key().clone()]
        );

        reg.apply_block(&block_by(&c, vec![]));
        assert_eq!(
            reg.admission_order(),
            vec![b.public_key().clone(), a.public_key().clone(), c.public_key().clone()]
        );
    }

    #[test]
    fn unadmitted_creator_does_not_enter_the_rotation() {
        let (a, stranger) = (key(1), key(9));
        let mut reg = Registrations::new();
        reg.apply_block(&block_by(&a, vec![admission(&a)]));
        reg.apply_block(&block_by(&stranger, vec![]));
        assert_eq!(reg.admission_order(), vec![a.public_key().clone()]);
    }

    #[test]
    fn repeated_admission_request_keeps_a_single_slot() {
        let (a, b) = (key(1), key(2));
        let mut reg = Registrations::new();
        reg.apply_block(&block_by(&a, vec![admission(&a), admission(&b)]));
        reg.apply_block(&block_by(&a, vec![admission(&b)]));
        assert_eq!(reg.admission_count(), 2);
    }

    #[test]
    fn doctors_and_vaccines_accumulate() {
        let a = key(1);
        let doc = key(2);
        let mut reg = Registrations::new();
        let doctor_tx: Transaction =
            PermissionTransaction::new("0.0.1", 1, Permission::Doctor, doc.public_key().clone())
                .sign(&doc)
                .into();
        let vaccine_tx: Transaction =
            VaccineTransaction::new("0.0.1", 1, "measles", a.public_key().clone())
                .sign(&a)
                .into();
        reg.apply_block(&block_by(&a, vec![doctor_tx, vaccine_tx]));

        assert!(reg.is_doctor(doc.public_key()));
        assert!(reg.has_vaccine("measles"));
        assert!(!reg.has_vaccine("polio"));
    }
}
