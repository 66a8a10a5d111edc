//! Signed opinions of admission nodes on block validity.
//!
//! A judgement is created once a node has accepted or rejected a received
//! block, recorded locally and broadcast. It never changes after signing.

use serde::{Deserialize, Serialize};

use super::{BlockHash, ParseError, PublicKey, Signature};
use crate::crypto::{self, Keypair};

/// One admitted node's signed verdict on a specific block.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Judgement {
    /// Block the verdict is about.
    pub block_hash: BlockHash,
    /// `true` if the judge accepted the block.
    pub accepted: bool,
    /// Public key of the judging admission node.
    pub judge: PublicKey,
    pub signature: Option<Signature>,
}

#[derive(Serialize)]
struct JudgementContent<'a> {
    kind: &'static str,
    block_hash: &'a BlockHash,
    accepted: bool,
    judge: &'a PublicKey,
}

impl Judgement {
    /// Creates and signs a judgement with the judge's key.
    pub fn new(block_hash: BlockHash, accepted: bool, judge: &Keypair) -> Self {
        let mut judgement = Self {
            block_hash,
            accepted,
            judge: judge.public_key().clone(),
            signature: None,
        };
        judgement.signature = Some(judge.sign(&judgement.signing_content()));
        judgement
    }

    /// Canonical bytes covered by the judge's signature.
    pub fn signing_content(&self) -> Vec<u8> {
        serde_json::to_vec(&JudgementContent {
            kind: "judgement",
            block_hash: &self.block_hash,
            accepted: self.accepted,
            judge: &self.judge,
        })
        .expect("judgement content should always be serializable to JSON")
    }

    pub fn verify_signature(&self) -> bool {
        self.signature
            .as_ref()
            .is_some_and(|sig| crypto::verify(&self.judge, &self.signing_content(), sig))
    }

    /// Encodes the judgement as its JSON wire body.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("Judgement should always be serializable to JSON")
    }

    pub fn from_json(body: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    #[test]
    fn signed_judgement_verifies_and_survives_the_wire() {
        let judge = Keypair::from_seed(&[4u8; 32]);
        let j = Judgement::new(BlockHash(Hash256::compute(b"b1")), false, &judge);
        assert!(j.verify_signature());

        let decoded = Judgement::from_json(&j.to_json()).expect("decode judgement");
        assert_eq!(decoded, j);
        assert!(decoded.verify_signature());
    }

    #[test]
    fn flipping_the_verdict_breaks_the_signature() {
        let judge = Keypair::from_seed(&[5u8; 32]);
        let mut j = Judgement::new(BlockHash(Hash256::compute(b"b2")), true, &judge);
        j.accepted = false;
        assert!(!j.verify_signature());
    }
}
