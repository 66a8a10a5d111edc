// chain/src/types/block.rs

//! Block types, sealing and the text wire format.
//!
//! A block is built unsealed on top of a parent, filled with
//! transactions, signed by its creator and finally sealed by
//! [`Block::update_hash`]. After sealing it must not change.
//!
//! Wire format (separator `,` and terminator `\n` by default):
//!
//! ```text
//! index,previous_hash,version,timestamp,hex(creator)[,signature][,hash]
//! <one transaction per line>
//! ```
//!
//! The header field list is fixed and decoded positionally. Unsigned
//! and unhashed blocks serialize with fewer trailing fields. A hashed
//! block without signature keeps an empty signature slot.

use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

use super::{BlockHash, Hash256, ParseError, PublicKey, Signature, Transaction, WireFormat};
use crate::crypto::{self, Keypair};
use crate::types::tx::{Permission, PermissionTransaction};

/// Number of header fields always present on the wire.
const MIN_HEADER_FIELDS: usize = 5;
/// Header fields including signature and hash.
const MAX_HEADER_FIELDS: usize = 7;

/// Violations of the block lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    /// The block already carries its hash and is immutable.
    #[error("block {0} is sealed")]
    Sealed(BlockHash),
    /// A successor was requested for a block that has no hash yet.
    #[error("parent block at index {0} is not sealed")]
    UnsealedParent(u64),
}

/// Block header: linking, ordering and attribution fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Height of this block; genesis is 0.
    pub index: u64,
    /// Hash of the parent block, [`BlockHash::GENESIS_PARENT`] for genesis.
    pub previous_hash: BlockHash,
    /// Protocol version string of the creator.
    pub version: String,
    /// Creation time in seconds since Unix epoch.
    ///
    /// Creator election is computed from the distance between this
    /// timestamp and the parent's.
    pub timestamp: u64,
    /// Public key of the block producer.
    pub creator: PublicKey,
}

/// Block = header + creator signature + seal + ordered transactions.
///
/// Equality and hashing consider only the seal: two blocks with the same
/// content hash are the same block.
#[derive(Clone, Debug)]
pub struct Block {
    pub header: Header,
    /// Creator's signature over [`Block::signing_content`].
    pub signature: Option<Signature>,
    /// Content hash, set once by [`Block::update_hash`].
    pub hash: Option<BlockHash>,
    /// Ordered list of transactions included in this block.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates an unsealed successor skeleton referencing `parent_index`
    /// and `parent_hash`.
    pub fn new_successor(
        parent_index: u64,
        parent_hash: BlockHash,
        version: impl Into<String>,
        creator: PublicKey,
        timestamp: u64,
    ) -> Self {
        Self {
            header: Header {
                index: parent_index + 1,
                previous_hash: parent_hash,
                version: version.into(),
                timestamp,
                creator,
            },
            signature: None,
            hash: None,
            transactions: Vec::new(),
        }
    }

    /// Creates an unsealed successor of a sealed `parent`.
    pub fn successor_of(
        parent: &Block,
        version: impl Into<String>,
        creator: PublicKey,
        timestamp: u64,
    ) -> Result<Self, BlockError> {
        let parent_hash = parent
            .hash
            .ok_or(BlockError::UnsealedParent(parent.header.index))?;
        Ok(Self::new_successor(
            parent.header.index,
            parent_hash,
            version,
            creator,
            timestamp,
        ))
    }

    /// Creates the sealed genesis block.
    ///
    /// The genesis carries a single self-signed admission request from its
    /// creator, which makes the creator the first admission node.
    pub fn genesis(creator: &Keypair, version: &str, timestamp: u64, fmt: &WireFormat) -> Self {
        let mut genesis = Self {
            header: Header {
                index: 0,
                previous_hash: BlockHash::GENESIS_PARENT,
                version: version.to_string(),
                timestamp,
                creator: creator.public_key().clone(),
            },
            signature: None,
            hash: None,
            transactions: Vec::new(),
        };
        let admission = PermissionTransaction::new(
            version,
            timestamp,
            Permission::Admission,
            creator.public_key().clone(),
        )
        .sign(creator);
        genesis.transactions.push(admission.into());
        genesis.signature = Some(creator.sign(genesis.signing_content(fmt).as_bytes()));
        genesis.hash = Some(genesis.compute_hash(fmt));
        genesis
    }

    pub fn index(&self) -> u64 {
        self.header.index
    }

    /// Returns `true` once [`Block::update_hash`] has run.
    pub fn is_sealed(&self) -> bool {
        self.hash.is_some()
    }

    fn ensure_unsealed(&self) -> Result<(), BlockError> {
        match self.hash {
            Some(hash) => Err(BlockError::Sealed(hash)),
            None => Ok(()),
        }
    }

    /// Appends a transaction. Only legal before sealing.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), BlockError> {
        self.ensure_unsealed()?;
        self.transactions.push(tx);
        Ok(())
    }

    /// Signs the header and transactions with the creator's key.
    pub fn sign(&mut self, creator: &Keypair, fmt: &WireFormat) -> Result<(), BlockError> {
        self.ensure_unsealed()?;
        self.signature = Some(creator.sign(self.signing_content(fmt).as_bytes()));
        Ok(())
    }

    /// Seals the block by computing and storing its content hash.
    pub fn update_hash(&mut self, fmt: &WireFormat) -> Result<BlockHash, BlockError> {
        self.ensure_unsealed()?;
        let hash = self.compute_hash(fmt);
        self.hash = Some(hash);
        tracing::debug!(index = self.header.index, %hash, "sealed block");
        Ok(hash)
    }

    /// Computes the content hash over every field except the hash itself.
    ///
    /// This must remain stable across nodes for the tree to link up.
    pub fn compute_hash(&self, fmt: &WireFormat) -> BlockHash {
        BlockHash(Hash256::compute(self.hashing_content(fmt).as_bytes()))
    }

    /// Returns `true` if the signature is present and was made by the
    /// declared creator over this block's content.
    pub fn verify_signature(&self, fmt: &WireFormat) -> bool {
        self.signature.as_ref().is_some_and(|sig| {
            crypto::verify(&self.header.creator, self.signing_content(fmt).as_bytes(), sig)
        })
    }

    fn header_fields(&self) -> Vec<String> {
        vec![
            self.header.index.to_string(),
            self.header.previous_hash.to_string(),
            self.header.version.clone(),
            self.header.timestamp.to_string(),
            self.header.creator.to_hex(),
        ]
    }

    fn push_transactions(&self, out: &mut String, fmt: &WireFormat) {
        for tx in &self.transactions {
            out.push_str(&tx.to_line());
            out.push(fmt.terminator);
        }
    }

    fn join_header(fields: &[String], fmt: &WireFormat) -> String {
        let mut sep = [0u8; 4];
        let mut out = fields.join(fmt.separator.encode_utf8(&mut sep));
        out.push(fmt.terminator);
        out
    }

    /// Content covered by the creator's signature: header without
    /// signature and hash, then every transaction line.
    pub fn signing_content(&self, fmt: &WireFormat) -> String {
        let mut out = Self::join_header(&self.header_fields(), fmt);
        self.push_transactions(&mut out, fmt);
        out
    }

    /// Content covered by the hash: header including the (possibly empty)
    /// signature, then every transaction line.
    pub fn hashing_content(&self, fmt: &WireFormat) -> String {
        let mut fields = self.header_fields();
        fields.push(
            self.signature
                .as_ref()
                .map(Signature::to_hex)
                .unwrap_or_default(),
        );
        let mut out = Self::join_header(&fields, fmt);
        self.push_transactions(&mut out, fmt);
        out
    }

    /// Encodes the block in the text wire format.
    pub fn serialize(&self, fmt: &WireFormat) -> String {
        let mut fields = self.header_fields();
        match (&self.signature, &self.hash) {
            (Some(sig), _) => fields.push(sig.to_hex()),
            (None, Some(_)) => fields.push(String::new()),
            (None, None) => {}
        }
        if let Some(hash) = &self.hash {
            fields.push(hash.to_string());
        }
        let mut out = Self::join_header(&fields, fmt);
        self.push_transactions(&mut out, fmt);
        out
    }

    /// Decodes a block from the text wire format.
    pub fn deserialize(data: &str, fmt: &WireFormat) -> Result<Self, ParseError> {
        let (header, body) = data
            .split_once(fmt.terminator)
            .ok_or(ParseError::MissingTerminator)?;

        let fields: Vec<&str> = header.split(fmt.separator).collect();
        if !(MIN_HEADER_FIELDS..=MAX_HEADER_FIELDS).contains(&fields.len()) {
            return Err(ParseError::HeaderFieldCount(fields.len()));
        }

        let index = parse_u64(fields[0], "index")?;
        let previous_hash = BlockHash::parse_field(fields[1], "previous_hash")?;
        let version = fields[2].to_string();
        let timestamp = parse_u64(fields[3], "timestamp")?;
        let creator = PublicKey::from_hex(fields[4])?;
        let signature = match fields.get(5) {
            Some(s) if !s.is_empty() => Some(Signature::from_hex(s)?),
            _ => None,
        };
        let hash = match fields.get(6) {
            Some(s) => Some(BlockHash::parse_field(s, "hash")?),
            None => None,
        };

        let transactions = body
            .split(fmt.terminator)
            .filter(|line| !line.is_empty())
            .map(Transaction::from_line)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            header: Header {
                index,
                previous_hash,
                version,
                timestamp,
                creator,
            },
            signature,
            hash,
            transactions,
        })
    }
}

fn parse_u64(value: &str, field: &'static str) -> Result<u64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = self.hash.map(|h| h.to_string()).unwrap_or_default();
        write!(
            f,
            "block {} (prev {}, {} txs, creator {}, hash {})",
            self.header.index,
            self.header.previous_hash,
            self.transactions.len(),
            self.header.creator.short(),
            hash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tx::VaccineTransaction;

    const VERSION: &str = "0.0.1";

    fn keypair() -> Keypair {
        Keypair::from_seed(&[9u8; 32])
    }

    fn successor(genesis: &Block, kp: &Keypair) -> Block {
        let mut block = Block::successor_of(genesis, VERSION, kp.public_key().clone(), 1_700_000_010)
            .expect("genesis is sealed");
        let tx = VaccineTransaction::new(VERSION, 1_700_000_005, "a vaccine", kp.public_key().clone())
            .sign(kp);
        block.add_transaction(tx.into()).expect("unsealed block");
        let tx = PermissionTransaction::new(VERSION, 1_700_000_006, Permission::Doctor, kp.public_key().clone())
            .sign(kp);
        block.add_transaction(tx.into()).expect("unsealed block");
        block
    }

    #[test]
    fn block_hash_is_deterministic() {
        let fmt = WireFormat::default();
        let kp = keypair();
        let genesis = Block::genesis(&kp, VERSION, 1_700_000_000, &fmt);

        let mut a = successor(&genesis, &kp);
        let mut b = successor(&genesis, &kp);
        a.sign(&kp, &fmt).expect("sign a");
        b.sign(&kp, &fmt).expect("sign b");
        let ha = a.update_hash(&fmt).expect("seal a");
        let hb = b.update_hash(&fmt).expect("seal b");

        assert_eq!(ha, hb);
        assert_eq!(a.compute_hash(&fmt), ha);
    }

    #[test]
    fn successor_links_to_parent() {
        let fmt = WireFormat::default();
        let kp = keypair();
        let genesis = Block::genesis(&kp, VERSION, 1_700_000_000, &fmt);
        let block = successor(&genesis, &kp);

        assert_eq!(block.header.index, 1);
        assert_eq!(Some(block.header.previous_hash), genesis.hash);
        assert!(block.signature.is_none());
        assert!(!block.is_sealed());
    }

    #[test]
    fn sealed_block_rejects_mutation() {
        let fmt = WireFormat::default();
        let kp = keypair();
        let mut genesis = Block::genesis(&kp, VERSION, 1, &fmt);
        let hash = genesis.hash.expect("genesis sealed");

        let tx = VaccineTransaction::new(VERSION, 2, "x", kp.public_key().clone());
        assert_eq!(
            genesis.add_transaction(tx.into()),
            Err(BlockError::Sealed(hash))
        );
        assert_eq!(genesis.sign(&kp, &fmt), Err(BlockError::Sealed(hash)));
        assert_eq!(genesis.update_hash(&fmt), Err(BlockError::Sealed(hash)));
    }

    #[test]
    fn genesis_signature_verifies() {
        let fmt = WireFormat::default();
        let kp = keypair();
        let genesis = Block::genesis(&kp, VERSION, 1, &fmt);
        assert!(genesis.verify_signature(&fmt));
        assert_eq!(genesis.header.previous_hash, BlockHash::GENESIS_PARENT);
        assert_eq!(genesis.transactions.len(), 1);
    }

    #[test]
    fn roundtrip_sealed_and_unsealed() {
        let fmt = WireFormat::default();
        let kp = keypair();
        let genesis = Block::genesis(&kp, VERSION, 1_700_000_000, &fmt);

        let unsealed = successor(&genesis, &kp);
        let decoded = Block::deserialize(&unsealed.serialize(&fmt), &fmt).expect("decode unsealed");
        assert_eq!(decoded.header, unsealed.header);
        assert_eq!(decoded.hash, None);
        assert_eq!(decoded.transactions, unsealed.transactions);

        let mut sealed = successor(&genesis, &kp);
        sealed.sign(&kp, &fmt).expect("sign");
        sealed.update_hash(&fmt).expect("seal");
        let decoded = Block::deserialize(&sealed.serialize(&fmt), &fmt).expect("decode sealed");
        assert_eq!(decoded.header.index, sealed.header.index);
        assert_eq!(decoded.header.previous_hash, sealed.header.previous_hash);
        assert_eq!(decoded.hash, sealed.hash);
        assert_eq!(decoded.signature, sealed.signature);
        assert_eq!(decoded.transactions, sealed.transactions);
        assert!(decoded.verify_signature(&fmt));
        assert_eq!(decoded.compute_hash(&fmt), decoded.hash.expect("hash"));
    }

    #[test]
    fn hashed_but_unsigned_block_keeps_empty_signature_slot() {
        let fmt = WireFormat::default();
        let kp = keypair();
        let genesis = Block::genesis(&kp, VERSION, 1, &fmt);
        let mut block = successor(&genesis, &kp);
        let hash = block.update_hash(&fmt).expect("seal");

        let wire = block.serialize(&fmt);
        let header = wire.lines().next().expect("header line");
        assert_eq!(header.split(',').count(), 7);

        let decoded = Block::deserialize(&wire, &fmt).expect("decode");
        assert_eq!(decoded.signature, None);
        assert_eq!(decoded.hash, Some(hash));
    }

    #[test]
    fn custom_separator_and_terminator() {
        let fmt = WireFormat {
            separator: ';',
            terminator: '|',
        };
        let kp = keypair();
        let genesis = Block::genesis(&kp, VERSION, 1, &fmt);
        let wire = genesis.serialize(&fmt);
        assert!(wire.ends_with('|'));

        let decoded = Block::deserialize(&wire, &fmt).expect("decode");
        assert_eq!(decoded.hash, genesis.hash);
        assert_eq!(decoded.compute_hash(&fmt), genesis.hash.expect("hash"));
    }

    #[test]
    fn wrong_header_arity_is_a_parse_error() {
        let fmt = WireFormat::default();
        let err = Block::deserialize("1,2,3\n", &fmt).unwrap_err();
        assert!(matches!(err, ParseError::HeaderFieldCount(3)));

        let err = Block::deserialize("no terminator", &fmt).unwrap_err();
        assert!(matches!(err, ParseError::MissingTerminator));
    }

    #[test]
    fn malformed_transaction_line_is_a_parse_error() {
        let fmt = WireFormat::default();
        let kp = keypair();
        let genesis = Block::genesis(&kp, VERSION, 1, &fmt);
        let mut wire = genesis.serialize(&fmt);
        wire.push_str("not json\n");

        let err = Block::deserialize(&wire, &fmt).unwrap_err();
        assert!(matches!(err, ParseError::Record(_)));
    }
}
