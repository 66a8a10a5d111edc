//! Cryptographic helpers: Ed25519 key handling, signing and verification.
//!
//! Every signature on the ledger (blocks, transactions, judgements) is a
//! detached Ed25519 signature over a canonical byte string. Public keys
//! travel as the 32-byte verifying key.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::types::{PublicKey, Signature};

/// Length of the persisted private key seed.
const SEED_LEN: usize = 32;

/// Errors raised while establishing the node identity.
///
/// Any of these at startup is fatal: a node must not run without an
/// identity key pair.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("key file {path} is malformed: expected {SEED_LEN} bytes, got {len}")]
    Malformed { path: String, len: usize },
}

/// Ed25519 key pair of a ledger participant.
pub struct Keypair {
    signing: SigningKey,
    public: PublicKey,
}

impl Keypair {
    /// Generates a fresh key pair using the OS RNG.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        Self::from_signing_key(SigningKey::generate(&mut rng))
    }

    /// Rebuilds a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing: SigningKey) -> Self {
        let public = PublicKey(signing.verifying_key().to_bytes().to_vec());
        Self { signing, public }
    }

    /// Returns the public half of this key pair.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Signs arbitrary bytes.
    pub fn sign(&self, msg: &[u8]) -> Signature {
        Signature(self.signing.sign(msg).to_bytes().to_vec())
    }

    fn seed(&self) -> [u8; SEED_LEN] {
        self.signing.to_bytes()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public.short())
            .finish_non_exhaustive()
    }
}

/// Verifies a message/signature pair against a public key.
///
/// Returns `false` for malformed keys or signatures instead of erroring:
/// callers only care whether the evidence holds.
pub fn verify(public: &PublicKey, msg: &[u8], sig: &Signature) -> bool {
    let Ok(key_bytes) = <[u8; 32]>::try_from(public.as_bytes()) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig) = ed25519_dalek::Signature::from_slice(sig.as_bytes()) else {
        return false;
    };
    key.verify(msg, &sig).is_ok()
}

/// Saves (overwrites) the private key seed to disk.
pub fn save_key(path: &Path, keypair: &Keypair) -> Result<(), KeyError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = File::create(path)?;
    f.write_all(&keypair.seed())?;
    Ok(())
}

/// Loads the private key seed if present, else returns `None`.
pub fn load_key(path: &Path) -> Result<Option<Keypair>, KeyError> {
    if !path.exists() {
        return Ok(None);
    }
    let mut buf = Vec::new();
    File::open(path)?.read_to_end(&mut buf)?;
    let seed: [u8; SEED_LEN] = buf.as_slice().try_into().map_err(|_| KeyError::Malformed {
        path: path.display().to_string(),
        len: buf.len(),
    })?;
    Ok(Some(Keypair::from_seed(&seed)))
}

/// Loads the node identity from `path`, generating and persisting a new
/// key pair when no key file exists yet.
pub fn load_or_generate(path: &Path) -> Result<Keypair, KeyError> {
    if let Some(keypair) = load_key(path)? {
        tracing::info!(path = %path.display(), "loaded existing node key");
        return Ok(keypair);
    }
    tracing::info!(path = %path.display(), "no key found; generating a new key pair");
    let keypair = Keypair::generate();
    save_key(path, &keypair)?;
    Ok(keypair)
}
