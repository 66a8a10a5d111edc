//! Peer messaging.
//!
//! The engine never talks to the network itself. Every operation that
//! has something to tell peers returns a list of [`Outbound`] messages;
//! the caller hands them to a transport such as [`http::HttpPeerClient`]
//! once the engine lock is released.

use crate::types::{Judgement, Transaction};

pub mod http;

pub use http::{HttpPeerClient, PeerConfig, PeerError};

/// A message to be broadcast to every neighbour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    /// Wire-serialized block.
    Block(String),
    Judgement(Judgement),
    Transaction(Transaction),
}

impl Outbound {
    /// Route the message is posted to.
    pub fn route(&self) -> &'static str {
        match self {
            Outbound::Block(_) => "/new_block",
            Outbound::Judgement(_) => "/new_judgement",
            Outbound::Transaction(_) => "/new_transaction",
        }
    }

    /// Text body of the message.
    pub fn body(&self) -> String {
        match self {
            Outbound::Block(data) => data.clone(),
            Outbound::Judgement(j) => j.to_json(),
            Outbound::Transaction(tx) => tx.to_line(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::types::{BlockHash, Hash256, Permission, PermissionTransaction};

    #[test]
    fn messages_map_to_peer_routes() {
        let kp = Keypair::from_seed(&[1; 32]);
        let judgement = Judgement::new(BlockHash(Hash256::compute(b"b")), true, &kp);
        let tx: Transaction =
            PermissionTransaction::new("0.0.1", 1, Permission::Patient, kp.public_key().clone())
                .sign(&kp)
                .into();

        assert_eq!(Outbound::Block("x".into()).route(), "/new_block");
        assert_eq!(Outbound::Judgement(judgement.clone()).body(), judgement.to_json());
        assert_eq!(Outbound::Transaction(tx.clone()).route(), "/new_transaction");
        assert_eq!(Outbound::Transaction(tx.clone()).body(), tx.to_line());
    }
}
