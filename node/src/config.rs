//! Peer node configuration.
//!
//! This configures the HTTP listen address and the startup behaviour of
//! the node. The underlying chain configuration is taken from
//! `vaxchain::ChainConfig::from_env()`.

use std::net::SocketAddr;

use vaxchain::config::is_truthy;

/// Configuration for the peer HTTP server and startup actions.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Create a genesis block when no chain could be loaded from disk.
    pub create_genesis: bool,
    /// Broadcast an admission request on startup unless already admitted.
    pub register_as_admission: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        // Safe to unwrap: fixed, valid address literal.
        // Bind to all interfaces so peers in other containers can reach us.
        let addr: SocketAddr = "0.0.0.0:9000"
            .parse()
            .expect("hard-coded listen address should parse");
        Self {
            listen_addr: addr,
            create_genesis: false,
            register_as_admission: false,
        }
    }
}

impl NodeConfig {
    /// Overlays `VAXCHAIN_LISTEN_ADDR`, `CREATE_GENESIS` and
    /// `REGISTER_AS_ADMISSION` on the defaults.
    pub fn from_env() -> Result<Self, String> {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("VAXCHAIN_LISTEN_ADDR") {
            cfg.listen_addr = v
                .parse()
                .map_err(|e| format!("invalid VAXCHAIN_LISTEN_ADDR {v:?}: {e}"))?;
        }
        if let Ok(v) = std::env::var("CREATE_GENESIS") {
            cfg.create_genesis = is_truthy(&v);
        }
        if let Ok(v) = std::env::var("REGISTER_AS_ADMISSION") {
            cfg.register_as_admission = is_truthy(&v);
        }
        Ok(cfg)
    }
}
