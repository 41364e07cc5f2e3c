//! Client key derivation.

use sha2::{Digest, Sha256};
use std::net::IpAddr;

/// Number of hex characters shown when a key is displayed in logs.
const DISPLAY_PREFIX_LEN: usize = 12;

/// An opaque identifier that partitions rate limit state per client.
///
/// The key is the hex-encoded SHA-256 digest of the client address, so the
/// address itself is never stored in limiter state or written to logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    /// Derive a key from a textual client address.
    pub fn from_address(address: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(address.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Derive a key from a client IP address.
    pub fn from_ip(ip: IpAddr) -> Self {
        Self::from_address(&ip.to_string())
    }

    /// The full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0[..DISPLAY_PREFIX_LEN])
    }
}
