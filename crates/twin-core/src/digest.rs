//! # Content Digests
//!
//! SHA-256 digests over [`CanonicalBytes`]. The lifecycle event log chains
//! these: each event's digest covers its own canonical form plus the digest
//! of the event before it, so rewriting any historical event changes every
//! digest after it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A 32-byte SHA-256 digest, serialized as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// The all-zero digest that precedes the first event of every product.
    pub const GENESIS: ContentDigest = ContentDigest([0u8; 32]);

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the genesis digest.
    pub fn is_genesis(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, String> {
        if s.len() != 64 || !s.is_ascii() {
            return Err(format!("expected 64 hex characters, got {:?}", s));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|e| e.to_string())?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|e| format!("invalid hex {pair:?}: {e}"))?;
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ContentDigest> for String {
    fn from(d: ContentDigest) -> Self {
        d.to_hex()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute a SHA-256 digest. Accepts only canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_vector_empty_object() {
        // SHA-256("{}")
        let d = sha256_digest(&CanonicalBytes::new(&json!({})).unwrap());
        assert_eq!(
            d.to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn hex_roundtrip() {
        let d = sha256_digest(&CanonicalBytes::new(&json!({"p": "P1"})).unwrap());
        assert_eq!(ContentDigest::from_hex(&d.to_hex()).unwrap(), d);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(ContentDigest::from_hex("abc").is_err());
        assert!(ContentDigest::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn genesis_is_zero() {
        assert!(ContentDigest::GENESIS.is_genesis());
        assert_eq!(ContentDigest::GENESIS.to_hex(), "0".repeat(64));
    }

    #[test]
    fn serde_uses_hex_string() {
        let json = serde_json::to_string(&ContentDigest::GENESIS).unwrap();
        assert_eq!(json, format!("\"{}\"", "0".repeat(64)));
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert!(back.is_genesis());
    }

    #[test]
    fn display_is_tagged() {
        assert!(ContentDigest::GENESIS.to_string().starts_with("sha256:"));
    }
}
