//! Signature tokens.
//!
//! A token is `SIG_` followed by the first 16 hex chars of
//! `SHA-256("{file_name}|{hash}|{store_reference}|{timestamp_ms}")`.
//! The timestamp makes every signing event unique; keeping it on the record
//! makes the token recomputable for audit.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::hash::ContentHash;
use crate::record::StoreReference;

/// Prefix of every token.
pub const TOKEN_PREFIX: &str = "SIG_";

/// Hex chars of the digest kept in the token.
const TOKEN_HEX_LEN: usize = 16;

/// Short one-way token proving a record was produced by this registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureToken(pub String);

impl SignatureToken {
    /// Derive the token for one signing event.
    pub fn derive(
        file_name: &str,
        hash: &ContentHash,
        store_reference: &StoreReference,
        timestamp_ms: i64,
    ) -> Self {
        let material = format!("{file_name}|{hash}|{store_reference}|{timestamp_ms}");
        let digest = Sha256::digest(material.as_bytes());
        let hex = hex::encode(digest);
        Self(format!("{TOKEN_PREFIX}{}", &hex[..TOKEN_HEX_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DOC: &[u8] = b"%PDF-1.4\n%golden\n1 0 obj\n<</Type/Catalog>>\nendobj\n%%EOF\n";

    #[test]
    fn test_golden_token() {
        let hash = ContentHash::digest(DOC);
        assert_eq!(
            hash.to_hex(),
            "2a5d2aa070a074cbdf667d91e714e016272c64753e65f7a30798776e210bb7c5"
        );
        let token = SignatureToken::derive(
            "contract.pdf",
            &hash,
            &StoreReference::new("bafkreiexample"),
            1_700_000_000_000,
        );
        assert_eq!(token.as_str(), "SIG_c9da36a79b899922");
    }

    #[test]
    fn test_timestamp_changes_token() {
        let hash = ContentHash::digest(DOC);
        let reference = StoreReference::new("ref");
        let a = SignatureToken::derive("a.pdf", &hash, &reference, 1);
        let b = SignatureToken::derive("a.pdf", &hash, &reference, 2);
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn token_is_recomputable(name in "[a-z]{1,12}\\.pdf", ts in 0i64..i64::MAX) {
            let hash = ContentHash::digest(name.as_bytes());
            let reference = StoreReference::new(hash.to_cid());
            let a = SignatureToken::derive(&name, &hash, &reference, ts);
            let b = SignatureToken::derive(&name, &hash, &reference, ts);
            prop_assert_eq!(&a, &b);
            prop_assert!(a.as_str().starts_with(TOKEN_PREFIX));
            prop_assert_eq!(a.as_str().len(), TOKEN_PREFIX.len() + TOKEN_HEX_LEN);
        }
    }
}
