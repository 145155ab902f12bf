//! Golden test vectors.
//!
//! Digests and CIDs are standard SHA-256 / CIDv1 values and can be checked
//! with any independent tool. Tokens follow the
//! `SIG_` + first 16 hex of SHA-256(`name|hash|reference|timestamp`) rule.

/// A small but well-formed PDF used across vectors.
pub const GOLDEN_DOCUMENT: &[u8] =
    b"%PDF-1.4\n%golden\n1 0 obj\n<</Type/Catalog>>\nendobj\n%%EOF\n";

/// A digest test vector.
#[derive(Debug, Clone)]
pub struct DigestVector {
    pub name: &'static str,
    pub input: &'static [u8],
    /// Expected SHA-256 (lowercase hex).
    pub sha256_hex: &'static str,
    /// Expected CIDv1 (raw codec, base32).
    pub cid: &'static str,
}

/// All digest vectors.
pub fn digest_vectors() -> Vec<DigestVector> {
    vec![
        DigestVector {
            name: "empty input",
            input: b"",
            sha256_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            cid: "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku",
        },
        DigestVector {
            name: "abc",
            input: b"abc",
            sha256_hex: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            cid: "bafkreif2pall7dybz7vecqka3zo24irdwabwdi4wc55jznaq75q7eaavvu",
        },
        DigestVector {
            name: "golden document",
            input: GOLDEN_DOCUMENT,
            sha256_hex: "2a5d2aa070a074cbdf667d91e714e016272c64753e65f7a30798776e210bb7c5",
            cid: "bafkreibkluvka4faotf56zt5shtrjyawe4wgi5j6mx32gb4yo5xccc5xyu",
        },
    ]
}

/// A signature token test vector.
#[derive(Debug, Clone)]
pub struct TokenVector {
    pub name: &'static str,
    pub file_name: &'static str,
    pub content_hash_hex: &'static str,
    pub store_reference: &'static str,
    pub timestamp_ms: i64,
    pub expected_token: &'static str,
}

/// All token vectors.
pub fn token_vectors() -> Vec<TokenVector> {
    vec![
        TokenVector {
            name: "contract with placeholder reference",
            file_name: "contract.pdf",
            content_hash_hex: "2a5d2aa070a074cbdf667d91e714e016272c64753e65f7a30798776e210bb7c5",
            store_reference: "bafkreiexample",
            timestamp_ms: 1_700_000_000_000,
            expected_token: "SIG_c9da36a79b899922",
        },
        TokenVector {
            name: "report with content-addressed reference",
            file_name: "report.pdf",
            content_hash_hex: "2a5d2aa070a074cbdf667d91e714e016272c64753e65f7a30798776e210bb7c5",
            store_reference: "bafkreibkluvka4faotf56zt5shtrjyawe4wgi5j6mx32gb4yo5xccc5xyu",
            timestamp_ms: 0,
            expected_token: "SIG_6ab77737c4e04496",
        },
        TokenVector {
            name: "empty name and reference",
            file_name: "",
            content_hash_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            store_reference: "",
            timestamp_ms: 1,
            expected_token: "SIG_805babcc688afb2e",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_core::{ContentHash, SignatureToken, StoreReference};

    #[test]
    fn test_digest_vectors() {
        for vector in digest_vectors() {
            let hash = ContentHash::digest(vector.input);
            assert_eq!(hash.to_hex(), vector.sha256_hex, "{}", vector.name);
            assert_eq!(hash.to_cid(), vector.cid, "{}", vector.name);
        }
    }

    #[test]
    fn test_token_vectors() {
        for vector in token_vectors() {
            let hash = ContentHash::from_hex(vector.content_hash_hex).unwrap();
            let token = SignatureToken::derive(
                vector.file_name,
                &hash,
                &StoreReference::new(vector.store_reference),
                vector.timestamp_ms,
            );
            assert_eq!(token.as_str(), vector.expected_token, "{}", vector.name);
        }
    }
}
