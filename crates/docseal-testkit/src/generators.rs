//! Proptest generators for property-based testing.

use proptest::prelude::*;

use docseal_core::{ContentHash, StoreReference};

/// Arbitrary bytes up to `max_len`.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Bytes that start with a PDF header.
pub fn well_formed_document(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    (0u8..=7, payload(max_len)).prop_map(|(minor, body)| {
        let mut bytes = format!("%PDF-1.{minor}\n").into_bytes();
        bytes.extend_from_slice(&body);
        bytes
    })
}

/// Bytes that do not start with the PDF marker.
pub fn malformed_document(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    payload(max_len).prop_filter("must not carry the PDF marker", |bytes| {
        !bytes.starts_with(b"%PDF")
    })
}

/// A plausible document file name with a `.pdf` extension.
pub fn file_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}\\.pdf".prop_map(String::from)
}

/// A random content hash.
pub fn content_hash() -> impl Strategy<Value = ContentHash> {
    any::<[u8; 32]>().prop_map(ContentHash::from_bytes)
}

/// A content store reference shaped like a CID.
pub fn store_reference() -> impl Strategy<Value = StoreReference> {
    "bafkrei[a-z2-7]{52}".prop_map(StoreReference::new)
}

/// Unix milliseconds in a reasonable range.
pub fn timestamp_ms() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800_000
}
