//! # docseal testkit
//!
//! Testing utilities for docseal.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known digests, CIDs and signature tokens
//! - **Generators**: Proptest strategies for document bytes and names
//! - **Fixtures**: A temporary intake/archive tree wired to a registry
//!   with in-memory collaborators
//!
//! ## Golden Vectors
//!
//! ```rust
//! use docseal_core::ContentHash;
//! use docseal_testkit::vectors::digest_vectors;
//!
//! for vector in digest_vectors() {
//!     let hash = ContentHash::digest(vector.input);
//!     assert_eq!(hash.to_hex(), vector.sha256_hex, "{}", vector.name);
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use docseal_testkit::fixtures::TestHarness;
//!
//! let harness = TestHarness::new();
//! let path = harness.write_document("contract.pdf", b"terms");
//! assert!(path.starts_with(&harness.intake));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{pdf_bytes, TestHarness};
