//! # Docseal Core
//!
//! Pure primitives for docseal: content hashes, the document format check,
//! signature records and their status lifecycle.
//!
//! This crate does no I/O: callers read the document bytes and hand them in.
//!
//! ## Key Types
//!
//! - [`ContentHash`] - SHA-256 digest of a document's bytes, the registry key
//! - [`DocumentFormat`] - The magic-prefix check for accepted documents
//! - [`SignatureRecord`] - The registry entry for one unique document
//! - [`SignatureStatus`] - `pending | signed | verified | failed`
//! - [`SignatureToken`] - Short one-way token binding a signing event
//!
//! ## Content Addressing
//!
//! ```rust
//! use docseal_core::{ContentHash, DocumentFormat};
//!
//! let bytes = b"%PDF-1.4\n%%EOF\n";
//! let hash = ContentHash::digest(bytes);
//! assert_eq!(hash, ContentHash::digest(bytes));
//! assert!(DocumentFormat::pdf().is_well_formed(bytes));
//! ```

pub mod error;
pub mod format;
pub mod hash;
pub mod record;
pub mod token;

pub use error::{CoreError, Result};
pub use format::DocumentFormat;
pub use hash::ContentHash;
pub use record::{LedgerReference, SignatureRecord, SignatureStatus, StoreReference};
pub use token::SignatureToken;
