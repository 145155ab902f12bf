//! # Docseal Anchor
//!
//! The two external collaborators of the registry, as narrow async traits:
//!
//! - [`Ledger`] anchors a content hash and later confirms it, with owner and
//!   anchoring time
//! - [`ContentStore`] holds the original bytes and hands back a reference
//!   and an access URL
//!
//! Networked clients live outside this workspace and implement these traits.
//! The [`memory`] module provides in-process implementations with failure
//! injection, used by tests and for offline runs.
//!
//! ```rust
//! use std::sync::Arc;
//! use docseal_anchor::{Ledger, memory::MemoryLedger};
//! use docseal_core::ContentHash;
//!
//! # async fn example() -> docseal_anchor::Result<()> {
//! let ledger: Arc<dyn Ledger> = Arc::new(MemoryLedger::default());
//! let hash = ContentHash::digest(b"%PDF-1.4");
//! let tx = ledger.anchor(&hash).await?;
//! assert!(ledger.is_anchored(&hash).await?);
//! # let _ = tx;
//! # Ok(())
//! # }
//! ```

pub mod content;
pub mod error;
pub mod ledger;
pub mod memory;

pub use content::{ContentInfo, ContentStore};
pub use error::{AnchorError, Result};
pub use ledger::{AnchorInfo, Ledger};
