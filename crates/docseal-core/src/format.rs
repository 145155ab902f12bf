//! Document format check.
//!
//! Validation is a magic-prefix check only. A file that starts with the
//! expected marker is accepted; no structural parsing is attempted.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// The document format accepted by a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFormat {
    /// Bytes every well-formed document starts with.
    pub magic: Vec<u8>,
    /// File extension used to discover candidates (without the dot).
    pub extension: String,
}

impl DocumentFormat {
    /// PDF documents: `%PDF` marker, `.pdf` extension.
    pub fn pdf() -> Self {
        Self {
            magic: b"%PDF".to_vec(),
            extension: "pdf".to_string(),
        }
    }

    /// True iff `bytes` begins with the format marker.
    pub fn is_well_formed(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(&self.magic)
    }

    /// True iff the path carries this format's extension (case-insensitive).
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Media type reported for documents of this format.
    pub fn media_type(&self) -> &'static str {
        if self.magic == b"%PDF" {
            "application/pdf"
        } else {
            "application/octet-stream"
        }
    }
}

impl Default for DocumentFormat {
    fn default() -> Self {
        Self::pdf()
    }
}
