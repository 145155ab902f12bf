//! Signature records and their status lifecycle.
//!
//! ```text
//! (none) --sign--> signed --verify ok--> verified --verify fail--> failed
//!                    |                      ^                        |
//!                    +----verify fail-------|------------------------+
//!                                           +-------verify ok--------+
//! ```
//!
//! `pending` describes a discovered document that has no record yet. A record
//! stored as `pending` may be signed or re-verified, but a stored record never
//! moves back to `pending`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::hash::ContentHash;
use crate::token::SignatureToken;

/// Lifecycle state of a signature record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    Pending,
    Signed,
    Verified,
    Failed,
}

impl SignatureStatus {
    /// Whether a record in this status may move to `next`.
    pub fn can_transition_to(self, next: SignatureStatus) -> bool {
        use SignatureStatus::*;
        matches!(
            (self, next),
            (Pending, Signed)
                | (Pending, Verified)
                | (Pending, Failed)
                | (Signed, Verified)
                | (Signed, Failed)
                | (Verified, Verified)
                | (Verified, Failed)
                | (Failed, Verified)
                | (Failed, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignatureStatus::Pending => "pending",
            SignatureStatus::Signed => "signed",
            SignatureStatus::Verified => "verified",
            SignatureStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SignatureStatus::Pending),
            "signed" => Ok(SignatureStatus::Signed),
            "verified" => Ok(SignatureStatus::Verified),
            "failed" => Ok(SignatureStatus::Failed),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Opaque locator returned by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreReference(pub String);

impl StoreReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque locator returned by the ledger (e.g. a transaction id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerReference(pub String);

impl LedgerReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The registry entry for one unique document content.
///
/// `content_hash` is the primary key and never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub content_hash: ContentHash,
    /// Where the original was found at signing time.
    pub source_path: PathBuf,
    /// The registry's retained copy.
    pub archived_path: PathBuf,
    pub store_reference: StoreReference,
    pub ledger_reference: LedgerReference,
    pub signature_token: SignatureToken,
    /// Signing instant (Unix ms). Also an input of `signature_token`.
    pub created_at: i64,
    pub status: SignatureStatus,
}

impl SignatureRecord {
    /// Move the record to `next`, enforcing the lifecycle.
    pub fn transition(&mut self, next: SignatureStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// File name of the original document, as used in the token.
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Recompute the token from the record's own fields.
    pub fn expected_token(&self) -> SignatureToken {
        SignatureToken::derive(
            &self.file_name(),
            &self.content_hash,
            &self.store_reference,
            self.created_at,
        )
    }
}
