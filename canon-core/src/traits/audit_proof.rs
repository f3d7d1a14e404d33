//! Audit-proof lookup: the read-only ledger view the enforcement verifier
//! consumes. Keeping the trait here lets `canon-verify` stay independent
//! of the ledger's storage backend.

use crate::errors::LedgerError;
use crate::types::ArtifactKind;

/// Read-only evidence lookup against the audit ledger.
pub trait AuditProof: Send + Sync {
    /// Whether a prior ledger entry recorded the given artifact fingerprint
    /// with a passing outcome. "Claimed enforcement never evidenced" is the
    /// `Ok(false)` case.
    fn has_passing_evidence(
        &self,
        artifact_kind: ArtifactKind,
        fingerprint: u64,
    ) -> Result<bool, LedgerError>;
}
