//! Core types, errors, config, and traits for the Canon governance verifier.
//!
//! Canon keeps a Source-of-Truth rule catalog synchronized across five
//! independently authored artifact representations (contract, policy,
//! validator, CLI, tests). This crate carries the shared vocabulary; the
//! verification engine lives in `canon-verify` and the audit ledger in
//! `canon-ledger`.

pub mod config;
pub mod errors;
pub mod traits;
pub mod types;

pub use config::CanonConfig;
pub use errors::{
    ConfigError, EnforcementError, LedgerError, PipelineError, RegistryError,
};
pub use traits::AuditProof;
pub use types::{
    ArtifactKind, CertificationTier, ExtractedArtifactSet, ExtractedAttrs,
    ExtractionWarning, Finding, FindingKind, MatrixShape, Rule, RuleCategory, RuleId,
    Severity, VerificationReport,
};
