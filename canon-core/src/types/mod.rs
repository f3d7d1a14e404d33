//! Shared data model: rules, artifacts, findings, reports.

pub mod artifact;
pub mod finding;
pub mod report;
pub mod rule;

pub use artifact::{ArtifactKind, ExtractedArtifactSet, ExtractedAttrs, ExtractionWarning};
pub use finding::{Finding, FindingKind};
pub use report::{CertificationTier, VerificationReport};
pub use rule::{MatrixShape, Rule, RuleCategory, RuleId, Severity};
