//! Consistency findings: one discrepancy between canon and an artifact.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactKind;
use super::rule::RuleId;

/// The kind of discrepancy. The derive order is the tie-break order within
/// one (artifact, rule) pair when findings are sorted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A canon rule is absent from an artifact.
    Missing,
    /// A rule id is present in an artifact but absent from canon.
    Shadow,
    SeverityMismatch,
    CategoryMismatch,
    /// Declared rows x cols does not match the merged rule count.
    MatrixMisaligned,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Shadow => "shadow",
            Self::SeverityMismatch => "severity_mismatch",
            Self::CategoryMismatch => "category_mismatch",
            Self::MatrixMisaligned => "matrix_misaligned",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single consistency discrepancy. Produced fresh each run, never
/// persisted individually; only the summarizing report reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// `None` only for `MatrixMisaligned`, which is not tied to one rule.
    pub rule_id: Option<RuleId>,
    /// `None` only for `MatrixMisaligned`, which is not tied to one artifact.
    pub artifact_kind: Option<ArtifactKind>,
    pub detail: String,
}

impl Finding {
    pub fn missing(rule_id: RuleId, artifact_kind: ArtifactKind, detail: String) -> Self {
        Self {
            kind: FindingKind::Missing,
            rule_id: Some(rule_id),
            artifact_kind: Some(artifact_kind),
            detail,
        }
    }

    pub fn shadow(rule_id: RuleId, artifact_kind: ArtifactKind, detail: String) -> Self {
        Self {
            kind: FindingKind::Shadow,
            rule_id: Some(rule_id),
            artifact_kind: Some(artifact_kind),
            detail,
        }
    }

    /// Sort key implementing the report's total order:
    /// artifact kind, then rule id, then finding kind.
    pub fn sort_key(&self) -> (Option<ArtifactKind>, Option<&RuleId>, FindingKind) {
        (self.artifact_kind, self.rule_id.as_ref(), self.kind)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let artifact = self.artifact_kind.map(|a| a.as_str()).unwrap_or("-");
        let rule = self.rule_id.as_ref().map(|r| r.as_str()).unwrap_or("-");
        write!(f, "{} {} {}: {}", self.kind, artifact, rule, self.detail)
    }
}
