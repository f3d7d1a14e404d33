//! Verification reports and the certification tier ladder.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactKind;
use super::finding::{Finding, FindingKind};
use super::rule::MatrixShape;

/// Banded quality label derived from the overall score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CertificationTier {
    None,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl CertificationTier {
    /// Map an overall score in [0, 100] onto the tier ladder.
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Self::Platinum
        } else if score >= 85.0 {
            Self::Gold
        } else if score >= 70.0 {
            Self::Silver
        } else if score >= 50.0 {
            Self::Bronze
        } else {
            Self::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

impl fmt::Display for CertificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The externally visible result of one verification run.
///
/// Constructed once per invocation, appended to the audit ledger, then
/// discarded by the engine. All maps are BTreeMaps and the field order is
/// fixed so the canonical JSON serialization is byte-stable; the ledger's
/// payload hash depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Unix seconds at report construction.
    pub timestamp: i64,
    pub canonical_rule_count: u64,
    pub matrix: MatrixShape,
    /// Raw (unweighted) per-artifact coverage percentage.
    pub artifact_coverage: BTreeMap<ArtifactKind, f64>,
    /// Source fingerprint of each artifact at extraction time.
    pub artifact_fingerprints: BTreeMap<ArtifactKind, u64>,
    pub findings: Vec<Finding>,
    pub extraction_warnings: Vec<String>,
    /// Severity-weighted overall score in [0, 100].
    pub overall_score: f64,
    pub certification_tier: CertificationTier,
    /// 0 = full success, 1 = gaps found. Structural failures never produce
    /// a report; they surface as errors with exit code 2.
    pub exit_code: i32,
}

impl VerificationReport {
    /// Canonical serialization hashed by the ledger.
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Whether one artifact fully passed: full coverage and no finding of
    /// any kind attributed to it. This is the "passing outcome" the
    /// audit-proof phase looks for in prior ledger entries.
    pub fn artifact_passed(&self, kind: ArtifactKind) -> bool {
        let full = self
            .artifact_coverage
            .get(&kind)
            .is_some_and(|c| *c >= 100.0);
        full && !self
            .findings
            .iter()
            .any(|f| f.artifact_kind == Some(kind))
    }

    pub fn has_shadow(&self) -> bool {
        self.findings.iter().any(|f| f.kind == FindingKind::Shadow)
    }
}
