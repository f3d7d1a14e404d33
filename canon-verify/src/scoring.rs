//! Coverage scorer: findings in, percentages and a certification tier out.

use std::collections::BTreeMap;

use canon_core::types::{
    ArtifactKind, CertificationTier, Finding, FindingKind,
};

use crate::registry::CanonicalRegistry;

/// Scoring result for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// Raw coverage per artifact: `(count - missing) / count * 100`.
    pub artifact_coverage: BTreeMap<ArtifactKind, f64>,
    /// Severity-weighted score per artifact.
    pub weighted_scores: BTreeMap<ArtifactKind, f64>,
    /// Arithmetic mean of the five weighted scores.
    pub overall_score: f64,
    pub certification_tier: CertificationTier,
}

/// Score one run's findings against the registry.
///
/// Each `Missing` or mismatch finding subtracts the affected rule's
/// severity weight, normalized against the sum of all rule weights, from
/// that artifact's 100% baseline. `Shadow` findings carry no coverage
/// penalty (they do not represent missing enforcement) but cap the
/// certification tier at Bronze.
pub fn score(registry: &CanonicalRegistry, findings: &[Finding]) -> ScoreBreakdown {
    let rule_count = registry.len();
    let total_weight: u64 = registry
        .rules()
        .map(|r| u64::from(r.severity.weight()))
        .sum();

    let mut artifact_coverage = BTreeMap::new();
    let mut weighted_scores = BTreeMap::new();

    for kind in ArtifactKind::ALL {
        let mut missing = 0u64;
        let mut penalty_weight = 0u64;

        for finding in findings.iter().filter(|f| f.artifact_kind == Some(kind)) {
            let rule_weight = finding
                .rule_id
                .as_ref()
                .and_then(|id| registry.get(id))
                .map(|r| u64::from(r.severity.weight()))
                .unwrap_or(0);
            match finding.kind {
                FindingKind::Missing => {
                    missing += 1;
                    penalty_weight += rule_weight;
                }
                FindingKind::SeverityMismatch | FindingKind::CategoryMismatch => {
                    penalty_weight += rule_weight;
                }
                FindingKind::Shadow | FindingKind::MatrixMisaligned => {}
            }
        }

        let coverage = if rule_count == 0 {
            100.0
        } else {
            clamp(
                (rule_count.saturating_sub(missing)) as f64 / rule_count as f64 * 100.0,
            )
        };
        let weighted = if total_weight == 0 {
            100.0
        } else {
            clamp(100.0 - penalty_weight as f64 / total_weight as f64 * 100.0)
        };

        artifact_coverage.insert(kind, coverage);
        weighted_scores.insert(kind, weighted);
    }

    let overall_score = clamp(
        weighted_scores.values().sum::<f64>() / ArtifactKind::ALL.len() as f64,
    );

    let has_shadow = findings.iter().any(|f| f.kind == FindingKind::Shadow);
    let mut certification_tier = CertificationTier::from_score(overall_score);
    if has_shadow && certification_tier > CertificationTier::Bronze {
        certification_tier = CertificationTier::Bronze;
    }

    ScoreBreakdown {
        artifact_coverage,
        weighted_scores,
        overall_score,
        certification_tier,
    }
}

fn clamp(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
