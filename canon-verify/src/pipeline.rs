//! The verification pipeline: registry -> parallel extraction ->
//! consistency verification -> scoring -> report.
//!
//! Every stage is a pure function of its inputs; the report is handed back
//! to the caller, who decides whether to append it to the audit ledger.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use canon_core::errors::PipelineError;
use canon_core::types::{ArtifactKind, MatrixShape, VerificationReport};

use crate::extract;
use crate::registry::RegistryBuilder;
use crate::scoring;
use crate::verifier;

/// One artifact's raw source text plus its kind tag.
#[derive(Debug, Clone)]
pub struct ArtifactSource {
    pub kind: ArtifactKind,
    pub text: String,
}

/// Run one full verification.
///
/// The verifier joins on all five artifact kinds: `artifacts` must contain
/// exactly one source per kind. An absent artifact would otherwise be
/// indistinguishable from a fully covered one, so a gap or a duplicate is
/// fatal. A registry that fails its own validation (duplicate ids, matrix
/// misalignment) is fatal too: no extraction, no scoring, no report.
/// Artifact extraction failures are not fatal; they surface as warnings and
/// the absent rules show up as `Missing` findings.
pub fn run_verification(
    shape: MatrixShape,
    registry_sources: &[String],
    artifacts: &[ArtifactSource],
) -> Result<VerificationReport, PipelineError> {
    validate_artifact_set(artifacts)?;

    let mut builder = RegistryBuilder::new(shape);
    for source in registry_sources {
        builder.add_source(source)?;
    }
    let registry = builder.build()?;

    let pairs: Vec<(ArtifactKind, &str)> = artifacts
        .iter()
        .map(|a| (a.kind, a.text.as_str()))
        .collect();
    let sets = extract::extract_all(&pairs);

    let findings = verifier::verify(&registry, &sets);
    let breakdown = scoring::score(&registry, &findings);

    let artifact_fingerprints: BTreeMap<ArtifactKind, u64> = sets
        .iter()
        .map(|s| (s.artifact_kind, s.source_fingerprint))
        .collect();
    let extraction_warnings: Vec<String> = sets
        .iter()
        .flat_map(|s| s.warnings.iter().map(|w| w.to_string()))
        .collect();

    let exit_code = if findings.is_empty() { 0 } else { 1 };
    let report = VerificationReport {
        timestamp: unix_now(),
        canonical_rule_count: registry.len(),
        matrix: registry.shape(),
        artifact_coverage: breakdown.artifact_coverage,
        artifact_fingerprints,
        findings,
        extraction_warnings,
        overall_score: breakdown.overall_score,
        certification_tier: breakdown.certification_tier,
        exit_code,
    };

    info!(
        rules = report.canonical_rule_count,
        findings = report.findings.len(),
        score = report.overall_score,
        tier = %report.certification_tier,
        "verification run complete"
    );
    Ok(report)
}

/// Exactly one source per artifact kind, no gaps, no duplicates.
fn validate_artifact_set(artifacts: &[ArtifactSource]) -> Result<(), PipelineError> {
    let mut counts: BTreeMap<ArtifactKind, usize> = BTreeMap::new();
    for artifact in artifacts {
        *counts.entry(artifact.kind).or_insert(0) += 1;
    }
    for kind in ArtifactKind::ALL {
        match counts.get(&kind).copied().unwrap_or(0) {
            0 => {
                return Err(PipelineError::Artifacts {
                    message: format!("no {kind} artifact supplied"),
                })
            }
            1 => {}
            n => {
                return Err(PipelineError::Artifacts {
                    message: format!("{kind} artifact supplied {n} times"),
                })
            }
        }
    }
    Ok(())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
