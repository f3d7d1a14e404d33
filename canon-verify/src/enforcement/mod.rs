//! Enforcement verifier: three ordered phases that decide whether coverage
//! is operationally active rather than merely structural.
//!
//! 1. Static: is each artifact referenced from an automated trigger?
//! 2. Dynamic: does each artifact's own checker actually pass?
//! 3. Audit proof: has a passing outcome for this exact artifact content
//!    ever been evidenced in the ledger?
//!
//! This stage only reads the ledger; appending this run's own report is
//! the caller's decision.

pub mod dynamic;
pub mod static_refs;
pub mod types;

use std::collections::BTreeMap;

use tracing::info;

use canon_core::errors::LedgerError;
use canon_core::traits::AuditProof;
use canon_core::types::{ArtifactKind, VerificationReport};

pub use dynamic::{dynamic_phase, ArtifactChecker, ProcessChecker};
pub use static_refs::static_phase;
pub use types::{ArtifactOutcome, EnforcementResult, EnforcementStatus, PhaseResult};

/// Majority threshold for the five artifacts: static-phase failure at or
/// above this count is an outright `Fail`.
const STATIC_FAIL_MAJORITY: usize = 3;

/// Run the three enforcement phases against one verification report.
///
/// Per-artifact checker failures and timeouts degrade the result, never
/// abort it. The single exception is ledger tampering: a
/// `TamperDetected` from the audit-proof lookup always propagates, because
/// no trust decision may be made over a compromised ledger.
pub fn verify_enforcement(
    report: &VerificationReport,
    checker: &dyn ArtifactChecker,
    references: &BTreeMap<ArtifactKind, String>,
    trigger_refs: &[String],
    audit: &dyn AuditProof,
    workers: usize,
) -> Result<EnforcementResult, LedgerError> {
    let static_result = static_phase(references, trigger_refs);
    let dynamic_result = dynamic_phase(checker, workers);
    let audit_result = audit_phase(report, audit)?;

    let phase_worth = 100.0 / 3.0;
    let per_artifact = ArtifactKind::ALL.len() as f64;
    let score = (static_result.passed_count() as f64 / per_artifact) * phase_worth
        + (dynamic_result.passed_count() as f64 / per_artifact) * phase_worth
        + (audit_result.passed_count() as f64 / per_artifact) * phase_worth;

    let status = if static_result.failed_count() >= STATIC_FAIL_MAJORITY {
        EnforcementStatus::Fail
    } else if static_result.all_passed()
        && dynamic_result.all_passed()
        && audit_result.all_passed()
    {
        EnforcementStatus::Pass
    } else {
        EnforcementStatus::Partial
    };

    info!(
        ?status,
        score,
        static_passed = static_result.passed_count(),
        dynamic_passed = dynamic_result.passed_count(),
        audit_passed = audit_result.passed_count(),
        "enforcement verification complete"
    );

    Ok(EnforcementResult {
        static_phase: static_result,
        dynamic_phase: dynamic_result,
        audit_phase: audit_result,
        score,
        status,
    })
}

/// Audit-proof phase: for each artifact, look for a prior ledger entry that
/// recorded the same fingerprint with a passing outcome. Absence means
/// "claimed enforcement never evidenced".
fn audit_phase(
    report: &VerificationReport,
    audit: &dyn AuditProof,
) -> Result<PhaseResult, LedgerError> {
    let mut outcomes = Vec::with_capacity(ArtifactKind::ALL.len());
    for kind in ArtifactKind::ALL {
        let outcome = match report.artifact_fingerprints.get(&kind) {
            None => ArtifactOutcome::failed(
                kind,
                "no fingerprint recorded for artifact".to_string(),
            ),
            Some(fingerprint) => match audit.has_passing_evidence(kind, *fingerprint) {
                Ok(true) => ArtifactOutcome::passed(
                    kind,
                    "passing outcome evidenced in ledger".to_string(),
                ),
                Ok(false) => ArtifactOutcome::failed(
                    kind,
                    "claimed enforcement never evidenced".to_string(),
                ),
                Err(e @ LedgerError::TamperDetected { .. }) => return Err(e),
                Err(e) => {
                    ArtifactOutcome::failed(kind, format!("ledger lookup failed: {e}"))
                }
            },
        };
        outcomes.push(outcome);
    }
    Ok(PhaseResult { outcomes })
}
