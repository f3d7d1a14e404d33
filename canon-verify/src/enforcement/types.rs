//! Enforcement result types.

use serde::{Deserialize, Serialize};

use canon_core::types::ArtifactKind;

/// Overall enforcement verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementStatus {
    /// All three phases pass for all five artifacts.
    Pass,
    /// Some checks fail.
    Partial,
    /// The static phase already fails for a majority of artifacts.
    Fail,
}

/// One artifact's result in one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactOutcome {
    pub artifact_kind: ArtifactKind,
    pub passed: bool,
    pub detail: String,
    /// True when the check failed for environment reasons (the checker
    /// could not be launched) rather than because the artifact failed.
    /// The CLI maps this to exit code 3 instead of 1.
    #[serde(default)]
    pub env_failure: bool,
}

impl ArtifactOutcome {
    pub fn passed(artifact_kind: ArtifactKind, detail: String) -> Self {
        Self {
            artifact_kind,
            passed: true,
            detail,
            env_failure: false,
        }
    }

    pub fn failed(artifact_kind: ArtifactKind, detail: String) -> Self {
        Self {
            artifact_kind,
            passed: false,
            detail,
            env_failure: false,
        }
    }
}

/// All five artifacts' results for one phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub outcomes: Vec<ArtifactOutcome>,
}

impl PhaseResult {
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }
}

/// The result of the three-phase enforcement verification. Independent of
/// the coverage scorer's output: an artifact can be structurally covered
/// yet operationally dead, and this is where that shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementResult {
    pub static_phase: PhaseResult,
    pub dynamic_phase: PhaseResult,
    pub audit_phase: PhaseResult,
    /// Additive fold of the three phase sub-scores, each worth up to
    /// 100/3 points.
    pub score: f64,
    pub status: EnforcementStatus,
}
