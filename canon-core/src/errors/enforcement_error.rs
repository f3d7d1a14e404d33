//! Enforcement errors. Per-artifact and non-fatal to the run: a checker
//! that times out or fails is recorded against its artifact, not raised.

use super::error_code::{self, CanonErrorCode};
use crate::types::ArtifactKind;

/// Errors from the dynamic enforcement phase.
#[derive(Debug, thiserror::Error)]
pub enum EnforcementError {
    /// The checker process could not be started at all. The CLI maps this
    /// to exit code 3 (environment), not 1 (findings).
    #[error("{artifact} checker could not be launched: {message}")]
    Launch {
        artifact: ArtifactKind,
        message: String,
    },

    #[error("{artifact} checker timed out after {timeout_ms}ms")]
    Timeout {
        artifact: ArtifactKind,
        timeout_ms: u64,
    },

    #[error("{artifact} checker has no configured command")]
    NotConfigured { artifact: ArtifactKind },
}

impl CanonErrorCode for EnforcementError {
    fn error_code(&self) -> &'static str {
        error_code::ENFORCEMENT_ERROR
    }
}
