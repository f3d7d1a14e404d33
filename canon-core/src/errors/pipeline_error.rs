//! Pipeline errors: the aggregate surfaced by `run_verification` and the
//! CLI, with the documented exit-code mapping.

use super::error_code::{self, CanonErrorCode};
use super::{ConfigError, LedgerError, RegistryError};

/// Errors that abort a verification run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The artifact inputs do not form the complete five-kind set the
    /// verifier joins on.
    #[error("artifact inputs invalid: {message}")]
    Artifacts { message: String },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("i/o error: {message}")]
    Io { message: String },
}

impl PipelineError {
    /// CLI exit code contract:
    /// 2 = structural/validation error (fatal, includes tamper),
    /// 3 = tooling/environment error.
    /// Exit codes 0 and 1 belong to completed runs, not errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Registry(_) => 2,
            Self::Artifacts { .. } => 2,
            Self::Ledger(LedgerError::TamperDetected { .. }) => 2,
            Self::Ledger(_) => 3,
            Self::Config(_) => 2,
            Self::Io { .. } => 3,
        }
    }
}

impl CanonErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Registry(e) => e.error_code(),
            Self::Artifacts { .. } => error_code::ARTIFACT_ERROR,
            Self::Ledger(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Io { .. } => error_code::IO_ERROR,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}
