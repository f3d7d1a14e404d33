//! Audit ledger errors.

use super::error_code::{self, CanonErrorCode};

/// Errors from the append-only audit ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger storage error: {message}")]
    Storage { message: String },

    /// A concurrent append raced past us and took the sequence number.
    /// Retryable: callers re-read the chain head and try again.
    #[error("sequence number {sequence_number} already taken by a concurrent append")]
    SequenceConflict { sequence_number: u64 },

    /// The stored chain does not reproduce. Fatal: all downstream trust
    /// decisions must halt, and this variant is never swallowed.
    #[error("ledger tampered at entry {sequence_number}: {message}")]
    TamperDetected {
        sequence_number: u64,
        message: String,
    },

    #[error("report serialization failed: {message}")]
    Serialize { message: String },
}

impl CanonErrorCode for LedgerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TamperDetected { .. } => error_code::TAMPER_DETECTED,
            _ => error_code::LEDGER_ERROR,
        }
    }
}

impl LedgerError {
    /// Whether the caller may retry the failed append.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SequenceConflict { .. })
    }
}
