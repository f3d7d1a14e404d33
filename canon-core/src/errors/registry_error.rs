//! Canonical registry errors. All fatal: the pipeline does not run past
//! a registry that cannot validate its own shape.

use super::error_code::{self, CanonErrorCode};

/// Errors from building or validating the canonical registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two sources define the same id with conflicting severity or
    /// category. Conflicting description text alone is not an error.
    #[error("duplicate rule {id}: conflicting {field} ({existing} vs {incoming})")]
    DuplicateRule {
        id: String,
        field: &'static str,
        existing: String,
        incoming: String,
    },

    /// Declared rows x cols does not equal the merged rule count.
    #[error(
        "matrix misaligned: declared {rows}x{cols} = {expected} rules, merged {actual}"
    )]
    MatrixMisaligned {
        rows: u32,
        cols: u32,
        expected: u64,
        actual: u64,
    },

    #[error("rule {id} depends on itself")]
    SelfDependency { id: String },

    #[error("registry source parse failed: {message}")]
    Parse { message: String },
}

impl CanonErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        error_code::REGISTRY_ERROR
    }
}
