//! Stable error codes for machine-readable diagnostics.

pub const REGISTRY_ERROR: &str = "CANON_REGISTRY";
pub const ARTIFACT_ERROR: &str = "CANON_ARTIFACT";
pub const CONFIG_ERROR: &str = "CANON_CONFIG";
pub const ENFORCEMENT_ERROR: &str = "CANON_ENFORCEMENT";
pub const LEDGER_ERROR: &str = "CANON_LEDGER";
pub const TAMPER_DETECTED: &str = "CANON_TAMPER";
pub const IO_ERROR: &str = "CANON_IO";

/// Every subsystem error carries a stable code.
pub trait CanonErrorCode {
    fn error_code(&self) -> &'static str;
}
