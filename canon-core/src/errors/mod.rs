//! Error handling for Canon.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod enforcement_error;
pub mod error_code;
pub mod ledger_error;
pub mod pipeline_error;
pub mod registry_error;

pub use config_error::ConfigError;
pub use enforcement_error::EnforcementError;
pub use error_code::CanonErrorCode;
pub use ledger_error::LedgerError;
pub use pipeline_error::PipelineError;
pub use registry_error::RegistryError;
