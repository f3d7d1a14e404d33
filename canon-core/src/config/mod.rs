//! Configuration with layered resolution.

pub mod canon_config;

pub use canon_config::{
    CanonConfig, CliOverrides, EnforcementConfig, LedgerConfig, MatrixConfig,
};
