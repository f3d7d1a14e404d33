//! Top-level Canon configuration with layered resolution.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConfigError;
use crate::types::MatrixShape;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`CANON_*`)
/// 3. Project config (`canon.toml` in the project root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CanonConfig {
    pub matrix: MatrixConfig,
    pub enforcement: EnforcementConfig,
    pub ledger: LedgerConfig,
}

/// Declared registry matrix shape. The rule count must equal rows x cols;
/// the deployment decides the shape, the engine never hardcodes it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatrixConfig {
    pub rows: Option<u32>,
    pub cols: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnforcementConfig {
    /// Per-checker timeout in milliseconds. Default: 30_000.
    pub timeout_ms: Option<u64>,
    /// Bounded worker count for concurrent checker processes. Default: 2.
    pub workers: Option<usize>,
    /// File holding one CI/hook trigger reference string per line.
    pub triggers_path: Option<String>,
    /// Checker command line per artifact kind, e.g.
    /// `contract = "scripts/check-contract.sh"`.
    pub checkers: BTreeMap<String, String>,
    /// Reference token per artifact kind searched in trigger strings.
    /// Defaults to the checker command when absent.
    pub references: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    /// SQLite path for the audit ledger. Default: `canon-ledger.db`.
    pub path: Option<String>,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub matrix_rows: Option<u32>,
    pub matrix_cols: Option<u32>,
    pub ledger_path: Option<String>,
    pub enforcement_timeout_ms: Option<u64>,
}

impl CanonConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_WORKERS: usize = 2;
    pub const DEFAULT_LEDGER_PATH: &'static str = "canon-ledger.db";

    /// Load configuration with layered resolution.
    pub fn load(
        root: &Path,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 3 (lowest file layer): project config
        let project_config_path = root.join("canon.toml");
        if project_config_path.exists() {
            let content = std::fs::read_to_string(&project_config_path).map_err(|_| {
                ConfigError::FileNotFound {
                    path: project_config_path.display().to_string(),
                }
            })?;
            let file_config: CanonConfig =
                toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    path: project_config_path.display().to_string(),
                    message: e.to_string(),
                })?;
            Self::merge(&mut config, &file_config);
            debug!(path = %project_config_path.display(), "project config loaded");
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: CanonConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
                path: "<string>".to_string(),
                message: e.to_string(),
            })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &CanonConfig) -> Result<(), ConfigError> {
        if let Some(rows) = config.matrix.rows {
            if rows == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "matrix.rows".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(cols) = config.matrix.cols {
            if cols == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "matrix.cols".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(timeout) = config.enforcement.timeout_ms {
            if timeout == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "enforcement.timeout_ms".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(workers) = config.enforcement.workers {
            if workers == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "enforcement.workers".to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The declared matrix shape, if both dimensions are configured.
    pub fn matrix_shape(&self) -> Option<MatrixShape> {
        match (self.matrix.rows, self.matrix.cols) {
            (Some(rows), Some(cols)) => Some(MatrixShape::new(rows, cols)),
            _ => None,
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.enforcement.timeout_ms.unwrap_or(Self::DEFAULT_TIMEOUT_MS)
    }

    pub fn workers(&self) -> usize {
        self.enforcement.workers.unwrap_or(Self::DEFAULT_WORKERS)
    }

    pub fn ledger_path(&self) -> &str {
        self.ledger
            .path
            .as_deref()
            .unwrap_or(Self::DEFAULT_LEDGER_PATH)
    }

    /// Merge `other` into `base`, where `other` values override `base`
    /// values only when `other` has a `Some` or non-empty value.
    fn merge(base: &mut CanonConfig, other: &CanonConfig) {
        if other.matrix.rows.is_some() {
            base.matrix.rows = other.matrix.rows;
        }
        if other.matrix.cols.is_some() {
            base.matrix.cols = other.matrix.cols;
        }
        if other.enforcement.timeout_ms.is_some() {
            base.enforcement.timeout_ms = other.enforcement.timeout_ms;
        }
        if other.enforcement.workers.is_some() {
            base.enforcement.workers = other.enforcement.workers;
        }
        if other.enforcement.triggers_path.is_some() {
            base.enforcement.triggers_path = other.enforcement.triggers_path.clone();
        }
        if !other.enforcement.checkers.is_empty() {
            base.enforcement.checkers = other.enforcement.checkers.clone();
        }
        if !other.enforcement.references.is_empty() {
            base.enforcement.references = other.enforcement.references.clone();
        }
        if other.ledger.path.is_some() {
            base.ledger.path = other.ledger.path.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `CANON_MATRIX_ROWS`, `CANON_ENFORCEMENT_TIMEOUT_MS`, etc.
    fn apply_env_overrides(config: &mut CanonConfig) {
        if let Ok(val) = std::env::var("CANON_MATRIX_ROWS") {
            if let Ok(v) = val.parse::<u32>() {
                config.matrix.rows = Some(v);
            }
        }
        if let Ok(val) = std::env::var("CANON_MATRIX_COLS") {
            if let Ok(v) = val.parse::<u32>() {
                config.matrix.cols = Some(v);
            }
        }
        if let Ok(val) = std::env::var("CANON_ENFORCEMENT_TIMEOUT_MS") {
            if let Ok(v) = val.parse::<u64>() {
                config.enforcement.timeout_ms = Some(v);
            }
        }
        if let Ok(val) = std::env::var("CANON_ENFORCEMENT_WORKERS") {
            if let Ok(v) = val.parse::<usize>() {
                config.enforcement.workers = Some(v);
            }
        }
        if let Ok(val) = std::env::var("CANON_LEDGER_PATH") {
            config.ledger.path = Some(val);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut CanonConfig, cli: &CliOverrides) {
        if let Some(v) = cli.matrix_rows {
            config.matrix.rows = Some(v);
        }
        if let Some(v) = cli.matrix_cols {
            config.matrix.cols = Some(v);
        }
        if let Some(ref v) = cli.ledger_path {
            config.ledger.path = Some(v.clone());
        }
        if let Some(v) = cli.enforcement_timeout_ms {
            config.enforcement.timeout_ms = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_configured() {
        let config = CanonConfig::default();
        assert!(config.matrix_shape().is_none());
        assert_eq!(config.timeout_ms(), CanonConfig::DEFAULT_TIMEOUT_MS);
        assert_eq!(config.workers(), CanonConfig::DEFAULT_WORKERS);
        assert_eq!(config.ledger_path(), "canon-ledger.db");
    }

    #[test]
    fn from_toml_parses_full_config() {
        let config = CanonConfig::from_toml(
            r#"
            [matrix]
            rows = 24
            cols = 16

            [enforcement]
            timeout_ms = 5000
            workers = 3

            [enforcement.checkers]
            contract = "scripts/check-contract.sh"

            [ledger]
            path = "/tmp/ledger.db"
            "#,
        )
        .unwrap();
        let shape = config.matrix_shape().unwrap();
        assert_eq!(shape.expected_count(), 384);
        assert_eq!(config.timeout_ms(), 5000);
        assert_eq!(config.workers(), 3);
        assert_eq!(config.ledger_path(), "/tmp/ledger.db");
        assert_eq!(
            config.enforcement.checkers.get("contract").unwrap(),
            "scripts/check-contract.sh"
        );
    }

    #[test]
    fn zero_dimensions_rejected() {
        let err = CanonConfig::from_toml("[matrix]\nrows = 0\ncols = 4\n").unwrap_err();
        match err {
            ConfigError::ValidationFailed { field, .. } => {
                assert_eq!(field, "matrix.rows");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cli_overrides_beat_file_values() {
        let mut config =
            CanonConfig::from_toml("[matrix]\nrows = 2\ncols = 2\n").unwrap();
        let cli = CliOverrides {
            matrix_rows: Some(24),
            matrix_cols: Some(16),
            ..Default::default()
        };
        CanonConfig::apply_cli_overrides(&mut config, &cli);
        assert_eq!(config.matrix_shape().unwrap().expected_count(), 384);
    }

    #[test]
    fn load_layers_project_file_under_cli_flags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("canon.toml"),
            "[matrix]\nrows = 2\ncols = 2\n\n[ledger]\npath = \"audit.db\"\n",
        )
        .unwrap();

        let cli = CliOverrides {
            matrix_cols: Some(3),
            ..Default::default()
        };
        let config = CanonConfig::load(dir.path(), Some(&cli)).unwrap();
        assert_eq!(config.matrix_shape().unwrap().expected_count(), 6);
        assert_eq!(config.ledger_path(), "audit.db");
    }

    #[test]
    fn load_without_project_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CanonConfig::load(dir.path(), None).unwrap();
        assert!(config.matrix_shape().is_none());
        assert_eq!(config.ledger_path(), CanonConfig::DEFAULT_LEDGER_PATH);
    }
}
