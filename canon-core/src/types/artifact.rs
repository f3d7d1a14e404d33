//! Artifact kinds and the normalized output of one artifact extraction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::rule::{RuleCategory, RuleId, Severity};

/// The five artifact representations of the rule catalog.
///
/// The derive order is the stable total order used everywhere findings or
/// per-artifact results are sorted; changing it changes report ordering and
/// therefore ledger hashes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Contract,
    Policy,
    Validator,
    Cli,
    Tests,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        Self::Contract,
        Self::Policy,
        Self::Validator,
        Self::Cli,
        Self::Tests,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contract => "contract",
            Self::Policy => "policy",
            Self::Validator => "validator",
            Self::Cli => "cli",
            Self::Tests => "tests",
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contract" => Ok(Self::Contract),
            "policy" => Ok(Self::Policy),
            "validator" => Ok(Self::Validator),
            "cli" => Ok(Self::Cli),
            "tests" => Ok(Self::Tests),
            other => Err(format!("unknown artifact kind: {other}")),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule attributes actually recoverable from one artifact.
///
/// Artifacts carry partial metadata: a test name bears only the id, a
/// contract block bears severity and category. `None` means the artifact
/// does not state the attribute, which is distinct from stating a wrong one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedAttrs {
    pub category: Option<RuleCategory>,
    pub severity: Option<Severity>,
}

/// A fragment the extractor recognized as rule-shaped but could not
/// normalize. Non-fatal: extraction continues and the fragment is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    pub artifact_kind: ArtifactKind,
    pub message: String,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.artifact_kind, self.message)
    }
}

/// Output of one artifact extractor: the normalized rule mapping plus a
/// content fingerprint of the source at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArtifactSet {
    pub artifact_kind: ArtifactKind,
    pub rules: BTreeMap<RuleId, ExtractedAttrs>,
    /// xxh3-64 of the raw source bytes. The ledger uses this to recognize
    /// re-verification against unchanged sources.
    pub source_fingerprint: u64,
    pub warnings: Vec<ExtractionWarning>,
}

impl ExtractedArtifactSet {
    pub fn new(artifact_kind: ArtifactKind, source_fingerprint: u64) -> Self {
        Self {
            artifact_kind,
            rules: BTreeMap::new(),
            source_fingerprint,
            warnings: Vec::new(),
        }
    }
}
