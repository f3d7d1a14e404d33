//! Rule identity: ids, categories, severities, and the matrix shape.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A normalized rule identifier: `<PREFIX>-<NNN>`.
///
/// The prefix is 2-8 uppercase alphanumerics starting with a letter and
/// names the rule family; the suffix is exactly three digits. Construction
/// goes through [`RuleId::parse`] or [`RuleId::normalize`], so a held value
/// is always in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Parse an already-canonical id. Rejects anything that is not
    /// `<PREFIX>-<NNN>` in uppercase.
    pub fn parse(raw: &str) -> Option<Self> {
        let (prefix, number) = raw.split_once('-')?;
        if !(2..=8).contains(&prefix.len()) {
            return None;
        }
        let mut chars = prefix.chars();
        if !chars.next().is_some_and(|c| c.is_ascii_uppercase()) {
            return None;
        }
        if !chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return None;
        }
        if number.len() != 3 || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    /// Normalize a loosely formatted id into canonical form.
    ///
    /// Accepts lowercase and `_` separators so identifiers lifted out of
    /// function names (`check_gov_001`) or flags (`--check-gov-001`)
    /// resolve to the same identity as contract ids (`GOV-001`).
    pub fn normalize(raw: &str) -> Option<Self> {
        let upper: String = raw
            .trim()
            .chars()
            .map(|c| if c == '_' { '-' } else { c.to_ascii_uppercase() })
            .collect();
        Self::parse(&upper)
    }

    /// The rule family prefix, e.g. `GOV`.
    pub fn prefix(&self) -> &str {
        self.0.split_once('-').map(|(p, _)| p).unwrap_or(&self.0)
    }

    /// The three-digit ordinal within the family.
    pub fn number(&self) -> &str {
        self.0.split_once('-').map(|(_, n)| n).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered rule severity. The derive order matters: comparisons and the
/// scoring weight table both rely on `Info < Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Scoring weight: a missing CRITICAL rule costs 16x a missing INFO rule.
    pub fn weight(self) -> u32 {
        match self {
            Self::Info => 1,
            Self::Low => 2,
            Self::Medium => 4,
            Self::High => 8,
            Self::Critical => 16,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of rule families. Each family owns an id prefix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Structural,
    Governance,
    Master,
    Security,
    Testing,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 5] = [
        Self::Structural,
        Self::Governance,
        Self::Master,
        Self::Security,
        Self::Testing,
    ];

    /// The id prefix owned by this family.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Structural => "STR",
            Self::Governance => "GOV",
            Self::Master => "MST",
            Self::Security => "SEC",
            Self::Testing => "TST",
        }
    }

    /// Resolve a family from an id prefix, if the prefix is canonical.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.prefix() == prefix)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Governance => "governance",
            Self::Master => "master",
            Self::Security => "security",
            Self::Testing => "testing",
        }
    }
}

impl FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structural" => Ok(Self::Structural),
            "governance" => Ok(Self::Governance),
            "master" => Ok(Self::Master),
            "security" => Ok(Self::Security),
            "testing" => Ok(Self::Testing),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Source-of-Truth rule as held in the canonical registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub category: RuleCategory,
    pub severity: Severity,
    /// Reporting only. Never participates in identity matching.
    #[serde(default)]
    pub description: String,
    /// Other rule ids this rule depends on. Self-loops are rejected at
    /// registry build time; broader cycle detection is out of scope here.
    #[serde(default)]
    pub depends_on: BTreeSet<RuleId>,
}

/// Declared registry shape. The canonical rule count must equal
/// `rows * cols`; the shape is per-run configuration, never a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixShape {
    pub rows: u32,
    pub cols: u32,
}

impl MatrixShape {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    pub fn expected_count(self) -> u64 {
        u64::from(self.rows) * u64::from(self.cols)
    }
}

impl fmt::Display for MatrixShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_canonical_ids() {
        assert!(RuleId::parse("GOV-001").is_some());
        assert!(RuleId::parse("STR-384").is_some());
        assert!(RuleId::parse("A1B2C3D4-999").is_some());
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(RuleId::parse("gov-001").is_none());
        assert!(RuleId::parse("GOV-1").is_none());
        assert!(RuleId::parse("GOV-0001").is_none());
        assert!(RuleId::parse("G-001").is_none());
        assert!(RuleId::parse("1OV-001").is_none());
        assert!(RuleId::parse("GOV001").is_none());
        assert!(RuleId::parse("TOOLONGPFX-001").is_none());
    }

    #[test]
    fn normalize_handles_identifier_forms() {
        assert_eq!(
            RuleId::normalize("gov_001").unwrap().as_str(),
            "GOV-001"
        );
        assert_eq!(
            RuleId::normalize("  sec-042 ").unwrap().as_str(),
            "SEC-042"
        );
        assert!(RuleId::normalize("not a rule").is_none());
    }

    #[test]
    fn severity_order_and_weights() {
        assert!(Severity::Info < Severity::Critical);
        assert_eq!(Severity::Info.weight(), 1);
        assert_eq!(Severity::Critical.weight(), 16);
    }

    #[test]
    fn category_prefix_roundtrip() {
        for cat in RuleCategory::ALL {
            assert_eq!(RuleCategory::from_prefix(cat.prefix()), Some(cat));
        }
        assert_eq!(RuleCategory::from_prefix("ZZZ"), None);
    }

    #[test]
    fn matrix_expected_count() {
        assert_eq!(MatrixShape::new(24, 16).expected_count(), 384);
        assert_eq!(MatrixShape::new(0, 16).expected_count(), 0);
    }
}
