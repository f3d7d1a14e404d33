//! Canonical registry builder: merges master rule-definition sources and
//! validates the matrix-alignment invariant.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use canon_core::errors::RegistryError;
use canon_core::types::{
    Finding, FindingKind, MatrixShape, Rule, RuleCategory, RuleId, Severity,
};

/// The authoritative rule set: an immutable `id -> Rule` mapping plus the
/// declared matrix shape it was validated against.
#[derive(Debug, Clone)]
pub struct CanonicalRegistry {
    shape: MatrixShape,
    rules: BTreeMap<RuleId, Rule>,
}

impl CanonicalRegistry {
    pub fn shape(&self) -> MatrixShape {
        self.shape
    }

    pub fn len(&self) -> u64 {
        self.rules.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn contains(&self, id: &RuleId) -> bool {
        self.rules.contains_key(id)
    }

    /// Rules in id order. BTreeMap iteration keeps this deterministic.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RuleId> {
        self.rules.keys()
    }
}

/// One rule candidate as written in a master definition source.
#[derive(Debug, Deserialize)]
struct RuleCandidate {
    id: String,
    category: String,
    severity: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    depends_on: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryDoc {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleCandidate>,
}

/// Merges rule candidates from one or more master sources into the
/// canonical registry.
///
/// Conflicting severity or category for the same id across sources is a
/// fatal `DuplicateRuleError`; conflicting description text alone is not
/// (the first source wins). `build` enforces the matrix invariant last:
/// the merged count must equal the declared `rows x cols`.
#[derive(Debug)]
pub struct RegistryBuilder {
    shape: MatrixShape,
    merged: BTreeMap<RuleId, Rule>,
}

impl RegistryBuilder {
    pub fn new(shape: MatrixShape) -> Self {
        Self {
            shape,
            merged: BTreeMap::new(),
        }
    }

    /// Parse one TOML master source and merge its candidates.
    pub fn add_source(&mut self, source: &str) -> Result<&mut Self, RegistryError> {
        let doc: RegistryDoc =
            toml::from_str(source).map_err(|e| RegistryError::Parse {
                message: e.to_string(),
            })?;
        let candidates = doc
            .rules
            .into_iter()
            .map(parse_candidate)
            .collect::<Result<Vec<_>, _>>()?;
        self.add_candidates(candidates)
    }

    /// Merge already-typed rule candidates.
    pub fn add_candidates(
        &mut self,
        candidates: Vec<Rule>,
    ) -> Result<&mut Self, RegistryError> {
        for rule in candidates {
            if rule.depends_on.contains(&rule.id) {
                return Err(RegistryError::SelfDependency {
                    id: rule.id.to_string(),
                });
            }
            match self.merged.get(&rule.id) {
                None => {
                    self.merged.insert(rule.id.clone(), rule);
                }
                Some(existing) => {
                    if existing.severity != rule.severity {
                        return Err(RegistryError::DuplicateRule {
                            id: rule.id.to_string(),
                            field: "severity",
                            existing: existing.severity.to_string(),
                            incoming: rule.severity.to_string(),
                        });
                    }
                    if existing.category != rule.category {
                        return Err(RegistryError::DuplicateRule {
                            id: rule.id.to_string(),
                            field: "category",
                            existing: existing.category.to_string(),
                            incoming: rule.category.to_string(),
                        });
                    }
                    // Same identity attributes: the first description wins,
                    // dependency sets union.
                    let deps: Vec<RuleId> = rule.depends_on.iter().cloned().collect();
                    if let Some(merged) = self.merged.get_mut(&rule.id) {
                        merged.depends_on.extend(deps);
                    }
                }
            }
        }
        Ok(self)
    }

    /// Number of rules merged so far.
    pub fn merged_count(&self) -> u64 {
        self.merged.len() as u64
    }

    /// Validate the matrix invariant and seal the registry.
    pub fn build(self) -> Result<CanonicalRegistry, RegistryError> {
        let expected = self.shape.expected_count();
        let actual = self.merged.len() as u64;
        if expected != actual {
            return Err(RegistryError::MatrixMisaligned {
                rows: self.shape.rows,
                cols: self.shape.cols,
                expected,
                actual,
            });
        }
        debug!(
            rules = actual,
            shape = %self.shape,
            "canonical registry sealed"
        );
        Ok(CanonicalRegistry {
            shape: self.shape,
            rules: self.merged,
        })
    }
}

/// Render a matrix-alignment failure as a report finding, for tooling that
/// wants to show the condition rather than abort on it. The pipeline itself
/// treats misalignment as fatal.
pub fn alignment_finding(err: &RegistryError) -> Option<Finding> {
    match err {
        RegistryError::MatrixMisaligned {
            rows,
            cols,
            expected,
            actual,
        } => Some(Finding {
            kind: FindingKind::MatrixMisaligned,
            rule_id: None,
            artifact_kind: None,
            detail: format!(
                "declared {rows}x{cols} = {expected} rules, merged {actual}"
            ),
        }),
        _ => None,
    }
}

fn parse_candidate(c: RuleCandidate) -> Result<Rule, RegistryError> {
    let id = RuleId::parse(&c.id).ok_or_else(|| RegistryError::Parse {
        message: format!("malformed rule id: {}", c.id),
    })?;
    let category = RuleCategory::from_str(&c.category)
        .map_err(|message| RegistryError::Parse { message })?;
    let severity = Severity::from_str(&c.severity)
        .map_err(|message| RegistryError::Parse { message })?;
    let depends_on = c
        .depends_on
        .iter()
        .map(|d| {
            RuleId::parse(d).ok_or_else(|| RegistryError::Parse {
                message: format!("malformed dependency id {d} on rule {id}"),
            })
        })
        .collect::<Result<_, _>>()?;
    Ok(Rule {
        id,
        category,
        severity,
        description: c.description,
        depends_on,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, severity: Severity) -> Rule {
        Rule {
            id: RuleId::parse(id).unwrap(),
            category: RuleCategory::Governance,
            severity,
            description: String::new(),
            depends_on: Default::default(),
        }
    }

    #[test]
    fn merge_identical_candidates_is_not_a_conflict() {
        let mut builder = RegistryBuilder::new(MatrixShape::new(1, 1));
        builder
            .add_candidates(vec![rule("GOV-001", Severity::High)])
            .unwrap();
        builder
            .add_candidates(vec![rule("GOV-001", Severity::High)])
            .unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conflicting_severity_is_duplicate_error() {
        let mut builder = RegistryBuilder::new(MatrixShape::new(1, 1));
        builder
            .add_candidates(vec![rule("GOV-001", Severity::High)])
            .unwrap();
        let err = builder
            .add_candidates(vec![rule("GOV-001", Severity::Low)])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRule { field: "severity", .. }));
    }

    #[test]
    fn self_dependency_rejected() {
        let id = RuleId::parse("GOV-001").unwrap();
        let mut r = rule("GOV-001", Severity::High);
        r.depends_on.insert(id);
        let mut builder = RegistryBuilder::new(MatrixShape::new(1, 1));
        let err = builder.add_candidates(vec![r]).unwrap_err();
        assert!(matches!(err, RegistryError::SelfDependency { .. }));
    }

    #[test]
    fn matrix_misalignment_is_fatal() {
        let mut builder = RegistryBuilder::new(MatrixShape::new(2, 2));
        builder
            .add_candidates(vec![
                rule("GOV-001", Severity::High),
                rule("GOV-002", Severity::High),
                rule("GOV-003", Severity::High),
                rule("GOV-004", Severity::High),
                rule("GOV-005", Severity::High),
            ])
            .unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MatrixMisaligned { expected: 4, actual: 5, .. }
        ));
        assert!(alignment_finding(&err).is_some());
    }

    #[test]
    fn toml_source_roundtrip() {
        let mut builder = RegistryBuilder::new(MatrixShape::new(1, 2));
        builder
            .add_source(
                r#"
                [[rule]]
                id = "GOV-001"
                category = "governance"
                severity = "high"
                description = "Reviews require two approvers"
                depends_on = ["GOV-002"]

                [[rule]]
                id = "GOV-002"
                category = "governance"
                severity = "medium"
                "#,
            )
            .unwrap();
        let registry = builder.build().unwrap();
        let r = registry.get(&RuleId::parse("GOV-001").unwrap()).unwrap();
        assert_eq!(r.severity, Severity::High);
        assert_eq!(r.depends_on.len(), 1);
    }

    #[test]
    fn malformed_master_id_is_parse_error() {
        let mut builder = RegistryBuilder::new(MatrixShape::new(1, 1));
        let err = builder
            .add_source("[[rule]]\nid = \"gov1\"\ncategory = \"governance\"\nseverity = \"low\"\n")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }
}
