//! Consistency verifier: cross-compares the canonical registry against all
//! five extracted artifact sets.

use tracing::debug;

use canon_core::types::{ExtractedArtifactSet, Finding, FindingKind};

use crate::registry::CanonicalRegistry;

/// Produce the full finding sequence for one run.
///
/// For each artifact: every canon id absent from it is a `Missing` finding;
/// every extracted id absent from canon is exactly one `Shadow` finding;
/// ids present in both are compared attribute by attribute, one mismatch
/// finding per differing attribute, and only for attributes the artifact
/// actually states.
///
/// Determinism is a correctness requirement: the result is sorted by
/// (artifact kind, rule id, finding kind) so identical inputs always yield
/// identical sequences, which the ledger's payload hash relies on.
pub fn verify(
    registry: &CanonicalRegistry,
    sets: &[ExtractedArtifactSet],
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for set in sets {
        let artifact = set.artifact_kind;

        for rule in registry.rules() {
            match set.rules.get(&rule.id) {
                None => {
                    findings.push(Finding::missing(
                        rule.id.clone(),
                        artifact,
                        format!("canon rule {} absent from {artifact}", rule.id),
                    ));
                }
                Some(attrs) => {
                    if let Some(severity) = attrs.severity {
                        if severity != rule.severity {
                            findings.push(Finding {
                                kind: FindingKind::SeverityMismatch,
                                rule_id: Some(rule.id.clone()),
                                artifact_kind: Some(artifact),
                                detail: format!(
                                    "canon {}, {artifact} {severity}",
                                    rule.severity
                                ),
                            });
                        }
                    }
                    if let Some(category) = attrs.category {
                        if category != rule.category {
                            findings.push(Finding {
                                kind: FindingKind::CategoryMismatch,
                                rule_id: Some(rule.id.clone()),
                                artifact_kind: Some(artifact),
                                detail: format!(
                                    "canon {}, {artifact} {category}",
                                    rule.category
                                ),
                            });
                        }
                    }
                }
            }
        }

        for id in set.rules.keys() {
            if !registry.contains(id) {
                findings.push(Finding::shadow(
                    id.clone(),
                    artifact,
                    format!("rule {id} present in {artifact} but absent from canon"),
                ));
            }
        }
    }

    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    debug!(findings = findings.len(), "consistency verification complete");
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use canon_core::types::{
        ArtifactKind, ExtractedAttrs, MatrixShape, Rule, RuleCategory, RuleId, Severity,
    };
    use crate::registry::RegistryBuilder;

    fn registry(ids: &[&str]) -> CanonicalRegistry {
        let rules = ids
            .iter()
            .map(|id| Rule {
                id: RuleId::parse(id).unwrap(),
                category: RuleCategory::Governance,
                severity: Severity::Medium,
                description: String::new(),
                depends_on: Default::default(),
            })
            .collect();
        let mut builder = RegistryBuilder::new(MatrixShape::new(1, ids.len() as u32));
        builder.add_candidates(rules).unwrap();
        builder.build().unwrap()
    }

    fn set_with(kind: ArtifactKind, ids: &[&str]) -> ExtractedArtifactSet {
        let mut set = ExtractedArtifactSet::new(kind, 0);
        for id in ids {
            set.rules
                .insert(RuleId::parse(id).unwrap(), ExtractedAttrs::default());
        }
        set
    }

    #[test]
    fn missing_and_shadow_findings() {
        let registry = registry(&["GOV-001", "GOV-002", "GOV-003", "GOV-004"]);
        let policy = set_with(ArtifactKind::Policy, &["GOV-001", "GOV-002", "GOV-005"]);

        let findings = verify(&registry, &[policy]);
        let kinds: Vec<(FindingKind, &str)> = findings
            .iter()
            .map(|f| (f.kind, f.rule_id.as_ref().unwrap().as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (FindingKind::Missing, "GOV-003"),
                (FindingKind::Missing, "GOV-004"),
                (FindingKind::Shadow, "GOV-005"),
            ]
        );
    }

    #[test]
    fn mismatch_only_for_stated_attributes() {
        let registry = registry(&["GOV-001"]);
        let mut contract = ExtractedArtifactSet::new(ArtifactKind::Contract, 0);
        contract.rules.insert(
            RuleId::parse("GOV-001").unwrap(),
            ExtractedAttrs {
                severity: Some(Severity::Critical),
                category: None,
            },
        );

        let findings = verify(&registry, &[contract]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::SeverityMismatch);

        // Absent attribute: no finding at all.
        let validator = set_with(ArtifactKind::Validator, &["GOV-001"]);
        assert!(verify(&registry, &[validator]).is_empty());
    }

    #[test]
    fn ordering_is_total_and_stable() {
        let registry = registry(&["GOV-001", "GOV-002"]);
        let sets = vec![
            set_with(ArtifactKind::Tests, &[]),
            set_with(ArtifactKind::Contract, &[]),
        ];
        let a = verify(&registry, &sets);
        let b = verify(&registry, &sets);
        assert_eq!(a, b);
        // Contract findings sort before Tests findings regardless of the
        // order the sets were supplied in.
        assert_eq!(a[0].artifact_kind, Some(ArtifactKind::Contract));
        assert_eq!(a.last().unwrap().artifact_kind, Some(ArtifactKind::Tests));
    }
}
