//! Cross-surface extraction: one rule identity, five syntaxes.

use canon_core::types::{ArtifactKind, RuleId};
use canon_verify::extract::extract_all;

#[test]
fn all_five_surfaces_normalize_to_the_same_identity() {
    let sources = [
        (ArtifactKind::Contract, "rule GOV-001 { severity = high }"),
        (ArtifactKind::Policy, r#"violation["GOV-001"] { x := 1 }"#),
        (ArtifactKind::Validator, "fn check_gov_001(ctx: &Context) -> bool { true }"),
        (ArtifactKind::Cli, "  --check-gov-001    Check approvals\n"),
        (ArtifactKind::Tests, "fn test_gov_001_rejects_single_approver() {}"),
    ];

    let sets = extract_all(&sources);
    let id = RuleId::parse("GOV-001").unwrap();
    for set in &sets {
        assert_eq!(
            set.rules.keys().collect::<Vec<_>>(),
            vec![&id],
            "{} should extract exactly GOV-001",
            set.artifact_kind
        );
    }
}

#[test]
fn results_come_back_in_artifact_order_regardless_of_input_order() {
    let sources = [
        (ArtifactKind::Tests, "fn test_gov_001_x() {}"),
        (ArtifactKind::Contract, "rule GOV-001 { severity = high }"),
        (ArtifactKind::Cli, "  --check-gov-001    help\n"),
    ];
    let sets = extract_all(&sources);
    let kinds: Vec<ArtifactKind> = sets.iter().map(|s| s.artifact_kind).collect();
    assert_eq!(
        kinds,
        vec![ArtifactKind::Contract, ArtifactKind::Cli, ArtifactKind::Tests]
    );
}

#[test]
fn fingerprints_track_source_content() {
    let a = extract_all(&[(ArtifactKind::Contract, "rule GOV-001 { severity = high }")]);
    let b = extract_all(&[(ArtifactKind::Contract, "rule GOV-001 { severity = high }")]);
    let c = extract_all(&[(ArtifactKind::Contract, "rule GOV-002 { severity = low }")]);
    assert_eq!(a[0].source_fingerprint, b[0].source_fingerprint);
    assert_ne!(a[0].source_fingerprint, c[0].source_fingerprint);
}

#[test]
fn warnings_are_attributed_to_their_artifact() {
    let sources = [
        (
            ArtifactKind::Contract,
            "rule 9bad-id { severity = high }\nrule GOV-001 { severity = high }",
        ),
        (ArtifactKind::Validator, "fn check_g_01(x) {}"),
        (ArtifactKind::Tests, "fn test_not_a_rule() {}"),
    ];
    let sets = extract_all(&sources);

    let contract = &sets[0];
    assert_eq!(contract.artifact_kind, ArtifactKind::Contract);
    assert_eq!(contract.rules.len(), 1);
    assert_eq!(contract.warnings.len(), 1);
    assert_eq!(contract.warnings[0].artifact_kind, ArtifactKind::Contract);

    let validator = &sets[1];
    assert!(validator.rules.is_empty());
    assert_eq!(validator.warnings.len(), 1);

    // Rule-less test names are ordinary tests, not failures.
    let tests = &sets[2];
    assert!(tests.rules.is_empty());
    assert!(tests.warnings.is_empty());
}
