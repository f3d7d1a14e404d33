//! End-to-end pipeline tests: master sources and artifact texts in, report
//! out, across the full extraction and scoring path.

use canon_core::errors::PipelineError;
use canon_core::types::{
    ArtifactKind, CertificationTier, FindingKind, MatrixShape,
};
use canon_verify::pipeline::{run_verification, ArtifactSource};

const REGISTRY: &str = r#"
[[rule]]
id = "GOV-001"
category = "governance"
severity = "high"
description = "Reviews require two approvers"

[[rule]]
id = "GOV-002"
category = "governance"
severity = "medium"
description = "Review latency stays under one day"

[[rule]]
id = "SEC-001"
category = "security"
severity = "critical"
description = "Transport is always TLS"

[[rule]]
id = "STR-001"
category = "structural"
severity = "low"
description = "One module per rule family"
"#;

const CONTRACT: &str = r#"
rule GOV-001 {
    severity = high
    category = governance
}
rule GOV-002 {
    severity = medium
    category = governance
}
rule SEC-001 {
    severity = critical
    category = security
}
rule STR-001 {
    severity = low
    category = structural
}
"#;

const POLICY: &str = r#"
violation["GOV-001"] {
    input.approvals < 2
    severity := "high"
}
violation["GOV-002"] {
    input.review_hours > 24
    severity := "medium"
}
violation["SEC-001"] {
    input.tls == false
    severity := "critical"
}
violation["STR-001"] {
    severity := "low"
}
"#;

const VALIDATOR: &str = r#"
fn check_gov_001(ctx: &Context) -> bool { ctx.approvals >= 2 }
fn check_gov_002(ctx: &Context) -> bool { ctx.review_hours <= 24 }
fn validate_sec_001(ctx: &Context) -> bool { ctx.tls }
fn check_str_001(ctx: &Context) -> bool { ctx.one_module_per_family }
"#;

const CLI: &str = "\
Usage: sot-check [OPTIONS]

Options:
  --check-gov-001    Check that reviews require two approvers
  --check-gov-002    Check review latency
  --check-sec-001    Check TLS enforcement
  --check-str-001    Check module layout
";

const TESTS: &str = r#"
#[test]
fn test_gov_001_rejects_single_approver() {}

#[test]
fn test_gov_002_latency_bound() {}

#[test]
fn test_sec_001_plaintext_rejected() {}

#[test]
fn test_str_001_module_layout() {}

#[test]
fn test_helper_not_a_rule() {}
"#;

fn full_artifacts() -> Vec<ArtifactSource> {
    vec![
        ArtifactSource {
            kind: ArtifactKind::Contract,
            text: CONTRACT.to_string(),
        },
        ArtifactSource {
            kind: ArtifactKind::Policy,
            text: POLICY.to_string(),
        },
        ArtifactSource {
            kind: ArtifactKind::Validator,
            text: VALIDATOR.to_string(),
        },
        ArtifactSource {
            kind: ArtifactKind::Cli,
            text: CLI.to_string(),
        },
        ArtifactSource {
            kind: ArtifactKind::Tests,
            text: TESTS.to_string(),
        },
    ]
}

#[test]
fn fully_aligned_artifacts_score_platinum() {
    let report = run_verification(
        MatrixShape::new(2, 2),
        &[REGISTRY.to_string()],
        &full_artifacts(),
    )
    .unwrap();

    assert_eq!(report.exit_code, 0);
    assert!(report.findings.is_empty());
    assert_eq!(report.canonical_rule_count, 4);
    assert_eq!(report.overall_score, 100.0);
    assert_eq!(report.certification_tier, CertificationTier::Platinum);
    assert_eq!(report.artifact_fingerprints.len(), 5);
    assert!(report.extraction_warnings.is_empty());
    for kind in ArtifactKind::ALL {
        assert!(report.artifact_passed(kind), "{kind} should pass");
    }
}

#[test]
fn policy_gap_and_shadow_produce_ordered_findings() {
    // Policy drops GOV-002 and STR-001 and invents GOV-099.
    let policy = r#"
violation["GOV-001"] {
    severity := "high"
}
violation["SEC-001"] {
    severity := "critical"
}
violation["GOV-099"] {
    severity := "low"
}
"#;
    let mut artifacts = full_artifacts();
    artifacts[1].text = policy.to_string();

    let report = run_verification(
        MatrixShape::new(2, 2),
        &[REGISTRY.to_string()],
        &artifacts,
    )
    .unwrap();

    assert_eq!(report.exit_code, 1);
    let summary: Vec<(FindingKind, &str)> = report
        .findings
        .iter()
        .map(|f| (f.kind, f.rule_id.as_ref().unwrap().as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (FindingKind::Missing, "GOV-002"),
            (FindingKind::Shadow, "GOV-099"),
            (FindingKind::Missing, "STR-001"),
        ]
    );
    assert_eq!(report.artifact_coverage[&ArtifactKind::Policy], 50.0);
    assert_eq!(report.artifact_coverage[&ArtifactKind::Contract], 100.0);
    // The shadow caps certification regardless of the numeric score.
    assert_eq!(report.certification_tier, CertificationTier::Bronze);
    assert!(report.has_shadow());
    assert!(!report.artifact_passed(ArtifactKind::Policy));
    assert!(report.artifact_passed(ArtifactKind::Contract));
}

#[test]
fn contract_attribute_drift_is_a_mismatch_finding() {
    let contract = r#"
rule GOV-001 {
    severity = low
    category = security
}
rule GOV-002 {
    severity = medium
}
rule SEC-001 {
    severity = critical
}
rule STR-001 {
    severity = low
}
"#;
    let mut artifacts = full_artifacts();
    artifacts[0].text = contract.to_string();

    let report = run_verification(
        MatrixShape::new(2, 2),
        &[REGISTRY.to_string()],
        &artifacts,
    )
    .unwrap();

    let gov1: Vec<FindingKind> = report
        .findings
        .iter()
        .filter(|f| f.rule_id.as_ref().is_some_and(|id| id.as_str() == "GOV-001"))
        .map(|f| f.kind)
        .collect();
    // One finding per drifted attribute, severity before category.
    assert_eq!(
        gov1,
        vec![FindingKind::SeverityMismatch, FindingKind::CategoryMismatch]
    );
    assert_eq!(report.exit_code, 1);
    // Coverage is untouched: the rule is present, just mislabeled.
    assert_eq!(report.artifact_coverage[&ArtifactKind::Contract], 100.0);
}

#[test]
fn misaligned_matrix_is_fatal_with_exit_code_2() {
    let err = run_verification(
        MatrixShape::new(3, 2),
        &[REGISTRY.to_string()],
        &full_artifacts(),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Registry(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn absent_artifacts_never_certify() {
    // No artifacts at all: an empty join must not pass as full coverage.
    let err = run_verification(MatrixShape::new(2, 2), &[REGISTRY.to_string()], &[])
        .unwrap_err();
    assert!(matches!(err, PipelineError::Artifacts { .. }));
    assert_eq!(err.exit_code(), 2);

    // One kind missing is just as fatal.
    let mut four = full_artifacts();
    four.remove(1);
    let err = run_verification(MatrixShape::new(2, 2), &[REGISTRY.to_string()], &four)
        .unwrap_err();
    match err {
        PipelineError::Artifacts { message } => {
            assert!(message.contains("no policy artifact"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_artifact_kind_is_rejected() {
    let mut six = full_artifacts();
    six.push(ArtifactSource {
        kind: ArtifactKind::Policy,
        text: POLICY.to_string(),
    });
    let err = run_verification(MatrixShape::new(2, 2), &[REGISTRY.to_string()], &six)
        .unwrap_err();
    match err {
        PipelineError::Artifacts { message } => {
            assert!(message.contains("policy artifact supplied 2 times"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unparseable_master_source_is_fatal() {
    let err = run_verification(
        MatrixShape::new(1, 1),
        &["not valid toml [[[".to_string()],
        &full_artifacts(),
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn identical_inputs_yield_identical_reports() {
    let run = || {
        let mut report = run_verification(
            MatrixShape::new(2, 2),
            &[REGISTRY.to_string()],
            &full_artifacts(),
        )
        .unwrap();
        // The wall-clock stamp is the only field allowed to differ.
        report.timestamp = 0;
        report
    };
    let a = run();
    let b = run();
    assert_eq!(a, b);
    assert_eq!(
        a.canonical_json().unwrap(),
        b.canonical_json().unwrap()
    );
}

#[test]
fn extraction_warnings_surface_in_the_report() {
    let mut artifacts = full_artifacts();
    artifacts[0].text = format!("rule bad!id {{ severity = high }}\n{CONTRACT}");

    let report = run_verification(
        MatrixShape::new(2, 2),
        &[REGISTRY.to_string()],
        &artifacts,
    )
    .unwrap();

    assert!(report
        .extraction_warnings
        .iter()
        .any(|w| w.contains("bad!id")));
    // A warning alone is not a finding.
    assert_eq!(report.exit_code, 0);
}

#[test]
fn registry_sources_merge_across_fragments() {
    let fragment_a = r#"
[[rule]]
id = "GOV-001"
category = "governance"
severity = "high"

[[rule]]
id = "GOV-002"
category = "governance"
severity = "medium"
"#;
    let fragment_b = r#"
[[rule]]
id = "SEC-001"
category = "security"
severity = "critical"

[[rule]]
id = "STR-001"
category = "structural"
severity = "low"
"#;
    let report = run_verification(
        MatrixShape::new(2, 2),
        &[fragment_a.to_string(), fragment_b.to_string()],
        &full_artifacts(),
    )
    .unwrap();
    assert_eq!(report.canonical_rule_count, 4);
    assert_eq!(report.exit_code, 0);
}
