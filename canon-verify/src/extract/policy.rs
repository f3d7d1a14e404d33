//! Policy extractor: rule predicates in the policy-engine file.
//!
//! ```text
//! violation["GOV-001"] {
//!     input.approvals < 2
//!     severity := "high"
//! }
//! ```
//!
//! Severity is recoverable when the predicate binds it; category is not
//! expressed at this surface.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use canon_core::types::{
    ArtifactKind, ExtractedArtifactSet, ExtractedAttrs, RuleId, Severity,
};

use super::{begin, insert_rule, warn_fragment, ArtifactExtractor};

fn predicate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?ms)violation\[\s*"([^"]+)"\s*\]\s*\{(.*?)\}"#)
            .expect("policy predicate regex")
    })
}

fn severity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"severity\s*:=\s*"([A-Za-z]+)""#).expect("policy severity regex")
    })
}

pub struct PolicyExtractor;

impl ArtifactExtractor for PolicyExtractor {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Policy
    }

    fn extract(&self, source: &str) -> ExtractedArtifactSet {
        let mut set = begin(self.kind(), source);

        for caps in predicate_re().captures_iter(source) {
            let raw_id = &caps[1];
            let Some(id) = RuleId::normalize(raw_id) else {
                warn_fragment(&mut set, format!("unparseable rule id `{raw_id}`"));
                continue;
            };

            let mut attrs = ExtractedAttrs::default();
            if let Some(sev_caps) = severity_re().captures(&caps[2]) {
                let value = &sev_caps[1];
                match Severity::from_str(value) {
                    Ok(sev) => attrs.severity = Some(sev),
                    Err(_) => warn_fragment(
                        &mut set,
                        format!("rule {id}: unknown severity `{value}`"),
                    ),
                }
            }
            insert_rule(&mut set, id, attrs);
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_predicates_with_severity() {
        let source = r#"
            violation["GOV-001"] {
                input.approvals < 2
                severity := "high"
            }
            violation["SEC-010"] {
                input.tls == false
            }
        "#;
        let set = PolicyExtractor.extract(source);
        assert_eq!(set.rules.len(), 2);
        assert_eq!(
            set.rules[&RuleId::parse("GOV-001").unwrap()].severity,
            Some(Severity::High)
        );
        assert_eq!(set.rules[&RuleId::parse("SEC-010").unwrap()].severity, None);
    }

    #[test]
    fn bad_predicate_id_is_warning() {
        let set = PolicyExtractor.extract(r#"violation["nope"] { x := 1 }"#);
        assert!(set.rules.is_empty());
        assert_eq!(set.warnings.len(), 1);
    }
}
