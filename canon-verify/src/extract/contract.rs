//! Contract extractor: structured key-value rule blocks.
//!
//! ```text
//! rule GOV-001 {
//!     severity = high
//!     category = governance
//!     description = "Reviews require two approvers"
//! }
//! ```
//!
//! The contract is the richest artifact: both severity and category are
//! recoverable.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use canon_core::types::{
    ArtifactKind, ExtractedArtifactSet, ExtractedAttrs, RuleCategory, RuleId, Severity,
};

use super::{begin, insert_rule, warn_fragment, ArtifactExtractor};

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?ms)^\s*rule\s+(\S+)\s*\{(.*?)\}").expect("contract block regex")
    })
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*(severity|category)\s*=\s*"?([A-Za-z]+)"?"#)
            .expect("contract attr regex")
    })
}

pub struct ContractExtractor;

impl ArtifactExtractor for ContractExtractor {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Contract
    }

    fn extract(&self, source: &str) -> ExtractedArtifactSet {
        let mut set = begin(self.kind(), source);

        for caps in block_re().captures_iter(source) {
            let raw_id = &caps[1];
            let Some(id) = RuleId::normalize(raw_id) else {
                warn_fragment(&mut set, format!("unparseable rule id `{raw_id}`"));
                continue;
            };

            let mut attrs = ExtractedAttrs::default();
            for attr in attr_re().captures_iter(&caps[2]) {
                let value = &attr[2];
                match &attr[1] {
                    "severity" => match Severity::from_str(value) {
                        Ok(sev) => attrs.severity = Some(sev),
                        Err(_) => warn_fragment(
                            &mut set,
                            format!("rule {id}: unknown severity `{value}`"),
                        ),
                    },
                    "category" => match RuleCategory::from_str(value) {
                        Ok(cat) => attrs.category = Some(cat),
                        Err(_) => warn_fragment(
                            &mut set,
                            format!("rule {id}: unknown category `{value}`"),
                        ),
                    },
                    _ => unreachable!("attr regex matches severity|category only"),
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
    fn extracts_blocks_with_attributes() {
        let source = r#"
            rule GOV-001 {
                severity = high
                category = governance
            }
            rule SEC-002 {
                severity = critical
            }
        "#;
        let set = ContractExtractor.extract(source);
        assert_eq!(set.rules.len(), 2);
        let gov = &set.rules[&RuleId::parse("GOV-001").unwrap()];
        assert_eq!(gov.severity, Some(Severity::High));
        assert_eq!(gov.category, Some(RuleCategory::Governance));
        let sec = &set.rules[&RuleId::parse("SEC-002").unwrap()];
        assert_eq!(sec.severity, Some(Severity::Critical));
        assert_eq!(sec.category, None);
        assert!(set.warnings.is_empty());
    }

    #[test]
    fn malformed_id_becomes_warning_not_abort() {
        let source = "rule not!an!id { severity = high }\nrule GOV-001 { severity = low }";
        let set = ContractExtractor.extract(source);
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.warnings.len(), 1);
        assert!(set.warnings[0].message.contains("not!an!id"));
    }

    #[test]
    fn unknown_severity_is_warning_and_attr_stays_absent() {
        let set = ContractExtractor.extract("rule GOV-001 { severity = blocker }");
        assert_eq!(
            set.rules[&RuleId::parse("GOV-001").unwrap()].severity,
            None
        );
        assert_eq!(set.warnings.len(), 1);
    }
}
