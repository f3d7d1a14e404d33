//! CLI extractor: subcommand and flag tables of the checking tool.
//!
//! ```text
//!   gov-001    Check that reviews require two approvers
//!   --check-sec-010    Verify TLS enforcement
//! ```
//!
//! Only the rule identity is recoverable at this surface.

use std::sync::OnceLock;

use regex::Regex;

use canon_core::types::{ArtifactKind, ExtractedArtifactSet, ExtractedAttrs};

use super::{begin, insert_rule, warn_fragment, ArtifactExtractor};
use crate::identity;

fn flag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"--check-([A-Za-z][A-Za-z0-9]*)-([0-9]+)\b").expect("cli flag regex")
    })
}

/// Subcommand table rows: an indented id followed by at least two spaces
/// of help text.
fn subcommand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s+([A-Za-z][A-Za-z0-9]*)-([0-9]{3})\s{2,}\S")
            .expect("cli subcommand regex")
    })
}

pub struct CliExtractor;

impl ArtifactExtractor for CliExtractor {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Cli
    }

    fn extract(&self, source: &str) -> ExtractedArtifactSet {
        let mut set = begin(self.kind(), source);

        for caps in flag_re().captures_iter(source) {
            let (prefix, number) = (&caps[1], &caps[2]);
            match identity::id_from_parts(prefix, number) {
                Some(id) => insert_rule(&mut set, id, ExtractedAttrs::default()),
                None => warn_fragment(
                    &mut set,
                    format!("unparseable check flag `--check-{prefix}-{number}`"),
                ),
            }
        }

        for caps in subcommand_re().captures_iter(source) {
            let (prefix, number) = (&caps[1], &caps[2]);
            if let Some(id) = identity::id_from_parts(prefix, number) {
                insert_rule(&mut set, id, ExtractedAttrs::default());
            }
            // A table row that does not normalize is indistinguishable from
            // prose; it is skipped rather than warned.
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canon_core::types::RuleId;

    #[test]
    fn extracts_flags_and_subcommand_rows() {
        let source = "\
Usage: sot-check [OPTIONS] [COMMAND]

Commands:
  gov-001    Check that reviews require two approvers
  sec-010    Verify TLS enforcement

Options:
  --check-mst-100    Run the master alignment check
";
        let set = CliExtractor.extract(source);
        assert_eq!(set.rules.len(), 3);
        assert!(set.rules.contains_key(&RuleId::parse("GOV-001").unwrap()));
        assert!(set.rules.contains_key(&RuleId::parse("SEC-010").unwrap()));
        assert!(set.rules.contains_key(&RuleId::parse("MST-100").unwrap()));
    }

    #[test]
    fn malformed_flag_is_warning() {
        let set = CliExtractor.extract("--check-g-01 something");
        assert!(set.rules.is_empty());
        assert_eq!(set.warnings.len(), 1);
    }

    #[test]
    fn same_id_via_flag_and_subcommand_counts_once() {
        let source = "  gov-001    Check approvals\n  --check-gov-001    Same rule\n";
        let set = CliExtractor.extract(source);
        assert_eq!(set.rules.len(), 1);
        assert!(set.warnings.is_empty());
    }
}
