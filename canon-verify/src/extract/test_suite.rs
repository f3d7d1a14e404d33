//! Test-suite extractor: generated test functions whose names bear rule ids.
//!
//! ```text
//! #[test]
//! fn test_gov_001_requires_two_approvers() { ... }
//! ```
//!
//! Only the rule identity is recoverable at this surface.

use std::sync::OnceLock;

use regex::Regex;

use canon_core::types::{ArtifactKind, ExtractedArtifactSet, ExtractedAttrs};

use super::{begin, insert_rule, ArtifactExtractor};
use crate::identity;

fn test_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // `(?:_|\b)` instead of a bare `\b`: a descriptive suffix such as
        // `test_gov_001_rejects_single_approver` continues with `_`, which
        // is a word character and would defeat the boundary.
        Regex::new(r"\bfn\s+test_([A-Za-z][A-Za-z0-9]*)_([0-9]{3})(?:_|\b)")
            .expect("test function regex")
    })
}

pub struct TestSuiteExtractor;

impl ArtifactExtractor for TestSuiteExtractor {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Tests
    }

    fn extract(&self, source: &str) -> ExtractedArtifactSet {
        let mut set = begin(self.kind(), source);

        for caps in test_fn_re().captures_iter(source) {
            if let Some(id) = identity::id_from_parts(&caps[1], &caps[2]) {
                insert_rule(&mut set, id, ExtractedAttrs::default());
            }
            // Test names that do not carry a rule id are ordinary tests,
            // not extraction failures.
        }

        set
    }
}
