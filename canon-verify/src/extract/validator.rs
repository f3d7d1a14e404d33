//! Validator extractor: identifier-bearing check functions in the
//! procedural validator implementation.
//!
//! ```text
//! fn check_gov_001(ctx: &Context) -> bool { ... }
//! def validate_sec_010(ctx): ...
//! ```
//!
//! Only the rule identity is recoverable at this surface.

use std::sync::OnceLock;

use regex::Regex;

use canon_core::types::{ArtifactKind, ExtractedArtifactSet, ExtractedAttrs};

use super::{begin, insert_rule, warn_fragment, ArtifactExtractor};
use crate::identity;

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:fn|def|function)\s+(?:check|validate)_([A-Za-z][A-Za-z0-9]*)_([0-9]+)\b",
        )
        .expect("validator function regex")
    })
}

pub struct ValidatorExtractor;

impl ArtifactExtractor for ValidatorExtractor {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Validator
    }

    fn extract(&self, source: &str) -> ExtractedArtifactSet {
        let mut set = begin(self.kind(), source);

        for caps in function_re().captures_iter(source) {
            let (prefix, number) = (&caps[1], &caps[2]);
            match identity::id_from_parts(prefix, number) {
                Some(id) => insert_rule(&mut set, id, ExtractedAttrs::default()),
                None => warn_fragment(
                    &mut set,
                    format!("unparseable check identifier `{prefix}_{number}`"),
                ),
            }
        }

        set
    }
}
