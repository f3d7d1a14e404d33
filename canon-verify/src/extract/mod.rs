//! Artifact extractors — one per artifact kind, one shared contract.
//!
//! Each extractor understands a specific surface syntax but normalizes to
//! the same `<PREFIX>-<NNN>` rule identity before returning. Extraction is
//! best-effort and pure: a fragment that cannot be parsed becomes an
//! `ExtractionWarning`, never a panic, and extractors share no mutable
//! state, so the five run in parallel.

pub mod cli;
pub mod contract;
pub mod policy;
pub mod test_suite;
pub mod validator;

use rayon::prelude::*;

use canon_core::types::{
    ArtifactKind, ExtractedArtifactSet, ExtractedAttrs, ExtractionWarning, RuleId,
};

use crate::identity;

/// Common extractor contract: pure, no I/O, infallible.
pub trait ArtifactExtractor: Send + Sync {
    fn kind(&self) -> ArtifactKind;
    fn extract(&self, source: &str) -> ExtractedArtifactSet;
}

/// The extractor for one artifact kind.
pub fn extractor_for(kind: ArtifactKind) -> Box<dyn ArtifactExtractor> {
    match kind {
        ArtifactKind::Contract => Box::new(contract::ContractExtractor),
        ArtifactKind::Policy => Box::new(policy::PolicyExtractor),
        ArtifactKind::Validator => Box::new(validator::ValidatorExtractor),
        ArtifactKind::Cli => Box::new(cli::CliExtractor),
        ArtifactKind::Tests => Box::new(test_suite::TestSuiteExtractor),
    }
}

/// Run the matching extractor over each `(kind, source)` pair in parallel
/// and return the results in `ArtifactKind` order. The consistency verifier
/// joins on all five before comparing.
pub fn extract_all(sources: &[(ArtifactKind, &str)]) -> Vec<ExtractedArtifactSet> {
    let mut sets: Vec<ExtractedArtifactSet> = sources
        .par_iter()
        .map(|(kind, source)| extractor_for(*kind).extract(source))
        .collect();
    sets.sort_by_key(|s| s.artifact_kind);
    sets
}

/// Start an extraction result with the source fingerprint filled in.
pub(crate) fn begin(kind: ArtifactKind, source: &str) -> ExtractedArtifactSet {
    ExtractedArtifactSet::new(kind, identity::fingerprint(source.as_bytes()))
}

/// Insert one extracted rule, downgrading duplicates to warnings.
/// The first occurrence wins; a repeat with different attributes is
/// recorded so the report can show the inconsistency inside the artifact.
pub(crate) fn insert_rule(
    set: &mut ExtractedArtifactSet,
    id: RuleId,
    attrs: ExtractedAttrs,
) {
    match set.rules.get(&id) {
        None => {
            set.rules.insert(id, attrs);
        }
        Some(existing) if *existing != attrs => {
            set.warnings.push(ExtractionWarning {
                artifact_kind: set.artifact_kind,
                message: format!("duplicate rule {id} with conflicting attributes"),
            });
        }
        Some(_) => {}
    }
}

/// Record an unparseable rule-shaped fragment.
pub(crate) fn warn_fragment(set: &mut ExtractedArtifactSet, message: String) {
    set.warnings.push(ExtractionWarning {
        artifact_kind: set.artifact_kind,
        message,
    });
}
