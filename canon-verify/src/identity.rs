//! Rule identity parsing shared by all extractors, and source fingerprints.

use canon_core::types::RuleId;
use xxhash_rust::xxh3::xxh3_64;

/// Compute the xxh3 64-bit fingerprint of artifact source content.
#[inline]
pub fn fingerprint(content: &[u8]) -> u64 {
    xxh3_64(content)
}

/// Normalize a `(prefix, number)` pair captured out of an identifier into
/// a canonical rule id, e.g. `("gov", "001")` -> `GOV-001`.
pub fn id_from_parts(prefix: &str, number: &str) -> Option<RuleId> {
    RuleId::normalize(&format!("{prefix}-{number}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_fingerprint() {
        let data = b"rule GOV-001 {}";
        assert_eq!(fingerprint(data), fingerprint(data));
        assert_ne!(fingerprint(data), fingerprint(b"rule GOV-002 {}"));
    }

    #[test]
    fn parts_normalize() {
        assert_eq!(id_from_parts("gov", "001").unwrap().as_str(), "GOV-001");
        assert!(id_from_parts("g", "001").is_none());
    }
}
