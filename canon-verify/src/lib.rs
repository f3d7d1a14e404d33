//! Verification engine for the Canon rule catalog.
//!
//! Stages, leaves first: the canonical registry builder merges master rule
//! sources and validates the matrix invariant; five artifact extractors
//! normalize heterogeneous surfaces into one rule mapping; the consistency
//! verifier cross-compares them against canon; the coverage scorer turns
//! findings into percentages and a certification tier; the enforcement
//! verifier checks that coverage is operationally active, not just
//! structural. Every stage is a pure function of its inputs; only the audit
//! ledger (in `canon-ledger`) holds state.

pub mod enforcement;
pub mod extract;
pub mod identity;
pub mod pipeline;
pub mod registry;
pub mod reporters;
pub mod scoring;
pub mod verifier;

pub use pipeline::{run_verification, ArtifactSource};
pub use registry::{CanonicalRegistry, RegistryBuilder};
