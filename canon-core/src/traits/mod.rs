//! Cross-crate traits.

pub mod audit_proof;

pub use audit_proof::AuditProof;
