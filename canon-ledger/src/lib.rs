//! Append-only, hash-chained audit ledger.
//!
//! Every verification run's report is appended as one entry; each entry's
//! hash covers its sequence number, its payload hash, and the previous
//! entry's hash, so any out-of-band mutation breaks the chain. The ledger
//! exposes no delete or mutate operation. Storage is an injected SQLite
//! connection (file-backed or in-memory for tests), never a process-wide
//! singleton.

pub mod ledger;
pub mod migrations;

pub use ledger::{Ledger, LedgerEntry, GENESIS_HASH};
