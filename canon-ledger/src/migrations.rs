//! Ledger schema. A single migration; the chain format is versioned by the
//! entry hash definition, not the table layout.

use rusqlite::Connection;

use canon_core::errors::LedgerError;

pub const MIGRATION_SQL: &str = r#"
-- The chain itself. sequence_number is the primary key: a concurrent
-- append that loses the race hits the constraint and must retry.
CREATE TABLE IF NOT EXISTS ledger_entries (
    sequence_number INTEGER PRIMARY KEY,
    payload_json TEXT NOT NULL,
    payload_hash TEXT NOT NULL,
    prev_entry_hash TEXT NOT NULL,
    entry_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL
) STRICT;

-- Per-entry artifact outcomes, denormalized for the audit-proof lookup:
-- "has this exact artifact content ever been evidenced as passing?"
CREATE TABLE IF NOT EXISTS ledger_artifacts (
    sequence_number INTEGER NOT NULL REFERENCES ledger_entries(sequence_number),
    artifact_kind TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    passed INTEGER NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_ledger_artifacts_lookup
    ON ledger_artifacts(artifact_kind, fingerprint, passed);
"#;

/// Apply the schema to a fresh or existing connection.
pub fn migrate(conn: &Connection) -> Result<(), LedgerError> {
    conn.execute_batch(MIGRATION_SQL)
        .map_err(|e| LedgerError::Storage {
            message: format!("ledger migration failed: {e}"),
        })
}
