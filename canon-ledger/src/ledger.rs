//! The ledger proper: append, chain verification, and evidence lookup.

use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, ErrorCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use canon_core::errors::LedgerError;
use canon_core::traits::AuditProof;
use canon_core::types::{ArtifactKind, VerificationReport};

use crate::migrations;

/// Sentinel `prev_entry_hash` for the first entry.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// One unit of the audit ledger. Hashes are hex-encoded blake3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub sequence_number: u64,
    pub payload_hash: String,
    pub prev_entry_hash: String,
    pub entry_hash: String,
}

/// Append-only, hash-chained store of verification reports.
///
/// In-process appends are serialized by the connection mutex; cross-process
/// races are caught by SQLite's write lock and the sequence-number primary
/// key, both surfacing as the retryable `SequenceConflict`.
pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    /// Open (and migrate) a file-backed ledger.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Storage {
            message: format!("cannot open ledger at {}: {e}", path.display()),
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory ledger, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory().map_err(|e| LedgerError::Storage {
            message: format!("cannot open in-memory ledger: {e}"),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, LedgerError> {
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append one report as the next chain entry.
    ///
    /// Fails with the retryable `SequenceConflict` if a concurrent append
    /// raced past us; callers retry (or use [`Ledger::append_with_retry`]).
    pub fn append(&self, report: &VerificationReport) -> Result<LedgerEntry, LedgerError> {
        let payload_json =
            report
                .canonical_json()
                .map_err(|e| LedgerError::Serialize {
                    message: e.to_string(),
                })?;
        let payload_hash = hash_hex(payload_json.as_bytes());

        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());

        // BEGIN IMMEDIATE takes the write lock up front, so the head we
        // read below cannot move before our insert commits.
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(map_race_error(0))?;

        let result = (|| {
            let head: Option<(u64, String)> = conn
                .query_row(
                    "SELECT sequence_number, entry_hash FROM ledger_entries
                     ORDER BY sequence_number DESC LIMIT 1",
                    [],
                    |row| Ok((row.get::<_, i64>(0)? as u64, row.get(1)?)),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(LedgerError::Storage {
                        message: other.to_string(),
                    }),
                })?;

            let (sequence_number, prev_entry_hash) = match head {
                Some((seq, hash)) => (seq + 1, hash),
                None => (1, GENESIS_HASH.to_string()),
            };
            let entry_hash =
                compute_entry_hash(sequence_number, &payload_hash, &prev_entry_hash);

            conn.execute(
                "INSERT INTO ledger_entries
                    (sequence_number, payload_json, payload_hash,
                     prev_entry_hash, entry_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    sequence_number as i64,
                    payload_json,
                    payload_hash,
                    prev_entry_hash,
                    entry_hash,
                    unix_now(),
                ],
            )
            .map_err(map_race_error(sequence_number))?;

            for kind in ArtifactKind::ALL {
                if let Some(fingerprint) = report.artifact_fingerprints.get(&kind) {
                    conn.execute(
                        "INSERT INTO ledger_artifacts
                            (sequence_number, artifact_kind, fingerprint, passed)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![
                            sequence_number as i64,
                            kind.as_str(),
                            format!("{fingerprint:016x}"),
                            report.artifact_passed(kind) as i64,
                        ],
                    )
                    .map_err(|e| LedgerError::Storage {
                        message: e.to_string(),
                    })?;
                }
            }

            Ok(LedgerEntry {
                sequence_number,
                payload_hash: payload_hash.clone(),
                prev_entry_hash,
                entry_hash,
            })
        })();

        match &result {
            Ok(entry) => {
                conn.execute_batch("COMMIT")
                    .map_err(map_race_error(entry.sequence_number))?;
                debug!(sequence = entry.sequence_number, "ledger entry appended");
            }
            Err(_) => {
                let _ = conn.execute_batch("ROLLBACK");
            }
        }
        result
    }

    /// Append with bounded retries on sequence conflicts.
    pub fn append_with_retry(
        &self,
        report: &VerificationReport,
        max_attempts: u32,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut attempt = 0;
        loop {
            match self.append(report) {
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Walk the whole chain and verify every link.
    ///
    /// Returns the entry count when the chain is intact. Fails with
    /// `TamperDetected` at the first entry whose payload hash, previous
    /// link, or entry hash does not reproduce. That error must always
    /// reach the caller: a tampered ledger halts all trust decisions.
    pub fn verify_chain(&self) -> Result<u64, LedgerError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let mut stmt = conn
            .prepare_cached(
                "SELECT sequence_number, payload_json, payload_hash,
                        prev_entry_hash, entry_hash
                 FROM ledger_entries ORDER BY sequence_number ASC",
            )
            .map_err(|e| LedgerError::Storage {
                message: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| LedgerError::Storage {
                message: e.to_string(),
            })?;

        let mut expected_seq = 1u64;
        let mut prev_hash = GENESIS_HASH.to_string();
        let mut count = 0u64;

        for row in rows {
            let (seq, payload_json, payload_hash, prev_entry_hash, entry_hash) =
                row.map_err(|e| LedgerError::Storage {
                    message: e.to_string(),
                })?;

            if seq != expected_seq {
                return tamper(seq, format!("expected sequence {expected_seq}"));
            }
            if hash_hex(payload_json.as_bytes()) != payload_hash {
                return tamper(seq, "payload hash does not reproduce".to_string());
            }
            if prev_entry_hash != prev_hash {
                return tamper(seq, "previous-entry link broken".to_string());
            }
            if compute_entry_hash(seq, &payload_hash, &prev_entry_hash) != entry_hash {
                return tamper(seq, "entry hash does not reproduce".to_string());
            }

            prev_hash = entry_hash;
            expected_seq += 1;
            count += 1;
        }

        Ok(count)
    }

    /// All chain entries in sequence order (without payloads).
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let mut stmt = conn
            .prepare_cached(
                "SELECT sequence_number, payload_hash, prev_entry_hash, entry_hash
                 FROM ledger_entries ORDER BY sequence_number ASC",
            )
            .map_err(|e| LedgerError::Storage {
                message: e.to_string(),
            })?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LedgerEntry {
                    sequence_number: row.get::<_, i64>(0)? as u64,
                    payload_hash: row.get(1)?,
                    prev_entry_hash: row.get(2)?,
                    entry_hash: row.get(3)?,
                })
            })
            .map_err(|e| LedgerError::Storage {
                message: e.to_string(),
            })?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Storage {
                message: e.to_string(),
            })
    }

    /// The earliest entry evidencing a passing outcome for the given
    /// artifact fingerprint, if any.
    pub fn find_passing_entry(
        &self,
        artifact_kind: ArtifactKind,
        fingerprint: u64,
    ) -> Result<Option<u64>, LedgerError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        conn.query_row(
            "SELECT sequence_number FROM ledger_artifacts
             WHERE artifact_kind = ?1 AND fingerprint = ?2 AND passed = 1
             ORDER BY sequence_number ASC LIMIT 1",
            params![artifact_kind.as_str(), format!("{fingerprint:016x}")],
            |row| Ok(row.get::<_, i64>(0)? as u64),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(LedgerError::Storage {
                message: other.to_string(),
            }),
        })
    }
}

impl AuditProof for Ledger {
    fn has_passing_evidence(
        &self,
        artifact_kind: ArtifactKind,
        fingerprint: u64,
    ) -> Result<bool, LedgerError> {
        self.find_passing_entry(artifact_kind, fingerprint)
            .map(|found| found.is_some())
    }
}

/// Map lock contention and sequence-number constraint violations to the
/// retryable conflict error; everything else is a storage error.
fn map_race_error(sequence_number: u64) -> impl Fn(rusqlite::Error) -> LedgerError {
    move |e| match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) | Some(ErrorCode::DatabaseBusy) => {
            LedgerError::SequenceConflict { sequence_number }
        }
        _ => LedgerError::Storage {
            message: e.to_string(),
        },
    }
}

fn tamper(sequence_number: u64, message: String) -> Result<u64, LedgerError> {
    error!(sequence = sequence_number, %message, "ledger tamper detected");
    Err(LedgerError::TamperDetected {
        sequence_number,
        message,
    })
}

fn hash_hex(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Entry hash over `(sequence_number, payload_hash, prev_entry_hash)`.
fn compute_entry_hash(sequence_number: u64, payload_hash: &str, prev: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&sequence_number.to_le_bytes());
    hasher.update(payload_hash.as_bytes());
    hasher.update(prev.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_hash_is_deterministic_and_link_sensitive() {
        let a = compute_entry_hash(1, "p", GENESIS_HASH);
        assert_eq!(a, compute_entry_hash(1, "p", GENESIS_HASH));
        assert_ne!(a, compute_entry_hash(2, "p", GENESIS_HASH));
        assert_ne!(a, compute_entry_hash(1, "q", GENESIS_HASH));
        assert_ne!(a, compute_entry_hash(1, "p", &a));
    }

    #[test]
    fn genesis_sentinel_shape() {
        assert_eq!(GENESIS_HASH.len(), 64);
        assert!(GENESIS_HASH.chars().all(|c| c == '0'));
    }
}
