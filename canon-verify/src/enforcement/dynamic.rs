//! Dynamic phase: invoke each artifact's own checking entry point.
//!
//! Checkers are external collaborator processes; a non-zero exit status is
//! a failure attributable to that artifact, never fatal to the run. Up to
//! `workers` checks run concurrently and each is subject to a deadline; a
//! timeout is a dynamic-phase failure for that artifact.

use std::collections::BTreeMap;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use canon_core::errors::EnforcementError;
use canon_core::types::ArtifactKind;

use super::types::{ArtifactOutcome, PhaseResult};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// One artifact's checking entry point. The trait seam exists so tests can
/// substitute a stub for real processes.
pub trait ArtifactChecker: Send + Sync {
    /// Run the artifact's checker and return its exit status.
    fn check(&self, kind: ArtifactKind) -> Result<i32, EnforcementError>;
}

/// Production checker: spawns the configured command per artifact, polls
/// until completion or the deadline, and kills on timeout.
pub struct ProcessChecker {
    commands: BTreeMap<ArtifactKind, Vec<String>>,
    timeout: Duration,
}

impl ProcessChecker {
    /// `commands` maps each artifact to a pre-split command line
    /// (program followed by its arguments).
    pub fn new(commands: BTreeMap<ArtifactKind, Vec<String>>, timeout: Duration) -> Self {
        Self { commands, timeout }
    }

    /// Convenience constructor from whitespace-separated command strings,
    /// as they appear in `canon.toml`.
    pub fn from_command_lines(
        lines: &BTreeMap<ArtifactKind, String>,
        timeout: Duration,
    ) -> Self {
        let commands = lines
            .iter()
            .map(|(kind, line)| {
                (*kind, line.split_whitespace().map(str::to_string).collect())
            })
            .collect();
        Self::new(commands, timeout)
    }
}

impl ArtifactChecker for ProcessChecker {
    fn check(&self, kind: ArtifactKind) -> Result<i32, EnforcementError> {
        let argv = self
            .commands
            .get(&kind)
            .filter(|argv| !argv.is_empty())
            .ok_or(EnforcementError::NotConfigured { artifact: kind })?;

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EnforcementError::Launch {
                artifact: kind,
                message: e.to_string(),
            })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let code = status.code().unwrap_or(-1);
                    debug!(artifact = %kind, code, "checker exited");
                    return Ok(code);
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(EnforcementError::Timeout {
                            artifact: kind,
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(EnforcementError::Launch {
                        artifact: kind,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Run all five checkers with a bounded worker count and fold the results
/// into per-artifact outcomes in `ArtifactKind` order.
pub fn dynamic_phase(checker: &dyn ArtifactChecker, workers: usize) -> PhaseResult {
    let run = || -> Vec<ArtifactOutcome> {
        ArtifactKind::ALL
            .par_iter()
            .map(|kind| outcome_for(checker, *kind))
            .collect()
    };

    let outcomes = match rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            // Bounded pool unavailable: degrade to sequential checks.
            warn!(error = %e, "checker worker pool unavailable, running serially");
            ArtifactKind::ALL
                .iter()
                .map(|kind| outcome_for(checker, *kind))
                .collect()
        }
    };

    PhaseResult { outcomes }
}

fn outcome_for(checker: &dyn ArtifactChecker, kind: ArtifactKind) -> ArtifactOutcome {
    match checker.check(kind) {
        Ok(0) => ArtifactOutcome::passed(kind, "checker exited 0".to_string()),
        Ok(code) => ArtifactOutcome::failed(kind, format!("checker exited {code}")),
        Err(e) => {
            // Launch failures are an environment problem, not evidence
            // against the artifact; tag them so callers can tell apart.
            let env_failure = matches!(e, EnforcementError::Launch { .. });
            let mut outcome = ArtifactOutcome::failed(kind, e.to_string());
            outcome.env_failure = env_failure;
            outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubChecker;

    impl ArtifactChecker for StubChecker {
        fn check(&self, kind: ArtifactKind) -> Result<i32, EnforcementError> {
            match kind {
                ArtifactKind::Contract => Ok(0),
                ArtifactKind::Policy => Ok(2),
                ArtifactKind::Validator => Err(EnforcementError::Timeout {
                    artifact: kind,
                    timeout_ms: 100,
                }),
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn nonzero_and_timeout_fail_only_their_artifact() {
        let result = dynamic_phase(&StubChecker, 2);
        assert_eq!(result.outcomes.len(), 5);
        assert_eq!(result.passed_count(), 3);
        let policy = result
            .outcomes
            .iter()
            .find(|o| o.artifact_kind == ArtifactKind::Policy)
            .unwrap();
        assert!(policy.detail.contains("exited 2"));
        let validator = result
            .outcomes
            .iter()
            .find(|o| o.artifact_kind == ArtifactKind::Validator)
            .unwrap();
        assert!(validator.detail.contains("timed out"));
    }

    #[test]
    fn outcomes_keep_artifact_order() {
        let result = dynamic_phase(&StubChecker, 1);
        let kinds: Vec<ArtifactKind> =
            result.outcomes.iter().map(|o| o.artifact_kind).collect();
        assert_eq!(kinds, ArtifactKind::ALL.to_vec());
    }

    #[test]
    fn unconfigured_checker_is_a_failure_not_a_panic() {
        let checker = ProcessChecker::new(BTreeMap::new(), Duration::from_millis(100));
        let result = dynamic_phase(&checker, 2);
        assert_eq!(result.passed_count(), 0);
        assert!(result.outcomes[0].detail.contains("no configured command"));
    }
}
