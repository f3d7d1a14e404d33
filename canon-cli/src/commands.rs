//! Command implementations and the exit-code contract.
//!
//! Exit codes: 0 clean, 1 findings or failed enforcement, 2 fatal
//! (matrix misalignment, broken config, ledger tampering), 3 environment
//! (unreadable input, unlaunchable checker, ledger storage failure).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use canon_core::config::{CanonConfig, CliOverrides};
use canon_core::errors::LedgerError;
use canon_core::types::{ArtifactKind, VerificationReport};
use canon_ledger::Ledger;
use canon_verify::enforcement::{
    verify_enforcement, EnforcementResult, EnforcementStatus, ProcessChecker,
};
use canon_verify::pipeline::{run_verification, ArtifactSource};
use canon_verify::reporters::create_reporter;

use crate::cli::{Cli, Commands, EnforceArgs, LedgerCommands, VerifyArgs};

pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_ENVIRONMENT: i32 = 3;

const MAX_APPEND_ATTEMPTS: u32 = 5;

pub fn run(cli: Cli) -> i32 {
    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    match &cli.command {
        Commands::Verify(args) => cmd_verify(&root, cli.json, args),
        Commands::Enforce(args) => cmd_enforce(&root, cli.json, args),
        Commands::Ledger { ledger, command } => {
            cmd_ledger(&root, cli.json, ledger.as_deref(), command)
        }
    }
}

fn cmd_verify(root: &Path, json: bool, args: &VerifyArgs) -> i32 {
    let (report, config) = match run_report(root, args, None) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    if !args.no_append {
        let ledger_path = root.join(config.ledger_path());
        let appended = Ledger::open(&ledger_path)
            .and_then(|ledger| ledger.append_with_retry(&report, MAX_APPEND_ATTEMPTS));
        match appended {
            Ok(entry) => {
                debug!(
                    sequence = entry.sequence_number,
                    path = %ledger_path.display(),
                    "report appended to ledger"
                );
            }
            Err(e) => {
                eprintln!("canon: ledger append failed: {e}");
                return ledger_exit(&e);
            }
        }
    }

    if let Err(code) = print_report(&report, json) {
        return code;
    }
    report.exit_code
}

fn cmd_enforce(root: &Path, json: bool, args: &EnforceArgs) -> i32 {
    let (report, config) = match run_report(root, &args.verify, args.timeout_ms) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    let checkers = kind_map(&config.enforcement.checkers);
    let mut references = kind_map(&config.enforcement.references);
    for (kind, command) in &checkers {
        // The checker command itself is the reference token when none is
        // configured: a trigger that runs the checker wires the artifact.
        references.entry(*kind).or_insert_with(|| command.clone());
    }

    let triggers_path = args
        .triggers
        .clone()
        .or_else(|| config.enforcement.triggers_path.as_ref().map(PathBuf::from));
    let trigger_refs = match triggers_path {
        Some(path) => match read_source(&root.join(path)) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(code) => return code,
        },
        None => {
            warn!("no trigger reference file configured, static phase will fail");
            Vec::new()
        }
    };

    let checker = ProcessChecker::from_command_lines(
        &checkers,
        Duration::from_millis(config.timeout_ms()),
    );
    let ledger = match Ledger::open(&root.join(config.ledger_path())) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("canon: cannot open ledger: {e}");
            return EXIT_ENVIRONMENT;
        }
    };

    let result = match verify_enforcement(
        &report,
        &checker,
        &references,
        &trigger_refs,
        &ledger,
        config.workers(),
    ) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("canon: enforcement verification failed: {e}");
            return ledger_exit(&e);
        }
    };

    if let Err(code) = print_enforcement(&result, json) {
        return code;
    }

    if result
        .dynamic_phase
        .outcomes
        .iter()
        .any(|o| o.env_failure)
    {
        return EXIT_ENVIRONMENT;
    }
    if result.status == EnforcementStatus::Pass && report.exit_code == EXIT_CLEAN {
        EXIT_CLEAN
    } else {
        EXIT_FINDINGS
    }
}

fn cmd_ledger(
    root: &Path,
    json: bool,
    ledger_path: Option<&Path>,
    command: &LedgerCommands,
) -> i32 {
    let config = match load_config(root, &CliOverrides::default()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let path = ledger_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(config.ledger_path()));
    let ledger = match Ledger::open(&path) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("canon: cannot open ledger at {}: {e}", path.display());
            return EXIT_ENVIRONMENT;
        }
    };

    match command {
        LedgerCommands::Verify => match ledger.verify_chain() {
            Ok(count) => {
                if json {
                    println!(
                        "{}",
                        serde_json::json!({ "intact": true, "entries": count })
                    );
                } else {
                    println!("ledger chain intact ({count} entries)");
                }
                EXIT_CLEAN
            }
            Err(e @ LedgerError::TamperDetected { .. }) => {
                eprintln!("canon: {e}");
                EXIT_FATAL
            }
            Err(e) => {
                eprintln!("canon: ledger verification failed: {e}");
                EXIT_ENVIRONMENT
            }
        },
        LedgerCommands::Show { limit } => match ledger.entries() {
            Ok(entries) => {
                let start = entries.len().saturating_sub(*limit);
                let recent = &entries[start..];
                if json {
                    match serde_json::to_string_pretty(recent) {
                        Ok(text) => println!("{text}"),
                        Err(e) => {
                            eprintln!("canon: cannot render entries: {e}");
                            return EXIT_ENVIRONMENT;
                        }
                    }
                } else {
                    for entry in recent {
                        println!(
                            "#{:<6} {}  <- {}",
                            entry.sequence_number, entry.entry_hash, entry.prev_entry_hash
                        );
                    }
                }
                EXIT_CLEAN
            }
            Err(e) => {
                eprintln!("canon: cannot read ledger: {e}");
                EXIT_ENVIRONMENT
            }
        },
    }
}

/// Load config, read inputs, and run one verification.
fn run_report(
    root: &Path,
    args: &VerifyArgs,
    timeout_ms: Option<u64>,
) -> Result<(VerificationReport, CanonConfig), i32> {
    let overrides = CliOverrides {
        matrix_rows: args.rows,
        matrix_cols: args.cols,
        ledger_path: args
            .ledger
            .as_ref()
            .map(|p| p.display().to_string()),
        enforcement_timeout_ms: timeout_ms,
    };
    let config = load_config(root, &overrides)?;
    let shape = config.matrix_shape().ok_or_else(|| {
        eprintln!(
            "canon: matrix shape not declared; set [matrix] rows and cols \
             in canon.toml or pass --rows/--cols"
        );
        EXIT_FATAL
    })?;

    let mut registry_sources = Vec::with_capacity(args.registry.len());
    for path in &args.registry {
        registry_sources.push(read_source(path)?);
    }

    let inputs = [
        (ArtifactKind::Contract, &args.contract),
        (ArtifactKind::Policy, &args.policy),
        (ArtifactKind::Validator, &args.validator),
        (ArtifactKind::Cli, &args.cli),
        (ArtifactKind::Tests, &args.tests),
    ];
    let mut artifacts = Vec::with_capacity(inputs.len());
    for (kind, path) in inputs {
        artifacts.push(ArtifactSource {
            kind,
            text: read_source(path)?,
        });
    }

    match run_verification(shape, &registry_sources, &artifacts) {
        Ok(report) => Ok((report, config)),
        Err(e) => {
            eprintln!("canon: {e}");
            Err(e.exit_code())
        }
    }
}

fn load_config(root: &Path, overrides: &CliOverrides) -> Result<CanonConfig, i32> {
    CanonConfig::load(root, Some(overrides)).map_err(|e| {
        eprintln!("canon: {e}");
        EXIT_FATAL
    })
}

fn read_source(path: &Path) -> Result<String, i32> {
    std::fs::read_to_string(path).map_err(|e| {
        eprintln!("canon: cannot read {}: {e}", path.display());
        EXIT_ENVIRONMENT
    })
}

/// Parse artifact-kind keyed config maps, dropping unknown keys with a
/// warning rather than failing the run.
fn kind_map(raw: &BTreeMap<String, String>) -> BTreeMap<ArtifactKind, String> {
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        match key.parse::<ArtifactKind>() {
            Ok(kind) => {
                out.insert(kind, value.clone());
            }
            Err(_) => warn!(key = %key, "unknown artifact kind in enforcement config"),
        }
    }
    out
}

fn ledger_exit(error: &LedgerError) -> i32 {
    if matches!(error, LedgerError::TamperDetected { .. }) {
        EXIT_FATAL
    } else {
        EXIT_ENVIRONMENT
    }
}

fn print_report(report: &VerificationReport, json: bool) -> Result<(), i32> {
    let format = if json { "json" } else { "console" };
    let reporter = create_reporter(format).ok_or(EXIT_ENVIRONMENT)?;
    let rendered = reporter.generate(report).map_err(|e| {
        eprintln!("canon: cannot render report: {e}");
        EXIT_ENVIRONMENT
    })?;
    println!("{rendered}");
    Ok(())
}

fn print_enforcement(result: &EnforcementResult, json: bool) -> Result<(), i32> {
    if json {
        let rendered = serde_json::to_string_pretty(result).map_err(|e| {
            eprintln!("canon: cannot render enforcement result: {e}");
            EXIT_ENVIRONMENT
        })?;
        println!("{rendered}");
        return Ok(());
    }

    let phases = [
        ("static", &result.static_phase),
        ("dynamic", &result.dynamic_phase),
        ("audit", &result.audit_phase),
    ];
    for (name, phase) in phases {
        println!(
            "{name} phase: {}/{} artifacts",
            phase.passed_count(),
            phase.outcomes.len()
        );
        for outcome in &phase.outcomes {
            let mark = if outcome.passed { "ok  " } else { "FAIL" };
            println!("  {mark} {:<9} {}", outcome.artifact_kind.to_string(), outcome.detail);
        }
    }
    println!(
        "enforcement score: {:.1}  status: {:?}",
        result.score, result.status
    );
    Ok(())
}
