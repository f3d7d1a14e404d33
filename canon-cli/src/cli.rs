use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "canon", version, about = "Rule catalog consistency and enforcement verifier")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Project root holding canon.toml (defaults to the current directory)"
    )]
    pub root: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify the five artifacts against the canonical registry and append
    /// the report to the audit ledger
    Verify(VerifyArgs),
    /// Run the three-phase enforcement verification over a fresh report
    Enforce(EnforceArgs),
    /// Audit ledger operations
    Ledger {
        #[arg(long, value_name = "FILE", help = "Ledger database path")]
        ledger: Option<PathBuf>,
        #[command(subcommand)]
        command: LedgerCommands,
    },
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Registry fragment, repeatable; all fragments merge into one catalog
    #[arg(long, value_name = "FILE", required = true)]
    pub registry: Vec<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub contract: PathBuf,
    #[arg(long, value_name = "FILE")]
    pub policy: PathBuf,
    #[arg(long, value_name = "FILE")]
    pub validator: PathBuf,
    #[arg(long, value_name = "FILE")]
    pub cli: PathBuf,
    #[arg(long, value_name = "FILE")]
    pub tests: PathBuf,
    /// Declared matrix rows, overrides canon.toml
    #[arg(long)]
    pub rows: Option<u32>,
    /// Declared matrix columns, overrides canon.toml
    #[arg(long)]
    pub cols: Option<u32>,
    #[arg(long, value_name = "FILE", help = "Ledger database path")]
    pub ledger: Option<PathBuf>,
    /// Do not append this run's report to the ledger
    #[arg(long, default_value_t = false)]
    pub no_append: bool,
}

#[derive(Args, Debug)]
pub struct EnforceArgs {
    #[command(flatten)]
    pub verify: VerifyArgs,
    /// File with one trigger reference string per line, overrides
    /// enforcement.triggers_path
    #[arg(long, value_name = "FILE")]
    pub triggers: Option<PathBuf>,
    /// Per-checker timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommands {
    /// Walk the full hash chain and report the first broken link, if any
    Verify,
    /// Print the most recent entries
    Show {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}
