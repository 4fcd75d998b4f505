//! # CLI Interface
//!
//! Command-line structure for `sawmill`, via `clap` derive. Subcommands:
//! `submit`, `address`, `inspect`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Builds, signs, and submits transaction batches to a ledger node.
#[derive(Parser, Debug)]
#[command(
    name = "sawmill",
    about = "Build, sign, and submit ledger transaction batches",
    version,
    propagate_version = true
)]
pub struct SawmillCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build one transaction, wrap it in a batch, and POST the batch list.
    Submit(SubmitArgs),
    /// Compute a state address from a namespace and key.
    Address(AddressArgs),
    /// Decode and verify a hex-encoded batch list.
    Inspect(InspectArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `submit` subcommand.
#[derive(Parser, Debug)]
pub struct SubmitArgs {
    /// Path to a JSON client configuration file.
    ///
    /// When omitted, the built-in defaults apply: the `intkey` example
    /// transaction against a local node.
    #[arg(long, short = 'c', env = "SAWMILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the ledger node's REST API. Overrides the config file.
    #[arg(long, short = 'e', env = "SAWMILL_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Hex-encoded secp256k1 secret key to sign with.
    ///
    /// A fresh key is generated per run when omitted. Only useful for
    /// reproducible test runs; the key is visible in the process table.
    #[arg(long, env = "SAWMILL_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: Option<String>,

    /// Build and print the batch list as hex without sending it.
    #[arg(long)]
    pub dry_run: bool,

    /// Log format: "pretty" or "json".
    #[arg(long, default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `address` subcommand.
#[derive(Parser, Debug)]
pub struct AddressArgs {
    /// Family namespace, e.g. "intkey".
    #[arg(long, short = 'n')]
    pub namespace: String,

    /// Key within the namespace, e.g. an intkey name.
    #[arg(long, short = 'k')]
    pub key: String,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Hex-encoded batch list, as printed by `submit --dry-run`.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,

    /// File holding the raw (binary) batch list.
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}
