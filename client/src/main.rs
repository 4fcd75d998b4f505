// Copyright (c) 2026 Sawmill Developers. MIT License.
// See LICENSE for details.

//! # Sawmill Client
//!
//! Entry point for the `sawmill` binary. Parses CLI arguments, initializes
//! logging, and runs one of:
//!
//! - `submit`  — build, sign, and POST a batch list (or print it with `--dry-run`)
//! - `address` — compute a namespaced state address
//! - `inspect` — decode and verify a batch list
//! - `version` — print build version information
//!
//! `submit` is the whole pipeline: generate identity, encode payload, build
//! the transaction, build the batch, submit. The first failing step ends
//! the run with a non-zero exit status.

mod cli;
mod inspect;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use sawmill_protocol::address::{AddressScheme, NamespacedSha512};
use sawmill_protocol::config::ClientConfig;
use sawmill_protocol::crypto::Secp256k1Signer;
use sawmill_protocol::pipeline;
use sawmill_protocol::submit::Submitter;

use cli::{Commands, SawmillCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SawmillCli::parse();

    match cli.command {
        Commands::Submit(args) => submit(args).await,
        Commands::Address(args) => address(args),
        Commands::Inspect(args) => inspect_batch_list(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads the configuration file, or the defaults when none is given, and
/// applies the CLI overrides.
fn load_config(args: &cli::SubmitArgs) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    Ok(config)
}

async fn submit(args: cli::SubmitArgs) -> Result<()> {
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&args.log_format),
    );

    let config = load_config(&args)?;
    let plan = config
        .to_build_plan()
        .context("config payload cannot be encoded")?;

    let signer = match &args.signing_key {
        Some(secret) => Secp256k1Signer::from_hex(secret).context("invalid --signing-key")?,
        None => Secp256k1Signer::generate().context("failed to generate signing key")?,
    };
    tracing::info!(
        public_key = %signer.public_key_hex(),
        family = %plan.family_name,
        version = %plan.family_version,
        "signing identity ready"
    );

    if args.dry_run {
        let prepared =
            pipeline::prepare(&plan, &signer).context("failed to build batch list")?;
        tracing::info!(
            transaction_id = %prepared.transaction_id(),
            batch_id = %prepared.batch_id(),
            "dry run, nothing sent"
        );
        println!("{}", hex::encode(&prepared.bytes));
        return Ok(());
    }

    let submitter = Submitter::with_timeout(&config.endpoint, config.timeout())
        .with_context(|| format!("invalid endpoint {}", config.endpoint))?
        .with_retry_policy(config.retry_policy());

    tracing::info!(
        url = %submitter.batches_url(),
        timeout_ms = submitter.timeout().as_millis() as u64,
        max_attempts = submitter.retry_policy().max_attempts,
        "submitting batch list"
    );
    let submitted = pipeline::run_with_signer(&plan, &signer, &submitter)
        .await
        .with_context(|| format!("failed to submit to {}", submitter.batches_url()))?;

    tracing::info!(
        status = submitted.response.status,
        batch_id = %submitted.prepared.batch_id(),
        "batch list submitted"
    );
    println!("{}", submitted.response.body);
    Ok(())
}

fn address(args: cli::AddressArgs) -> Result<()> {
    let address = NamespacedSha512
        .compute_address(&args.namespace, &args.key)
        .context("failed to compute address")?;
    println!("{address}");
    Ok(())
}

fn inspect_batch_list(args: cli::InspectArgs) -> Result<()> {
    let bytes = match (&args.hex, &args.file) {
        (Some(hex_str), _) => {
            hex::decode(hex_str.trim()).context("--hex is not valid hex")?
        }
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("either --hex or --file is required"),
    };

    let report = inspect::inspect(&bytes).context("not a valid batch list")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("sawmill {}", env!("CARGO_PKG_VERSION"));
    println!("rustc   {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
