//! # ets CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, loads configuration,
//! and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ets_cli::acl::{run_acl, AclArgs};
use ets_cli::disclose::{run_disclose, DiscloseArgs};
use ets_cli::files::load_config;
use ets_cli::merkle::{run_merkle, MerkleArgs};
use ets_cli::prove::{run_prove, ProveArgs};
use ets_cli::verify_batch::{run_verify_batch, VerifyBatchArgs};

/// E-transcript verification toolchain.
///
/// Zero-knowledge verifier entitlement proofs, Merkle-anchored credential
/// integrity, and selective disclosure against an in-process ledger.
#[derive(Parser, Debug)]
#[command(name = "ets", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the verifier configuration (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// ACL fixture generation.
    Acl(AclArgs),

    /// Build and check one Schnorr proof.
    Prove(ProveArgs),

    /// Verify a batch payload against an ACL document.
    VerifyBatch(VerifyBatchArgs),

    /// Merkle root, inclusion proof, and proof verification.
    Merkle(MerkleArgs),

    /// Verify a verifier and print the masked credential record.
    Disclose(DiscloseArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        tracing::debug!(mode = %config.mode, policy = %config.batch_policy, "configuration loaded");
        match &cli.command {
            Commands::Acl(args) => run_acl(args),
            Commands::Prove(args) => run_prove(args, &config),
            Commands::VerifyBatch(args) => run_verify_batch(args, &config),
            Commands::Merkle(args) => run_merkle(args),
            Commands::Disclose(args) => run_disclose(args, &config),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
