//! # Prove Subcommand
//!
//! Builds one Schnorr proof tuple for a secret and checks it. The nonce and
//! challenge may be fixed for reproducible vectors; otherwise the nonce is
//! random and the challenge comes from an in-process ledger.

use anyhow::Result;
use clap::Args;
use rand::rngs::OsRng;
use serde::Serialize;

use ets_core::VerifierSecret;
use ets_crypto::group::parse_decimal;
use ets_crypto::GroupParams;
use ets_ledger::{InMemoryLedger, Ledger};
use ets_verify::VerifierConfig;
use ets_zkp::{Challenge, ClaimedValue, Nonce, ProofSystem, SchnorrProof, SchnorrProver, SchnorrVerifier, Witness};

use crate::files::{runtime, write_json};
use crate::{EXIT_OK, EXIT_REJECTED};

#[derive(Args, Debug)]
pub struct ProveArgs {
    /// The verifier secret to prove knowledge of.
    #[arg(long)]
    pub secret: String,

    /// Fixed nonce r in [1, P-2], decimal.
    #[arg(long)]
    pub nonce: Option<String>,

    /// Fixed challenge c in [0, P-1), decimal.
    #[arg(long)]
    pub challenge: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProofOutput {
    pub proof: SchnorrProof,
    /// `G^(H(secret) mod P) mod P`, decimal.
    pub claimed_value: String,
    pub verified: bool,
}

pub fn run_prove(args: &ProveArgs, config: &VerifierConfig) -> Result<u8> {
    let output = build_proof(args, &config.group()?)?;
    write_json(&output, None)?;
    Ok(if output.verified { EXIT_OK } else { EXIT_REJECTED })
}

pub fn build_proof(args: &ProveArgs, group: &GroupParams) -> Result<ProofOutput> {
    let secret = VerifierSecret::new(&args.secret)?;
    let prover = SchnorrProver::new(group.clone());
    let witness = Witness::from_secret(&secret, group);

    let nonce = match &args.nonce {
        Some(r) => Nonce::from_value(parse_decimal(r)?, group)?,
        None => prover.commit(&mut OsRng)?,
    };
    let challenge = match &args.challenge {
        Some(c) => Challenge::new(parse_decimal(c)?),
        None => {
            let ledger = InMemoryLedger::new(group.clone());
            runtime()?.block_on(ledger.get_challenge(nonce.commitment()))?
        }
    };

    let proof = prover.respond(nonce, &challenge, &witness)?;
    let claimed = ClaimedValue::from_secret_hash(&secret.digest(), group)?;
    let verified = SchnorrVerifier::new(group.clone()).is_valid(&claimed, &proof, &challenge);
    tracing::info!(commitment = %proof.commitment(), challenge = %challenge, verified, "proof built");

    Ok(ProofOutput {
        proof,
        claimed_value: claimed.value().to_string(),
        verified,
    })
}
