//! # Schnorr Verifier
//!
//! Accepts a proof iff, in order:
//!
//! 1. the proof names the verifier's own group,
//! 2. its challenge equals the one the ledger issued for its `R`,
//! 3. `G^s mod P == R * C^c mod P`, where `C = G^x mod P` is the claimed
//!    value for the entitlement.
//!
//! Range checks on `R`, `s` and `c` already happened when the
//! [`SchnorrProof`] was constructed.

use num_bigint::BigUint;

use ets_core::{CryptoError, Digest256};
use ets_crypto::modular::{mod_mul, modpow};
use ets_crypto::GroupParams;

use crate::proof::{Challenge, SchnorrProof};
use crate::prover::Witness;
use crate::traits::{ProofSystem, VerifyError};

/// `C = G^x mod P` for one entitlement.
///
/// Computing it is one exponentiation; callers verifying many proofs for
/// the same entitlement may compute it once and reuse it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimedValue(BigUint);

impl ClaimedValue {
    /// From the authorized secret hash stored on an ACL entry.
    pub fn from_secret_hash(hash: &Digest256, group: &GroupParams) -> Result<Self, CryptoError> {
        let x = group.hash_to_exponent(hash);
        Ok(Self(group.power(&x)?))
    }

    pub fn from_witness(witness: &Witness, group: &GroupParams) -> Result<Self, CryptoError> {
        Ok(Self(group.power(witness.value())?))
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

/// Verifier bound to one deployment group.
#[derive(Debug, Clone)]
pub struct SchnorrVerifier {
    group: GroupParams,
}

impl SchnorrVerifier {
    pub fn new(group: GroupParams) -> Self {
        Self { group }
    }

    pub fn group(&self) -> &GroupParams {
        &self.group
    }

    fn check(&self, proof: &SchnorrProof, claimed: &ClaimedValue, issued: &Challenge) -> Result<(), VerifyError> {
        if proof.group() != &self.group {
            return Err(VerifyError::MalformedProof(format!(
                "proof group {:?} differs from deployment group {:?}",
                proof.group(),
                self.group
            )));
        }
        if proof.challenge() != issued {
            return Err(VerifyError::ChallengeMismatch {
                issued: issued.value().clone(),
                presented: proof.challenge().value().clone(),
            });
        }
        if !self.group.contains(claimed.value()) {
            return Err(VerifyError::MalformedProof(
                "claimed value outside the residue range".to_string(),
            ));
        }

        let p = self.group.modulus();
        let internal = |e: CryptoError| VerifyError::MalformedProof(e.to_string());
        let lhs = self.group.power(proof.response().value()).map_err(internal)?;
        let claimed_pow = modpow(claimed.value(), proof.challenge().value(), p).map_err(internal)?;
        let rhs = mod_mul(proof.commitment().value(), &claimed_pow, p).map_err(internal)?;

        if lhs == rhs {
            Ok(())
        } else {
            Err(VerifyError::Rejected)
        }
    }
}

impl ProofSystem for SchnorrVerifier {
    type Proof = SchnorrProof;
    type Statement = ClaimedValue;
    type Challenge = Challenge;

    fn verify(&self, statement: &ClaimedValue, proof: &SchnorrProof, issued: &Challenge) -> Result<(), VerifyError> {
        self.check(proof, statement, issued)
    }
}
