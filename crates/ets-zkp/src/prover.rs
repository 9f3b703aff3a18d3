//! # Schnorr Prover
//!
//! Two-step interactive prover. [`SchnorrProver::commit`] samples the nonce
//! and fixes `R`; the caller sends `R` to the ledger for a challenge; then
//! [`SchnorrProver::respond`] consumes the nonce and produces the proof.
//!
//! A [`Nonce`] is neither `Clone` nor `Copy`. Responding moves it, so one
//! nonce can answer exactly one challenge.

use std::fmt;

use num_bigint::BigUint;
use num_traits::One;
use rand::{CryptoRng, RngCore};

use ets_core::{Digest256, VerifierSecret};
use ets_crypto::GroupParams;

use crate::proof::{Challenge, Commitment, Response, SchnorrProof};
use crate::traits::ProofError;

/// The hashed secret as an exponent, `x = H(secret) mod P`.
pub struct Witness(BigUint);

impl Witness {
    /// Derive from the normalized secret.
    pub fn from_secret(secret: &VerifierSecret, group: &GroupParams) -> Self {
        Self::from_digest(&secret.digest(), group)
    }

    /// Derive from an already-computed secret hash.
    pub fn from_digest(digest: &Digest256, group: &GroupParams) -> Self {
        Self(group.hash_to_exponent(digest))
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Witness(<redacted>)")
    }
}

/// A single-use nonce together with the commitment it produced.
pub struct Nonce {
    r: BigUint,
    commitment: Commitment,
}

impl Nonce {
    /// Build a nonce from a fixed value in `[1, P-2]`.
    ///
    /// For reproducible test vectors; production nonces come from
    /// [`SchnorrProver::commit`].
    pub fn from_value(r: BigUint, group: &GroupParams) -> Result<Self, ProofError> {
        ensure_usable(group)?;
        let upper = group.exponent_modulus() - BigUint::one();
        if r < BigUint::one() || r > upper {
            return Err(ProofError::WitnessError(format!(
                "nonce outside [1, {upper}]"
            )));
        }
        let commitment = Commitment::new(group.power(&r)?);
        Ok(Self { r, commitment })
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nonce")
            .field("r", &"<redacted>")
            .field("commitment", &self.commitment)
            .finish()
    }
}

fn ensure_usable(group: &GroupParams) -> Result<(), ProofError> {
    if group.is_degenerate() {
        return Err(ProofError::DegenerateGroup(format!(
            "modulus {} must exceed 2",
            group.modulus()
        )));
    }
    Ok(())
}

/// Prover bound to one group.
#[derive(Debug, Clone)]
pub struct SchnorrProver {
    group: GroupParams,
}

impl SchnorrProver {
    pub fn new(group: GroupParams) -> Self {
        Self { group }
    }

    pub fn group(&self) -> &GroupParams {
        &self.group
    }

    /// Sample `r` from `[1, P-2]` and compute `R = G^r mod P`.
    pub fn commit<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<Nonce, ProofError> {
        ensure_usable(&self.group)?;
        let r = self.group.sample_nonce(rng)?;
        let commitment = Commitment::new(self.group.power(&r)?);
        Ok(Nonce { r, commitment })
    }

    /// `s = (r + c*x) mod (P-1)`, consuming the nonce.
    ///
    /// # Errors
    ///
    /// `ProofError::DegenerateGroup` if `P <= 2`.
    pub fn respond(
        &self,
        nonce: Nonce,
        challenge: &Challenge,
        witness: &Witness,
    ) -> Result<SchnorrProof, ProofError> {
        ensure_usable(&self.group)?;
        let order = self.group.exponent_modulus();
        let s = (&nonce.r + challenge.value() * witness.value()) % &order;
        SchnorrProof::new(
            self.group.clone(),
            nonce.commitment,
            challenge.clone(),
            Response::new(s),
        )
        .map_err(|e| ProofError::WitnessError(e.to_string()))
    }
}
