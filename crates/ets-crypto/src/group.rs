//! # Group Parameters
//!
//! The public `(G, P)` pair shared by every proof in a deployment. Changing
//! either value invalidates all outstanding proofs, so the pair travels
//! inside each proof tuple and verifiers compare it against their own.
//!
//! ## Known weakness, preserved
//!
//! The witness is `x = H(secret) mod P`. With a small modulus the 256-bit
//! hash space collapses to `P` residues, so distinct secrets collide and a
//! wrong secret can verify. This mapping is kept exactly; deployments that
//! need real soundness configure a large prime modulus.

use std::fmt;

use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use ets_core::{CryptoError, Digest256};

use crate::modular::{is_residue, modpow};

/// Default generator used by the reference deployment.
pub const DEFAULT_GENERATOR: u64 = 2;
/// Default prime modulus used by the reference deployment.
pub const DEFAULT_MODULUS: u64 = 23;

/// Public generator and prime modulus.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupParams {
    /// Generator `G`.
    #[serde(with = "decimal")]
    generator: BigUint,
    /// Prime modulus `P`.
    #[serde(with = "decimal")]
    modulus: BigUint,
}

impl GroupParams {
    /// Validate and construct group parameters.
    ///
    /// Requires `P > 1` and `G` in `[1, P)`. A modulus of 2 is accepted here
    /// but reported by [`is_degenerate`](Self::is_degenerate); provers refuse
    /// to run over it.
    pub fn new(generator: BigUint, modulus: BigUint) -> Result<Self, CryptoError> {
        if modulus <= BigUint::one() {
            return Err(CryptoError::InvalidModulus(modulus.to_string()));
        }
        if generator < BigUint::one() || generator >= modulus {
            return Err(CryptoError::InvalidGroup(format!(
                "generator {generator} must lie in [1, {modulus})"
            )));
        }
        Ok(Self { generator, modulus })
    }

    /// Construct from machine integers.
    pub fn from_u64(generator: u64, modulus: u64) -> Result<Self, CryptoError> {
        Self::new(BigUint::from(generator), BigUint::from(modulus))
    }

    /// Parse decimal strings.
    pub fn from_decimal(generator: &str, modulus: &str) -> Result<Self, CryptoError> {
        let g = parse_decimal(generator)?;
        let p = parse_decimal(modulus)?;
        Self::new(g, p)
    }

    /// Generator `G`.
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// Modulus `P`.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// The exponent modulus `P - 1`.
    pub fn exponent_modulus(&self) -> BigUint {
        &self.modulus - BigUint::one()
    }

    /// `P <= 2`: the nonce range `[1, P-2]` is empty.
    pub fn is_degenerate(&self) -> bool {
        self.modulus <= BigUint::from(2u8)
    }

    /// True when `value` is in `[0, P)`.
    pub fn contains(&self, value: &BigUint) -> bool {
        is_residue(value, &self.modulus)
    }

    /// `G^exponent mod P`.
    pub fn power(&self, exponent: &BigUint) -> Result<BigUint, CryptoError> {
        modpow(&self.generator, exponent, &self.modulus)
    }

    /// `H mod P` for a 256-bit digest read big-endian.
    pub fn hash_to_exponent(&self, digest: &Digest256) -> BigUint {
        digest.to_biguint() % &self.modulus
    }

    /// Sample a nonce uniformly from `[1, P-2]`.
    pub fn sample_nonce<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<BigUint, CryptoError> {
        if self.is_degenerate() {
            return Err(CryptoError::InvalidGroup(format!(
                "modulus {} leaves no nonce range",
                self.modulus
            )));
        }
        // gen_biguint_range samples [low, high).
        Ok(rng.gen_biguint_range(&BigUint::one(), &self.exponent_modulus()))
    }
}

impl Default for GroupParams {
    fn default() -> Self {
        Self {
            generator: BigUint::from(DEFAULT_GENERATOR),
            modulus: BigUint::from(DEFAULT_MODULUS),
        }
    }
}

impl fmt::Debug for GroupParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupParams(G={}, P={})", self.generator, self.modulus)
    }
}

/// Parse an unsigned decimal integer.
pub fn parse_decimal(s: &str) -> Result<BigUint, CryptoError> {
    BigUint::parse_bytes(s.trim().as_bytes(), 10)
        .ok_or_else(|| CryptoError::InvalidGroup(format!("not a decimal integer: {s:?}")))
}

/// Serde adapter for `BigUint` as a decimal string.
///
/// Deserialization also accepts a bare JSON integer, which is how small
/// values appear in hand-written payloads.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Int(u64),
    }

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Int(n) => Ok(BigUint::from(n)),
            Repr::Text(s) => super::parse_decimal(&s).map_err(serde::de::Error::custom),
        }
    }
}
