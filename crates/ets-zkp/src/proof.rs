//! # Proof Records
//!
//! The wire form of a proof is the flat tuple `{R, s, c, G, P}` with each
//! integer as a decimal string. Deserialization goes through
//! [`SchnorrProof::new`], so an out-of-range value is rejected at the
//! boundary and never reaches the arithmetic.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use ets_crypto::group::decimal;
use ets_crypto::GroupParams;

use crate::traits::VerifyError;

macro_rules! protocol_integer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "decimal")] BigUint);

        impl $name {
            pub fn new(value: BigUint) -> Self {
                Self(value)
            }

            pub fn value(&self) -> &BigUint {
                &self.0
            }
        }

        impl From<u64> for $name {
            fn from(n: u64) -> Self {
                Self(BigUint::from(n))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

protocol_integer!(
    /// Prover's first message, `R = G^r mod P`.
    Commitment
);
protocol_integer!(
    /// Ledger-issued challenge bound to one commitment.
    Challenge
);
protocol_integer!(
    /// Prover's final message, `s = (r + c*x) mod (P-1)`.
    Response
);

/// A complete, range-checked proof tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProofWire", into = "ProofWire")]
pub struct SchnorrProof {
    commitment: Commitment,
    response: Response,
    challenge: Challenge,
    group: GroupParams,
}

impl SchnorrProof {
    /// Assemble a proof, checking `R` and `s` in `[0, P)` and `c` in
    /// `[0, P-1)`.
    pub fn new(
        group: GroupParams,
        commitment: Commitment,
        challenge: Challenge,
        response: Response,
    ) -> Result<Self, VerifyError> {
        if !group.contains(commitment.value()) {
            return Err(VerifyError::MalformedProof(format!(
                "R={commitment} outside [0, {})",
                group.modulus()
            )));
        }
        if !group.contains(response.value()) {
            return Err(VerifyError::MalformedProof(format!(
                "s={response} outside [0, {})",
                group.modulus()
            )));
        }
        if challenge.value() >= &group.exponent_modulus() {
            return Err(VerifyError::MalformedProof(format!(
                "c={challenge} outside [0, {})",
                group.exponent_modulus()
            )));
        }
        Ok(Self {
            commitment,
            response,
            challenge,
            group,
        })
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn group(&self) -> &GroupParams {
        &self.group
    }
}

/// Flat wire representation.
#[derive(Serialize, Deserialize)]
struct ProofWire {
    #[serde(rename = "R")]
    commitment: Commitment,
    #[serde(rename = "s")]
    response: Response,
    #[serde(rename = "c")]
    challenge: Challenge,
    #[serde(rename = "G", with = "decimal")]
    generator: BigUint,
    #[serde(rename = "P", with = "decimal")]
    modulus: BigUint,
}

impl TryFrom<ProofWire> for SchnorrProof {
    type Error = VerifyError;

    fn try_from(w: ProofWire) -> Result<Self, Self::Error> {
        let group = GroupParams::new(w.generator, w.modulus)
            .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
        SchnorrProof::new(group, w.commitment, w.challenge, w.response)
    }
}

impl From<SchnorrProof> for ProofWire {
    fn from(p: SchnorrProof) -> Self {
        Self {
            commitment: p.commitment,
            response: p.response,
            challenge: p.challenge,
            generator: p.group.generator().clone(),
            modulus: p.group.modulus().clone(),
        }
    }
}
