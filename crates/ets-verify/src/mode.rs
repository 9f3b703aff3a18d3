//! Deployment-wide strategy switches.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VerificationError;

/// How an entitlement is authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Schnorr proof of knowledge of the secret; the verifier side never
    /// compares the secret hash itself.
    #[default]
    ZeroKnowledge,
    /// Direct comparison of `H(secret)` with the authorized hash.
    HashReveal,
}

/// What happens when some items of a batch fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Every item is verified and recorded on its own; failures are listed.
    #[default]
    BestEffort,
    /// Items are verified locally, then submitted as one ledger batch that
    /// is recorded only if every item passes.
    AllOrNothing,
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ZeroKnowledge => "zero_knowledge",
            Self::HashReveal => "hash_reveal",
        })
    }
}

impl FromStr for VerificationMode {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "zero_knowledge" | "zk" => Ok(Self::ZeroKnowledge),
            "hash_reveal" => Ok(Self::HashReveal),
            other => Err(VerificationError::Config(format!("unknown verification mode {other:?}"))),
        }
    }
}

impl fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BestEffort => "best_effort",
            Self::AllOrNothing => "all_or_nothing",
        })
    }
}

impl FromStr for BatchPolicy {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(Self::BestEffort),
            "all_or_nothing" => Ok(Self::AllOrNothing),
            other => Err(VerificationError::Config(format!("unknown batch policy {other:?}"))),
        }
    }
}
