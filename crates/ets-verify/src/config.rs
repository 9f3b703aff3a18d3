//! # Verifier Configuration
//!
//! Loaded from YAML. Every field has a default, so an empty document is a
//! valid configuration for the reference deployment (`G = 2`, `P = 23`).
//!
//! ```yaml
//! generator: "2"
//! modulus: "23"
//! mode: zero_knowledge        # or hash_reveal
//! batch_policy: best_effort   # or all_or_nothing
//! check_integrity: true
//! precompute_claimed_values: true
//! retry:
//!   max_retries: 3
//!   base_delay_ms: 200
//! ```
//!
//! `ETS_VERIFICATION_MODE` and `ETS_BATCH_POLICY` override the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use ets_crypto::{GroupParams, DEFAULT_GENERATOR, DEFAULT_MODULUS};
use ets_ledger::RetryPolicy;

use crate::error::VerificationError;
use crate::mode::{BatchPolicy, VerificationMode};

pub const ENV_MODE: &str = "ETS_VERIFICATION_MODE";
pub const ENV_BATCH_POLICY: &str = "ETS_BATCH_POLICY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Generator `G`, decimal.
    pub generator: String,
    /// Prime modulus `P`, decimal.
    pub modulus: String,
    pub mode: VerificationMode,
    pub batch_policy: BatchPolicy,
    /// Check credential hashes against the store and the anchored root.
    pub check_integrity: bool,
    /// Cache `G^x mod P` per entitlement within a session.
    pub precompute_claimed_values: bool,
    /// Transport retry applied when the service wraps its ledger.
    pub retry: RetryPolicy,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            generator: DEFAULT_GENERATOR.to_string(),
            modulus: DEFAULT_MODULUS.to_string(),
            mode: VerificationMode::default(),
            batch_policy: BatchPolicy::default(),
            check_integrity: true,
            precompute_claimed_values: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl VerifierConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, VerificationError> {
        serde_yaml::from_str(yaml).map_err(|e| VerificationError::Config(format!("invalid YAML: {e}")))
    }

    /// Read, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, VerificationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| VerificationError::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::from_yaml_str(&text)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), VerificationError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), VerificationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_MODE) {
            self.mode = mode.parse()?;
        }
        if let Some(policy) = lookup(ENV_BATCH_POLICY) {
            self.batch_policy = policy.parse()?;
        }
        Ok(())
    }

    /// Parsed group parameters.
    pub fn group(&self) -> Result<GroupParams, VerificationError> {
        GroupParams::from_decimal(&self.generator, &self.modulus)
            .map_err(|e| VerificationError::Config(e.to_string()))
    }

    /// Reject unusable group parameters up front.
    pub fn validate(&self) -> Result<(), VerificationError> {
        let group = self.group()?;
        if group.is_degenerate() {
            return Err(VerificationError::Config(format!(
                "modulus {} is degenerate; it must exceed 2",
                group.modulus()
            )));
        }
        Ok(())
    }
}
