//! # Batch Verification
//!
//! Verifies an ordered list of independent proofs. Each item carries its own
//! statement and its own issued challenge; the only state shared across
//! items is the pair of counters in [`BatchResult`]. A failing item never
//! affects another item's outcome.

use crate::traits::{ProofSystem, VerifyError};

/// One independent verification job.
pub struct BatchItem<S: ProofSystem> {
    pub statement: S::Statement,
    pub proof: S::Proof,
    pub issued: S::Challenge,
}

/// Per-item outcomes, in input order, plus aggregate counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub outcomes: Vec<Result<(), VerifyError>>,
    pub accepted: usize,
    pub rejected: usize,
}

impl BatchResult {
    pub fn all_accepted(&self) -> bool {
        self.rejected == 0
    }

    /// Indices of failed items.
    pub fn failures(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.is_err().then_some(i))
            .collect()
    }
}

/// Runs a [`ProofSystem`] over many items.
#[derive(Debug, Clone)]
pub struct BatchVerifier<S> {
    system: S,
}

impl<S: ProofSystem> BatchVerifier<S> {
    pub fn new(system: S) -> Self {
        Self { system }
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// Verify every item, continuing past failures.
    pub fn verify_all(&self, items: &[BatchItem<S>]) -> BatchResult {
        let mut accepted = 0;
        let mut rejected = 0;
        let outcomes = items
            .iter()
            .map(|item| {
                let outcome = self.system.verify(&item.statement, &item.proof, &item.issued);
                match outcome {
                    Ok(()) => accepted += 1,
                    Err(_) => rejected += 1,
                }
                outcome
            })
            .collect();
        BatchResult {
            outcomes,
            accepted,
            rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::{Challenge, Response, SchnorrProof};
    use crate::prover::{Nonce, SchnorrProver, Witness};
    use crate::verifier::{ClaimedValue, SchnorrVerifier};
    use ets_core::VerifierSecret;
    use ets_crypto::GroupParams;
    use num_bigint::BigUint;

    fn item(group: &GroupParams, secret: &str, r: u64, c: u64) -> BatchItem<SchnorrVerifier> {
        let secret = VerifierSecret::new(secret).unwrap();
        let witness = Witness::from_secret(&secret, group);
        let nonce = Nonce::from_value(BigUint::from(r), group).unwrap();
        let challenge = Challenge::from(c);
        let proof = SchnorrProver::new(group.clone())
            .respond(nonce, &challenge, &witness)
            .unwrap();
        BatchItem {
            statement: ClaimedValue::from_witness(&witness, group).unwrap(),
            proof,
            issued: challenge,
        }
    }

    #[test]
    fn corrupted_item_isolated() {
        let group = GroupParams::default();
        let mut items: Vec<_> = (0..5u64)
            .map(|i| item(&group, &format!("employer{i}@example.com"), i + 2, i + 1))
            .collect();

        let p = &items[3].proof;
        let s = (p.response().value() + BigUint::from(1u8)) % group.exponent_modulus();
        let corrupted = SchnorrProof::new(
            group.clone(),
            p.commitment().clone(),
            p.challenge().clone(),
            Response::new(s),
        )
        .unwrap();
        items[3].proof = corrupted;

        let result = BatchVerifier::new(SchnorrVerifier::new(group)).verify_all(&items);
        assert_eq!(result.outcomes.len(), 5);
        assert_eq!(result.failures(), vec![3]);
        assert_eq!(result.accepted, 4);
        assert_eq!(result.rejected, 1);
        assert!(!result.all_accepted());
    }

    #[test]
    fn empty_batch() {
        let result = BatchVerifier::new(SchnorrVerifier::new(GroupParams::default())).verify_all(&[]);
        assert!(result.outcomes.is_empty());
        assert!(result.all_accepted());
    }

    #[test]
    fn mismatched_challenge_reported_per_item() {
        let group = GroupParams::default();
        let mut items = vec![item(&group, "a@x.io", 3, 4), item(&group, "b@x.io", 5, 6)];
        items[0].issued = Challenge::from(7);
        let result = BatchVerifier::new(SchnorrVerifier::new(group)).verify_all(&items);
        assert!(matches!(result.outcomes[0], Err(VerifyError::ChallengeMismatch { .. })));
        assert!(result.outcomes[1].is_ok());
    }
}
