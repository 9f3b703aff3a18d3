//! # In-Memory Ledger
//!
//! A complete [`Ledger`] held in process memory. It behaves like the
//! on-chain contract it stands in for:
//!
//! - Challenges are `1 + (SHA256("ets-challenge-v1" || salt || R) mod (P-2))`,
//!   remembered per `R` so the verifier can look them up for the binding
//!   check.
//! - Every `get_challenge` call opens a round for its `R`; an accepted
//!   submission closes one. A submission with no open round for its `R`
//!   fails, so a replayed proof is refused while two honest rounds that
//!   happen to draw the same `R` both succeed. Small groups repeat `R`
//!   often (`2` has order 11 mod 23).
//! - Submitted proofs are re-verified against the challenge issued for
//!   their `R`.
//! - Each proof costs `21000 + 5000` units; a batch costs
//!   `21000 + 5000 * n`.
//!
//! Availability can be switched off, or made to fail the next `n` calls,
//! to exercise transport failure handling. A failed call changes no state.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use num_bigint::BigUint;
use parking_lot::RwLock;
use rand::RngCore;

use ets_access::{AccessControlList, AclEntry, TranscriptRegistration};
use ets_core::{sha256_bytes, sha256_str, Clock, Digest256, SubjectId};
use ets_crypto::{verify_inclusion, GroupParams, MerkleProof};
use ets_zkp::{Challenge, ClaimedValue, Commitment, ProofSystem, SchnorrVerifier};

use crate::error::LedgerError;
use crate::traits::{BatchReceipt, CommitResult, Ledger, ProofReceipt, ProofSubmission};

/// Fixed cost of one transaction.
pub const BASE_COST: u64 = 21_000;
/// Additional cost per verified proof.
pub const PER_PROOF_COST: u64 = 5_000;

const CHALLENGE_DOMAIN: &[u8] = b"ets-challenge-v1";

#[derive(Default)]
struct State {
    acl: AccessControlList,
    issued: HashMap<BigUint, Challenge>,
    open_rounds: HashMap<BigUint, u32>,
    merkle_root: Option<Digest256>,
    subject_index: HashMap<SubjectId, usize>,
    transcripts: HashMap<SubjectId, TranscriptRegistration>,
    verified: HashSet<SubjectId>,
    block: u64,
}

impl State {
    fn commit(&mut self, operation: &str, payload: &str) -> CommitResult {
        self.block += 1;
        let tx = sha256_str(&format!("{operation}:{}:{payload}", self.block));
        CommitResult {
            block: self.block,
            transaction_id: format!("0x{}", tx.to_hex()),
        }
    }
}

/// In-process ledger.
pub struct InMemoryLedger {
    group: GroupParams,
    verifier: SchnorrVerifier,
    salt: [u8; 32],
    clock: Clock,
    state: RwLock<State>,
    available: AtomicBool,
    transient_failures: AtomicU32,
}

impl InMemoryLedger {
    /// A ledger over `group` with a random challenge salt and the system
    /// clock.
    pub fn new(group: GroupParams) -> Self {
        let mut salt = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        Self::with_salt(group, salt)
    }

    /// A ledger with a fixed challenge salt, for reproducible challenges.
    pub fn with_salt(group: GroupParams, salt: [u8; 32]) -> Self {
        Self {
            verifier: SchnorrVerifier::new(group.clone()),
            group,
            salt,
            clock: Clock::system(),
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
            transient_failures: AtomicU32::new(0),
        }
    }

    /// Use `clock` for expiry checks.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn group(&self) -> &GroupParams {
        &self.group
    }

    /// Switch the ledger on or off. While off every call fails with
    /// `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Fail the next `n` calls with `Unavailable`.
    pub fn fail_next(&self, n: u32) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    /// Current block height.
    pub fn height(&self) -> u64 {
        self.state.read().block
    }

    fn gate(&self) -> Result<(), LedgerError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("ledger is offline".into()));
        }
        let consumed = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            return Err(LedgerError::Unavailable("transient transport failure".into()));
        }
        Ok(())
    }

    fn derive_challenge(&self, r: &BigUint) -> Result<Challenge, LedgerError> {
        if self.group.is_degenerate() {
            return Err(LedgerError::Rejected(format!(
                "no challenge range for modulus {}",
                self.group.modulus()
            )));
        }
        let mut input = Vec::with_capacity(CHALLENGE_DOMAIN.len() + 32 + 32);
        input.extend_from_slice(CHALLENGE_DOMAIN);
        input.extend_from_slice(&self.salt);
        input.extend_from_slice(&r.to_bytes_be());
        let h = sha256_bytes(&input).to_biguint();
        let range = self.group.modulus() - BigUint::from(2u8);
        Ok(Challenge::new(BigUint::from(1u8) + h % range))
    }

    /// Verify one submission against current state without mutating it.
    /// `spoken_for` rounds for the same `R` are already claimed by earlier
    /// items of the same batch.
    fn check_submission(&self, state: &State, submission: &ProofSubmission, spoken_for: u32) -> bool {
        let proof = &submission.proof;
        let r = proof.commitment().value();
        let Some(issued) = state.issued.get(r) else {
            tracing::warn!(subject = %submission.subject_id, "proof submitted for a commitment with no issued challenge");
            return false;
        };
        if state.open_rounds.get(r).copied().unwrap_or(0) <= spoken_for {
            tracing::warn!(subject = %submission.subject_id, "no open round for commitment; replay refused");
            return false;
        }
        if let Some(entry) = state.acl.current(&submission.subject_id) {
            if entry.authorized_secret_hash != submission.authorized_secret_hash {
                return false;
            }
        }
        let Ok(claimed) = ClaimedValue::from_secret_hash(&submission.authorized_secret_hash, &self.group) else {
            return false;
        };
        self.verifier.is_valid(&claimed, proof, issued)
    }

    /// Close one round for the submission's `R` and mark its subject.
    fn record(state: &mut State, submission: &ProofSubmission) {
        let r = submission.proof.commitment().value();
        if let Some(open) = state.open_rounds.get_mut(r) {
            *open -= 1;
            if *open == 0 {
                state.open_rounds.remove(r);
            }
        }
        state.verified.insert(submission.subject_id.clone());
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("group", &self.group)
            .field("height", &self.height())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn get_challenge(&self, commitment: &Commitment) -> Result<Challenge, LedgerError> {
        self.gate()?;
        let r = commitment.value();
        if !self.group.contains(r) {
            return Err(LedgerError::Rejected(format!("commitment {commitment} out of range")));
        }
        let mut state = self.state.write();
        let c = match state.issued.get(r) {
            Some(c) => c.clone(),
            None => {
                let c = self.derive_challenge(r)?;
                state.issued.insert(r.clone(), c.clone());
                c
            }
        };
        *state.open_rounds.entry(r.clone()).or_insert(0) += 1;
        tracing::debug!(%commitment, challenge = %c, "challenge issued");
        Ok(c)
    }

    async fn issued_challenge(&self, commitment: &Commitment) -> Result<Option<Challenge>, LedgerError> {
        self.gate()?;
        Ok(self.state.read().issued.get(commitment.value()).cloned())
    }

    async fn store_acl(&self, entry: AclEntry) -> Result<CommitResult, LedgerError> {
        self.gate()?;
        let mut state = self.state.write();
        let result = state.commit("store_acl", entry.subject_id.as_str());
        state.acl.issue(entry);
        Ok(result)
    }

    async fn get_acl(&self, subject: &SubjectId) -> Result<AclEntry, LedgerError> {
        self.gate()?;
        self.state
            .read()
            .acl
            .current(subject)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("ACL entry for {subject}")))
    }

    async fn store_merkle_root(&self, root: Digest256) -> Result<CommitResult, LedgerError> {
        self.gate()?;
        let mut state = self.state.write();
        let result = state.commit("store_merkle_root", &root.to_hex());
        state.merkle_root = Some(root);
        tracing::info!(%root, block = result.block, "merkle root anchored");
        Ok(result)
    }

    async fn merkle_root(&self) -> Result<Option<Digest256>, LedgerError> {
        self.gate()?;
        Ok(self.state.read().merkle_root)
    }

    async fn verify_merkle_proof(&self, proof: &MerkleProof, leaf: &Digest256) -> Result<bool, LedgerError> {
        self.gate()?;
        let root = self.state.read().merkle_root;
        Ok(root.is_some_and(|root| verify_inclusion(leaf, proof, &root, proof.leaf_index)))
    }

    async fn submit_proof(&self, submission: ProofSubmission) -> Result<ProofReceipt, LedgerError> {
        self.gate()?;
        let mut state = self.state.write();
        let success = self.check_submission(&state, &submission, 0);
        if success {
            Self::record(&mut state, &submission);
        }
        let result = state.commit("submit_proof", submission.subject_id.as_str());
        tracing::info!(subject = %submission.subject_id, success, block = result.block, "proof submitted");
        Ok(ProofReceipt {
            success,
            cost: BASE_COST + PER_PROOF_COST,
            block: result.block,
        })
    }

    async fn submit_batch(&self, submissions: Vec<ProofSubmission>) -> Result<BatchReceipt, LedgerError> {
        self.gate()?;
        let mut state = self.state.write();

        let mut claimed: HashMap<&BigUint, u32> = HashMap::new();
        let results: Vec<bool> = submissions
            .iter()
            .map(|s| {
                let used = claimed.entry(s.proof.commitment().value()).or_insert(0);
                let ok = self.check_submission(&state, s, *used);
                if ok {
                    *used += 1;
                }
                ok
            })
            .collect();
        let committed = results.iter().all(|ok| *ok);
        if committed {
            for s in &submissions {
                Self::record(&mut state, s);
            }
        }

        let result = state.commit("submit_batch", &submissions.len().to_string());
        let n = u64::try_from(submissions.len()).unwrap_or(u64::MAX);
        tracing::info!(items = submissions.len(), committed, block = result.block, "batch submitted");
        Ok(BatchReceipt {
            committed,
            results,
            cost: BASE_COST.saturating_add(PER_PROOF_COST.saturating_mul(n)),
            block: result.block,
        })
    }

    async fn is_verified(&self, subject: &SubjectId) -> Result<bool, LedgerError> {
        self.gate()?;
        Ok(self.state.read().verified.contains(subject))
    }

    async fn store_subject_index(&self, subject: &SubjectId, index: usize) -> Result<CommitResult, LedgerError> {
        self.gate()?;
        let mut state = self.state.write();
        let result = state.commit("store_subject_index", subject.as_str());
        state.subject_index.insert(subject.clone(), index);
        Ok(result)
    }

    async fn get_subject_index(&self, subject: &SubjectId) -> Result<usize, LedgerError> {
        self.gate()?;
        self.state
            .read()
            .subject_index
            .get(subject)
            .copied()
            .ok_or_else(|| LedgerError::NotFound(format!("index for {subject}")))
    }

    async fn register_transcript(&self, registration: TranscriptRegistration) -> Result<CommitResult, LedgerError> {
        self.gate()?;
        let mut state = self.state.write();
        let result = state.commit("register_transcript", registration.subject_id.as_str());
        state.transcripts.insert(registration.subject_id.clone(), registration);
        Ok(result)
    }

    async fn transcript(&self, subject: &SubjectId) -> Result<Option<TranscriptRegistration>, LedgerError> {
        self.gate()?;
        Ok(self.state.read().transcripts.get(subject).cloned())
    }

    async fn verify_transcript(
        &self,
        subject: &SubjectId,
        acl_hash: &Digest256,
        vc_hash: &Digest256,
    ) -> Result<bool, LedgerError> {
        self.gate()?;
        let now = self.clock.now();
        Ok(self
            .state
            .read()
            .transcripts
            .get(subject)
            .is_some_and(|reg| reg.matches(acl_hash, vc_hash, now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ets_access::DisclosureMask;
    use ets_core::{Timestamp, VerifierSecret};
    use ets_crypto::MerkleTree;
    use ets_zkp::{SchnorrProver, Witness};

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::with_salt(GroupParams::default(), [7u8; 32])
    }

    /// Wrong-secret tests need a modulus large enough that distinct
    /// secrets do not collide.
    fn large_ledger() -> InMemoryLedger {
        let group = GroupParams::from_decimal(
            "2",
            "57896044618658097711785492504343953926634992332820282019728792003956564819949",
        )
        .unwrap();
        InMemoryLedger::with_salt(group, [7u8; 32])
    }

    fn subject() -> SubjectId {
        SubjectId::new("did:university:student1").unwrap()
    }

    fn secret() -> VerifierSecret {
        VerifierSecret::new("hr1@gmail.com").unwrap()
    }

    async fn prove(ledger: &InMemoryLedger, secret: &VerifierSecret) -> ProofSubmission {
        let prover = SchnorrProver::new(ledger.group().clone());
        let nonce = prover.commit(&mut rand::rngs::OsRng).unwrap();
        let c = ledger.get_challenge(nonce.commitment()).await.unwrap();
        let witness = Witness::from_secret(secret, ledger.group());
        ProofSubmission {
            subject_id: subject(),
            proof: prover.respond(nonce, &c, &witness).unwrap(),
            authorized_secret_hash: secret.digest(),
        }
    }

    #[tokio::test]
    async fn challenge_is_stable_and_in_range() {
        let l = ledger();
        for r in 0u64..23 {
            let commitment = Commitment::from(r);
            let c1 = l.get_challenge(&commitment).await.unwrap();
            let c2 = l.get_challenge(&commitment).await.unwrap();
            assert_eq!(c1, c2);
            assert!(c1.value() >= &BigUint::from(1u8) && c1.value() <= &BigUint::from(21u8));
        }
    }

    #[tokio::test]
    async fn challenge_rejects_out_of_range_commitment() {
        assert!(matches!(
            ledger().get_challenge(&Commitment::from(23)).await,
            Err(LedgerError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn honest_proof_accepted_once() {
        let l = ledger();
        let submission = prove(&l, &secret()).await;
        let receipt = l.submit_proof(submission.clone()).await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.cost, 26_000);
        assert!(l.is_verified(&subject()).await.unwrap());

        let replay = l.submit_proof(submission).await.unwrap();
        assert!(!replay.success);
    }

    /// A round with a fixed nonce, so two rounds can share `R`.
    async fn prove_with_nonce(ledger: &InMemoryLedger, secret: &VerifierSecret, r: u64) -> ProofSubmission {
        let prover = SchnorrProver::new(ledger.group().clone());
        let nonce = ets_zkp::Nonce::from_value(BigUint::from(r), ledger.group()).unwrap();
        let c = ledger.get_challenge(nonce.commitment()).await.unwrap();
        let witness = Witness::from_secret(secret, ledger.group());
        ProofSubmission {
            subject_id: subject(),
            proof: prover.respond(nonce, &c, &witness).unwrap(),
            authorized_secret_hash: secret.digest(),
        }
    }

    #[tokio::test]
    async fn honest_rounds_sharing_a_commitment_both_succeed() {
        let l = ledger();
        let first = prove_with_nonce(&l, &secret(), 5).await;
        let second = prove_with_nonce(&l, &secret(), 5).await;
        assert_eq!(first, second);

        assert!(l.submit_proof(first.clone()).await.unwrap().success);
        assert!(l.submit_proof(second).await.unwrap().success);
        // Both rounds are closed; a third copy is a replay.
        assert!(!l.submit_proof(first).await.unwrap().success);
    }

    #[tokio::test]
    async fn repeated_rounds_in_the_reference_group_never_exhaust() {
        let l = ledger();
        for _ in 0..60 {
            let submission = prove(&l, &secret()).await;
            assert!(l.submit_proof(submission).await.unwrap().success);
        }
    }

    #[tokio::test]
    async fn issued_challenge_is_a_view() {
        let l = ledger();
        let commitment = Commitment::from(9);
        assert_eq!(l.issued_challenge(&commitment).await.unwrap(), None);

        let submission = prove_with_nonce(&l, &secret(), 5).await;
        let c = l.issued_challenge(submission.proof.commitment()).await.unwrap();
        assert_eq!(c.as_ref(), Some(submission.proof.challenge()));
        l.issued_challenge(submission.proof.commitment()).await.unwrap();

        assert!(l.submit_proof(submission.clone()).await.unwrap().success);
        assert!(!l.submit_proof(submission).await.unwrap().success);
    }

    #[tokio::test]
    async fn batch_claims_one_round_per_item() {
        let l = ledger();
        let proof = prove_with_nonce(&l, &secret(), 5).await;
        let receipt = l.submit_batch(vec![proof.clone(), proof.clone()]).await.unwrap();
        assert!(!receipt.committed);
        assert_eq!(receipt.results, vec![true, false]);

        prove_with_nonce(&l, &secret(), 5).await;
        let receipt = l.submit_batch(vec![proof.clone(), proof]).await.unwrap();
        assert!(receipt.committed);
    }

    #[tokio::test]
    async fn proof_without_issued_challenge_fails() {
        let l = ledger();
        let group = l.group().clone();
        let proof = ets_zkp::SchnorrProof::new(group, 9.into(), 3.into(), 18.into()).unwrap();
        let receipt = l
            .submit_proof(ProofSubmission {
                subject_id: subject(),
                proof,
                authorized_secret_hash: ets_core::sha256_str("abc"),
            })
            .await
            .unwrap();
        assert!(!receipt.success);
        assert!(!l.is_verified(&subject()).await.unwrap());
    }

    #[tokio::test]
    async fn acl_hash_must_match_stored_entry() {
        let l = ledger();
        let entry = AclEntry::new(subject(), &secret(), DisclosureMask::default(), Timestamp::from_epoch_secs(i64::MAX));
        l.store_acl(entry).await.unwrap();
        let other = VerifierSecret::new("someone@else.com").unwrap();
        let submission = prove(&l, &other).await;
        assert!(!l.submit_proof(submission).await.unwrap().success);
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let l = large_ledger();
        let good = prove(&l, &secret()).await;
        let mut bad = prove(&l, &secret()).await;
        bad.authorized_secret_hash = ets_core::sha256_str("not-the-secret");

        let receipt = l.submit_batch(vec![good.clone(), bad]).await.unwrap();
        assert!(!receipt.committed);
        assert_eq!(receipt.cost, 31_000);
        assert!(!l.is_verified(&subject()).await.unwrap());

        // Nothing was recorded, so the good proof is still fresh.
        let receipt = l.submit_batch(vec![good]).await.unwrap();
        assert!(receipt.committed);
        assert_eq!(receipt.results, vec![true]);
    }

    #[tokio::test]
    async fn acl_store_supersedes() {
        let l = ledger();
        let exp = Timestamp::from_epoch_secs(5_000);
        l.store_acl(AclEntry::new(subject(), &secret(), DisclosureMask::default(), exp)).await.unwrap();
        let newer = VerifierSecret::new("new@corp.com").unwrap();
        l.store_acl(AclEntry::new(subject(), &newer, DisclosureMask::default(), exp)).await.unwrap();
        let current = l.get_acl(&subject()).await.unwrap();
        assert_eq!(current.authorized_secret_hash, newer.digest());
        assert!(current.valid);
        assert_eq!(l.height(), 2);
    }

    #[tokio::test]
    async fn merkle_proofs_checked_against_anchored_root() {
        let l = ledger();
        let leaves: Vec<_> = ["a", "b", "c"].iter().map(|s| ets_core::sha256_str(s)).collect();
        let tree = MerkleTree::build(leaves.clone()).unwrap();
        let proof = tree.proof(1).unwrap();
        assert!(!l.verify_merkle_proof(&proof, &leaves[1]).await.unwrap());

        l.store_merkle_root(tree.root()).await.unwrap();
        assert!(l.verify_merkle_proof(&proof, &leaves[1]).await.unwrap());
        assert!(!l.verify_merkle_proof(&proof, &leaves[0]).await.unwrap());
    }

    #[tokio::test]
    async fn offline_ledger_changes_nothing() {
        let l = ledger();
        l.set_available(false);
        assert!(matches!(
            l.store_merkle_root(ets_core::sha256_str("a")).await,
            Err(LedgerError::Unavailable(_))
        ));
        l.set_available(true);
        assert_eq!(l.merkle_root().await.unwrap(), None);
        assert_eq!(l.height(), 0);
    }

    #[tokio::test]
    async fn transient_failures_are_counted_down() {
        let l = ledger();
        l.fail_next(2);
        assert!(l.merkle_root().await.is_err());
        assert!(l.merkle_root().await.is_err());
        assert!(l.merkle_root().await.is_ok());
    }

    #[tokio::test]
    async fn transcript_verification_honours_expiry() {
        let clock = Clock::fixed(Timestamp::from_epoch_secs(1_000));
        let l = ledger().with_clock(clock.clone());
        let entry = AclEntry::new(subject(), &secret(), DisclosureMask::new(["sex"]), Timestamp::from_epoch_secs(1_500));
        let reg = TranscriptRegistration::for_entry(&entry, subject().vc_hash());
        let (acl_hash, vc_hash) = (reg.acl_hash, reg.vc_hash);
        l.register_transcript(reg).await.unwrap();

        assert!(l.verify_transcript(&subject(), &acl_hash, &vc_hash).await.unwrap());
        assert!(!l.verify_transcript(&subject(), &vc_hash, &vc_hash).await.unwrap());
        clock.advance(501);
        assert!(!l.verify_transcript(&subject(), &acl_hash, &vc_hash).await.unwrap());
    }

    #[tokio::test]
    async fn subject_index_registry() {
        let l = ledger();
        l.store_subject_index(&subject(), 4).await.unwrap();
        assert_eq!(l.get_subject_index(&subject()).await.unwrap(), 4);
        let unknown = SubjectId::new("did:university:student99").unwrap();
        assert!(matches!(l.get_subject_index(&unknown).await, Err(LedgerError::NotFound(_))));
    }
}
