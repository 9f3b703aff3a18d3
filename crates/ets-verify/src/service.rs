//! # Verification Service
//!
//! Drives Schnorr rounds against a [`Ledger`], anchors credential roots, and
//! hands masked records to verified parties.
//!
//! A round is: ACL gate, commit `R`, fetch the ledger's challenge, respond,
//! look up the issued challenge on the verifier side and check the equation,
//! check credential integrity, then submit. Nothing after the submission can
//! be cancelled. Cryptographic failures are final for the attempt; only
//! ledger transport failures surface as [`FailureKind::Availability`].
//!
//! [`FailureKind::Availability`]: crate::error::FailureKind::Availability

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rand::rngs::OsRng;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use ets_access::{
    mask, AclEntry, CredentialRecord, CredentialStore, DisclosureToken, TranscriptRegistration,
};
use ets_core::{Clock, Digest256, SubjectId};
use ets_crypto::{GroupParams, MerkleTree};
use ets_ledger::{CommitResult, Ledger, LedgerError, ProofSubmission, RetryingLedger};
use ets_zkp::{ProofSystem, SchnorrProver, SchnorrVerifier, Witness};

use crate::config::VerifierConfig;
use crate::error::{FailureKind, VerificationError};
use crate::mode::{BatchPolicy, VerificationMode};
use crate::outcome::{BatchMetrics, BatchReport, BatchStatus, ItemMetrics, VerificationOutcome, VerifiedClaim};
use crate::request::ProofRequest;
use crate::session::VerificationSession;

/// A round that passed every local check and awaits submission.
struct Prepared {
    claim: VerifiedClaim,
    /// `None` when nothing goes to the ledger (hash-reveal, or already
    /// proven in this session).
    submission: Option<ProofSubmission>,
    presented: Digest256,
}

/// The verification core. Cheap to clone; clones share the ledger, the
/// credential store, and the anchored tree.
#[derive(Clone)]
pub struct VerificationService {
    config: Arc<VerifierConfig>,
    group: GroupParams,
    ledger: Arc<dyn Ledger>,
    store: Arc<RwLock<CredentialStore>>,
    tree: Arc<RwLock<Option<MerkleTree>>>,
    clock: Clock,
}

impl VerificationService {
    /// Validates `config` and uses `ledger` as given.
    pub fn new(config: VerifierConfig, ledger: Arc<dyn Ledger>) -> Result<Self, VerificationError> {
        config.validate()?;
        let group = config.group()?;
        Ok(Self {
            config: Arc::new(config),
            group,
            ledger,
            store: Arc::new(RwLock::new(CredentialStore::new())),
            tree: Arc::new(RwLock::new(None)),
            clock: Clock::system(),
        })
    }

    /// Like [`new`](Self::new), with the ledger wrapped in the configured
    /// transport retry.
    pub fn with_transport_retry(config: VerifierConfig, ledger: Arc<dyn Ledger>) -> Result<Self, VerificationError> {
        let retrying: Arc<dyn Ledger> = Arc::new(RetryingLedger::new(ledger, config.retry));
        Self::new(config, retrying)
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn group(&self) -> &GroupParams {
        &self.group
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    // ── Registration ─────────────────────────────────────────────────

    pub async fn register_acl(&self, entry: AclEntry) -> Result<CommitResult, VerificationError> {
        Ok(self.ledger.store_acl(entry).await?)
    }

    pub async fn register_acl_entries(
        &self,
        entries: impl IntoIterator<Item = AclEntry>,
    ) -> Result<Vec<CommitResult>, VerificationError> {
        let mut commits = Vec::new();
        for entry in entries {
            commits.push(self.ledger.store_acl(entry).await?);
        }
        Ok(commits)
    }

    /// Put a credential in the off-ledger store under its subject's VC hash.
    pub fn register_credential(&self, subject: SubjectId, record: CredentialRecord) {
        self.store.write().insert(subject, record);
    }

    /// Put a credential in the store under an explicit VC hash.
    pub fn register_credential_with_hash(&self, subject: SubjectId, record: CredentialRecord, vc_hash: Digest256) {
        self.store.write().insert_with_hash(subject, record, vc_hash);
    }

    pub fn credential_vc_hash(&self, subject: &SubjectId) -> Option<Digest256> {
        self.store.read().vc_hash(subject)
    }

    /// Register the subject's current disclosure policy and credential hash
    /// on the ledger.
    pub async fn register_transcript(&self, subject: &SubjectId) -> Result<CommitResult, VerificationError> {
        let entry = self.fetch_acl(subject).await?;
        let vc_hash = self.leaf_for(subject);
        let registration = TranscriptRegistration::for_entry(&entry, vc_hash);
        Ok(self.ledger.register_transcript(registration).await?)
    }

    // ── Merkle anchoring ────────────────────────────────────────────

    /// Build a tree over `leaves` in order and anchor its root.
    pub async fn build_and_anchor_tree(&self, leaves: Vec<Digest256>) -> Result<Digest256, VerificationError> {
        let tree = MerkleTree::build(leaves)?;
        self.anchor(tree).await
    }

    /// Anchor the credentials of `subjects`, leaf `i` being the VC hash of
    /// `subjects[i]`. Records each subject's index on the ledger first.
    pub async fn anchor_credentials(&self, subjects: &[SubjectId]) -> Result<Digest256, VerificationError> {
        let leaves: Vec<Digest256> = subjects.iter().map(|s| self.leaf_for(s)).collect();
        let tree = MerkleTree::build(leaves)?;
        for (index, subject) in subjects.iter().enumerate() {
            self.ledger.store_subject_index(subject, index).await?;
        }
        self.anchor(tree).await
    }

    /// Root of the tree anchored by this service, if any.
    pub fn anchored_root(&self) -> Option<Digest256> {
        self.tree.read().as_ref().map(MerkleTree::root)
    }

    async fn anchor(&self, tree: MerkleTree) -> Result<Digest256, VerificationError> {
        let root = tree.root();
        let leaves = tree.leaf_count();
        let commit = self.ledger.store_merkle_root(root).await?;
        *self.tree.write() = Some(tree);
        metrics::counter!("ets_merkle_roots_anchored_total").increment(1);
        tracing::info!(%root, leaves, block = commit.block, "credential root anchored");
        Ok(root)
    }

    fn leaf_for(&self, subject: &SubjectId) -> Digest256 {
        self.store
            .read()
            .vc_hash(subject)
            .unwrap_or_else(|| subject.vc_hash())
    }

    // ── Verification ────────────────────────────────────────────────

    /// One round in a fresh session.
    pub async fn verify_single(&self, request: ProofRequest) -> VerificationOutcome {
        self.verify_with_session(request, &VerificationSession::new()).await
    }

    /// One round sharing `session` state with other rounds.
    pub async fn verify_with_session(&self, request: ProofRequest, session: &VerificationSession) -> VerificationOutcome {
        let outcome = self.round(request, session, &CancellationToken::new()).await;
        observe(&outcome);
        outcome
    }

    /// Verify every request in a fresh session under the configured policy.
    pub async fn verify_batch(&self, requests: Vec<ProofRequest>) -> BatchReport {
        self.verify_batch_with(requests, &VerificationSession::new(), &CancellationToken::new())
            .await
    }

    /// Verify every request concurrently. Outcomes come back in request
    /// order. Cancelling `cancel` fails rounds that have not been submitted
    /// yet with [`VerificationError::Cancelled`].
    pub async fn verify_batch_with(
        &self,
        requests: Vec<ProofRequest>,
        session: &VerificationSession,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let started = Instant::now();
        let total = requests.len();
        metrics::histogram!("ets_batch_size").record(total as f64);

        let policy = self.config.batch_policy;
        let (outcomes, batch_cost) = match policy {
            BatchPolicy::BestEffort => (self.run_best_effort(requests, session, cancel).await, None),
            BatchPolicy::AllOrNothing => {
                let (outcomes, cost) = self.run_all_or_nothing(requests, session, cancel).await;
                (outcomes, Some(cost))
            }
        };
        outcomes.iter().for_each(observe);

        let mut metrics = BatchMetrics::merge(outcomes.iter().map(|o| &o.metrics), started.elapsed());
        if let Some(cost) = batch_cost {
            metrics.total_cost = cost;
        }
        let accepted = outcomes.iter().filter(|o| o.is_verified()).count();
        let status = BatchStatus::from_counts(accepted, total);
        tracing::info!(items = total, accepted, ?status, %policy, "batch verified");

        BatchReport {
            outcomes,
            status,
            metrics,
            policy,
        }
    }

    async fn run_best_effort(
        &self,
        requests: Vec<ProofRequest>,
        session: &VerificationSession,
        cancel: &CancellationToken,
    ) -> Vec<VerificationOutcome> {
        let subjects: Vec<SubjectId> = requests.iter().map(|r| r.subject_id.clone()).collect();
        let slots = fan_out(requests, |request| {
            let service = self.clone();
            let session = session.clone();
            let cancel = cancel.clone();
            async move { service.round(request, &session, &cancel).await }
        })
        .await;

        slots
            .into_iter()
            .zip(subjects)
            .map(|(slot, subject_id)| {
                slot.unwrap_or_else(|| VerificationOutcome {
                    result: Err(task_lost(&subject_id)),
                    subject_id,
                    metrics: ItemMetrics::default(),
                })
            })
            .collect()
    }

    /// Prepare every item, then submit them as one ledger batch. Returns the
    /// outcomes and the batch cost.
    async fn run_all_or_nothing(
        &self,
        requests: Vec<ProofRequest>,
        session: &VerificationSession,
        cancel: &CancellationToken,
    ) -> (Vec<VerificationOutcome>, u64) {
        let subjects: Vec<SubjectId> = requests.iter().map(|r| r.subject_id.clone()).collect();
        let slots = fan_out(requests, |request| {
            let service = self.clone();
            let session = session.clone();
            let cancel = cancel.clone();
            async move {
                let started = Instant::now();
                let prepared = service.prepare(&request, &session, &cancel).await;
                (prepared, started.elapsed())
            }
        })
        .await;

        let mut results: Vec<(Result<Prepared, VerificationError>, Duration)> = slots
            .into_iter()
            .zip(&subjects)
            .map(|(slot, subject)| slot.unwrap_or_else(|| (Err(task_lost(subject)), Duration::ZERO)))
            .collect();

        let all_prepared = results.iter().all(|(r, _)| r.is_ok());
        let mut cost = 0;
        let mut committed = false;
        let mut per_proof: Option<Vec<bool>> = None;
        let mut batch_error: Option<VerificationError> = None;

        if !all_prepared {
            tracing::warn!("batch refused: at least one item failed before submission");
        } else if cancel.is_cancelled() {
            batch_error = Some(VerificationError::Cancelled);
        } else {
            let submissions: Vec<ProofSubmission> = results
                .iter()
                .filter_map(|(r, _)| r.as_ref().ok())
                .filter_map(|p| p.submission.clone())
                .collect();
            if submissions.is_empty() {
                committed = true;
            } else {
                match self.ledger.submit_batch(submissions).await {
                    Ok(receipt) => {
                        cost = receipt.cost;
                        committed = receipt.committed;
                        per_proof = Some(receipt.results);
                    }
                    Err(e) => batch_error = Some(e.into()),
                }
            }
        }

        let mut position = 0;
        for ((result, _), subject) in results.iter_mut().zip(&subjects) {
            let Ok(prepared) = result else { continue };
            let slot = if prepared.submission.is_some() {
                position += 1;
                Some(position - 1)
            } else {
                None
            };
            if committed {
                session.mark_verified(subject, &prepared.presented, prepared.claim.authorized_secret_hash());
                continue;
            }
            let refused_by_ledger = slot
                .and_then(|i| per_proof.as_ref().and_then(|r| r.get(i)))
                .is_some_and(|ok| !*ok);
            *result = Err(match &batch_error {
                Some(e) => e.clone(),
                None if refused_by_ledger => VerificationError::Rejected(subject.clone()),
                None => VerificationError::NotCommitted(subject.clone()),
            });
        }

        let outcomes = results
            .into_iter()
            .zip(subjects)
            .map(|((result, elapsed), subject_id)| VerificationOutcome {
                subject_id,
                result: result.map(|p| p.claim),
                metrics: ItemMetrics { cost: 0, elapsed },
            })
            .collect();
        (outcomes, cost)
    }

    /// A complete round: prepare, then submit on its own.
    #[tracing::instrument(name = "verify_round", skip_all, fields(subject = %request.subject_id, mode = %self.config.mode))]
    async fn round(
        &self,
        request: ProofRequest,
        session: &VerificationSession,
        cancel: &CancellationToken,
    ) -> VerificationOutcome {
        let started = Instant::now();
        let mut cost = 0;
        let result = self.prepare_and_submit(&request, session, cancel, &mut cost).await;
        VerificationOutcome {
            subject_id: request.subject_id,
            result,
            metrics: ItemMetrics {
                cost,
                elapsed: started.elapsed(),
            },
        }
    }

    async fn prepare_and_submit(
        &self,
        request: &ProofRequest,
        session: &VerificationSession,
        cancel: &CancellationToken,
        cost: &mut u64,
    ) -> Result<VerifiedClaim, VerificationError> {
        let prepared = self.prepare(request, session, cancel).await?;
        if let Some(submission) = prepared.submission {
            if cancel.is_cancelled() {
                return Err(VerificationError::Cancelled);
            }
            let receipt = self.ledger.submit_proof(submission).await?;
            *cost = receipt.cost;
            if !receipt.success {
                return Err(VerificationError::Rejected(request.subject_id.clone()));
            }
        }
        session.mark_verified(
            &request.subject_id,
            &prepared.presented,
            prepared.claim.authorized_secret_hash(),
        );
        Ok(prepared.claim)
    }

    /// Every check short of submission.
    async fn prepare(
        &self,
        request: &ProofRequest,
        session: &VerificationSession,
        cancel: &CancellationToken,
    ) -> Result<Prepared, VerificationError> {
        if cancel.is_cancelled() {
            return Err(VerificationError::Cancelled);
        }
        let subject = &request.subject_id;
        let entry = self.fetch_acl(subject).await?;
        let now = self.clock.now();
        let presented = request.secret.digest();

        let submission = match self.config.mode {
            VerificationMode::HashReveal => {
                entry.check(&request.secret, now)?;
                None
            }
            VerificationMode::ZeroKnowledge => {
                entry.check_freshness(now)?;
                if session.is_verified(subject, &presented, &entry.authorized_secret_hash) {
                    tracing::debug!("entitlement already proven in this session");
                    None
                } else {
                    Some(self.prove(request, &entry, session).await?)
                }
            }
        };

        self.check_integrity(&entry, request.presented_vc_hash).await?;

        let claim = VerifiedClaim::new(
            session.id(),
            subject.clone(),
            entry.authorized_secret_hash,
            self.config.mode,
            now,
            entry.disclosure_mask.clone(),
        );
        Ok(Prepared {
            claim,
            submission,
            presented,
        })
    }

    /// Run the challenge-response exchange and check it locally.
    async fn prove(
        &self,
        request: &ProofRequest,
        entry: &AclEntry,
        session: &VerificationSession,
    ) -> Result<ProofSubmission, VerificationError> {
        let prover = SchnorrProver::new(self.group.clone());
        let witness = Witness::from_secret(&request.secret, &self.group);
        let nonce = prover.commit(&mut OsRng)?;
        let challenge = self.ledger.get_challenge(nonce.commitment()).await?;
        let proof = prover.respond(nonce, &challenge, &witness)?;

        // Verifier side: the challenge comes from the ledger, never from the proof.
        let issued = self
            .ledger
            .issued_challenge(proof.commitment())
            .await?
            .ok_or_else(|| {
                VerificationError::ChallengeMismatch(format!("no challenge issued for R={}", proof.commitment()))
            })?;
        let claimed = session.claimed_value(
            &entry.authorized_secret_hash,
            &self.group,
            self.config.precompute_claimed_values,
        )?;
        SchnorrVerifier::new(self.group.clone())
            .verify(&claimed, &proof, &issued)
            .map_err(|e| VerificationError::from_verify(e, &request.subject_id))?;

        Ok(ProofSubmission {
            subject_id: request.subject_id.clone(),
            proof,
            authorized_secret_hash: entry.authorized_secret_hash,
        })
    }

    /// Check the subject's stored credential against the presented hash and
    /// the anchored root. Subjects with nothing on file pass.
    async fn check_integrity(&self, entry: &AclEntry, presented: Option<Digest256>) -> Result<(), VerificationError> {
        if !self.config.check_integrity {
            return Ok(());
        }
        let subject = &entry.subject_id;
        let Some(stored) = self.credential_vc_hash(subject) else {
            return Ok(());
        };

        if let Some(presented) = presented {
            let token = DisclosureToken::from_entry(entry, stored, presented);
            if !token.check_vc_consistency() {
                tracing::warn!(%subject, "presented credential differs from the stored one");
                return Err(VerificationError::IntegrityMismatch(subject.clone()));
            }
        }

        if self.anchored_root().is_none() {
            return Ok(());
        }
        let index = match self.ledger.get_subject_index(subject).await {
            Ok(index) => index,
            Err(LedgerError::NotFound(_)) => return Err(VerificationError::IntegrityMismatch(subject.clone())),
            Err(e) => return Err(e.into()),
        };
        let proof = self.tree.read().as_ref().map(|t| t.proof(index));
        let proof = match proof {
            Some(Ok(proof)) => proof,
            _ => return Err(VerificationError::IntegrityMismatch(subject.clone())),
        };
        if !self.ledger.verify_merkle_proof(&proof, &stored).await? {
            tracing::warn!(%subject, index, "stored credential is not under the anchored root");
            return Err(VerificationError::IntegrityMismatch(subject.clone()));
        }
        Ok(())
    }

    // ── Disclosure ──────────────────────────────────────────────────

    /// The subject's credential with the policy's fields redacted.
    ///
    /// Re-checks the entitlement at call time: an entry retired, expired, or
    /// re-issued to another secret since `claim` was issued is refused.
    pub async fn disclose(
        &self,
        subject: &SubjectId,
        claim: &VerifiedClaim,
    ) -> Result<CredentialRecord, VerificationError> {
        if claim.subject_id() != subject {
            return Err(VerificationError::EntitlementNotFound(subject.clone()));
        }
        let entry = self.fetch_acl(subject).await?;
        entry.check_freshness(self.clock.now())?;
        if &entry.authorized_secret_hash != claim.authorized_secret_hash() {
            return Err(VerificationError::SecretMismatch(subject.clone()));
        }

        let stored = self.store.read().get(subject).cloned();
        let Some(stored) = stored else {
            return Err(VerificationError::EntitlementNotFound(subject.clone()));
        };

        if self.ledger.transcript(subject).await?.is_some() {
            let acl_hash = entry.disclosure_mask.digest();
            if !self.ledger.verify_transcript(subject, &acl_hash, &stored.vc_hash).await? {
                tracing::warn!(%subject, "transcript registration does not match");
                return Err(VerificationError::IntegrityMismatch(subject.clone()));
            }
        }

        tracing::info!(%subject, hidden = entry.disclosure_mask.len(), "credential disclosed");
        Ok(mask(&stored.record, &entry.disclosure_mask))
    }

    async fn fetch_acl(&self, subject: &SubjectId) -> Result<AclEntry, VerificationError> {
        self.ledger.get_acl(subject).await.map_err(|e| match e {
            LedgerError::NotFound(_) => VerificationError::EntitlementNotFound(subject.clone()),
            other => other.into(),
        })
    }
}

impl std::fmt::Debug for VerificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationService")
            .field("group", &self.group)
            .field("mode", &self.config.mode)
            .field("batch_policy", &self.config.batch_policy)
            .finish()
    }
}

/// Spawn one task per request; results come back by request index. A slot
/// is `None` if its task panicked or was aborted.
async fn fan_out<T, F, Fut>(requests: Vec<ProofRequest>, task: F) -> Vec<Option<T>>
where
    F: Fn(ProofRequest) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let total = requests.len();
    let mut set = JoinSet::new();
    for (index, request) in requests.into_iter().enumerate() {
        let fut = task(request);
        set.spawn(async move { (index, fut.await) });
    }

    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, value)) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(value);
                }
            }
            Err(e) => tracing::error!(error = %e, "verification task did not complete"),
        }
    }
    slots
}

fn task_lost(subject: &SubjectId) -> VerificationError {
    VerificationError::Internal(format!("verification task for {subject} did not complete"))
}

fn observe(outcome: &VerificationOutcome) {
    match &outcome.result {
        Ok(_) => {
            metrics::counter!("ets_proofs_verified_total").increment(1);
        }
        Err(e) => {
            match e.kind() {
                FailureKind::SecurityReject => metrics::counter!("ets_proofs_rejected_total").increment(1),
                FailureKind::Availability => metrics::counter!("ets_ledger_unavailable_total").increment(1),
                FailureKind::Caller | FailureKind::Internal => {}
            }
            tracing::warn!(subject = %outcome.subject_id, error = %e, "verification failed");
        }
    }
}
