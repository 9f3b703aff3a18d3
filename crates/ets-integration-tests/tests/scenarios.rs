//! # End-to-End Verification Scenarios
//!
//! 1. Reference vector: G=2, P=23, secret "abc", r=5, c=3
//! 2. Completeness and soundness against perturbed proofs
//! 3. Batch of five with item 3 corrupted, at the proof and service layers
//! 4. Merkle roots, proofs for every index, and invalidation on change
//! 5. Entitlement expiry boundary
//! 6. Disclosure idempotence and redaction
//! 7. Hash-reveal and zero-knowledge as distinct strategies
//! 8. Ledger outage versus security reject
//! 9. Full flow: issue, anchor, verify, disclose
//! 10. Honest rounds in the reference group, where commitments repeat

use ets_access::{mask, AccessControlList, DisclosureMask, EntitlementError, REDACTION_SENTINEL};
use ets_core::{sha256_str, Digest256, Timestamp};
use ets_crypto::{hash_pair, verify_inclusion, GroupParams, MerkleTree};
use ets_integration_tests::*;
use ets_ledger::Ledger;
use ets_verify::{BatchPolicy, BatchStatus, FailureKind, ProofRequest, VerificationError, VerificationMode};
use ets_zkp::{
    BatchItem, BatchVerifier, Challenge, ClaimedValue, Nonce, ProofSystem, Response, SchnorrProof, SchnorrProver,
    SchnorrVerifier, Witness,
};
use num_bigint::BigUint;
use proptest::prelude::*;
use rand::rngs::OsRng;

fn large_group() -> GroupParams {
    GroupParams::from_decimal("2", LARGE_PRIME).unwrap()
}

/// Honest proof for `secret` with challenge `c`.
fn honest_proof(group: &GroupParams, secret_text: &str, c: u64) -> (SchnorrProof, ClaimedValue, Challenge) {
    let prover = SchnorrProver::new(group.clone());
    let s = secret(secret_text);
    let witness = Witness::from_secret(&s, group);
    let nonce = prover.commit(&mut OsRng).unwrap();
    let challenge = Challenge::from(c);
    let proof = prover.respond(nonce, &challenge, &witness).unwrap();
    let claimed = ClaimedValue::from_secret_hash(&s.digest(), group).unwrap();
    (proof, claimed, challenge)
}

fn bump(v: &BigUint) -> BigUint {
    v + 1u8
}

// ---------------------------------------------------------------------------
// 1. Reference vector
// ---------------------------------------------------------------------------

#[test]
fn reference_vector_accepts() {
    let group = GroupParams::default();
    let s = secret("abc");
    let witness = Witness::from_secret(&s, &group);
    assert_eq!(witness.value(), &BigUint::from(19u8));

    let nonce = Nonce::from_value(BigUint::from(5u8), &group).unwrap();
    assert_eq!(nonce.commitment().value(), &BigUint::from(9u8));

    let proof = SchnorrProver::new(group.clone())
        .respond(nonce, &Challenge::from(3), &witness)
        .unwrap();
    assert_eq!(proof.response().value(), &BigUint::from(18u8));

    let claimed = ClaimedValue::from_secret_hash(&s.digest(), &group).unwrap();
    assert_eq!(SchnorrVerifier::new(group).verify(&claimed, &proof, &Challenge::from(3)), Ok(()));
}

#[test]
fn reference_vector_wire_form() {
    let proof = SchnorrProof::new(GroupParams::default(), 9.into(), 3.into(), 18.into()).unwrap();
    let json = serde_json::to_value(&proof).unwrap();
    assert_eq!(json, serde_json::json!({"R": "9", "s": "18", "c": "3", "G": "2", "P": "23"}));
    let back: SchnorrProof = serde_json::from_value(json).unwrap();
    assert_eq!(back, proof);
}

// ---------------------------------------------------------------------------
// 2. Completeness and soundness
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn honest_proofs_verify_and_perturbed_ones_do_not(text in "[a-z0-9@.]{1,24}", c in 1u64..1_000_000) {
        let group = large_group();
        let verifier = SchnorrVerifier::new(group.clone());
        let (proof, claimed, challenge) = honest_proof(&group, &text, c);
        prop_assert!(verifier.is_valid(&claimed, &proof, &challenge));

        if let Ok(bad_s) = SchnorrProof::new(
            group.clone(),
            proof.commitment().clone(),
            challenge.clone(),
            Response::new(bump(proof.response().value())),
        ) {
            prop_assert!(!verifier.is_valid(&claimed, &bad_s, &challenge));
        }
        if let Ok(bad_r) = SchnorrProof::new(
            group.clone(),
            ets_zkp::Commitment::new(bump(proof.commitment().value())),
            challenge.clone(),
            proof.response().clone(),
        ) {
            prop_assert!(!verifier.is_valid(&claimed, &bad_r, &challenge));
        }
    }
}

#[test]
fn wrong_secret_does_not_verify() {
    let group = large_group();
    let (proof, _, challenge) = honest_proof(&group, "hr2@gmail.com", 77);
    let authorized = ClaimedValue::from_secret_hash(&sha256_str(AUTHORIZED), &group).unwrap();
    assert!(!SchnorrVerifier::new(group).is_valid(&authorized, &proof, &challenge));
}

// ---------------------------------------------------------------------------
// 3. Batch of five, item 3 corrupted
// ---------------------------------------------------------------------------

#[test]
fn proof_batch_isolates_the_corrupted_item() {
    let group = large_group();
    let verifier = SchnorrVerifier::new(group.clone());
    let items: Vec<BatchItem<SchnorrVerifier>> = (0..5u64)
        .map(|i| {
            let (proof, statement, issued) = honest_proof(&group, &format!("hr{i}@gmail.com"), 10 + i);
            let proof = if i == 3 {
                SchnorrProof::new(
                    group.clone(),
                    proof.commitment().clone(),
                    issued.clone(),
                    Response::new(bump(proof.response().value())),
                )
                .unwrap()
            } else {
                proof
            };
            BatchItem { statement, proof, issued }
        })
        .collect();

    let result = BatchVerifier::new(verifier).verify_all(&items);
    assert_eq!(result.outcomes.len(), 5);
    assert_eq!(result.failures(), vec![3]);
    assert_eq!(result.accepted, 4);
    assert!(!result.all_accepted());
}

#[tokio::test]
async fn service_batch_reports_partial_failure() {
    let d = deploy_default();
    d.service.register_acl_entries((0..5).map(entry)).await.unwrap();

    let requests: Vec<ProofRequest> = (0..5)
        .map(|i| {
            let s = if i == 3 { "forged@gmail.com" } else { AUTHORIZED };
            ProofRequest::new(subject(i), secret(s))
        })
        .collect();
    let report = d.service.verify_batch(requests).await;

    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.status, BatchStatus::PartialFailure);
    for (i, outcome) in report.outcomes.iter().enumerate() {
        assert_eq!(outcome.subject_id, subject(i));
        assert_eq!(outcome.is_verified(), i != 3, "item {i}");
    }
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].1.kind(), FailureKind::SecurityReject);
    assert_eq!(report.metrics.items, 5);
    assert!(!d.ledger.is_verified(&subject(3)).await.unwrap());
    assert!(d.ledger.is_verified(&subject(4)).await.unwrap());
}

#[tokio::test]
async fn all_or_nothing_batch_records_nothing_on_failure() {
    let d = deploy(LARGE_PRIME, VerificationMode::ZeroKnowledge, BatchPolicy::AllOrNothing);
    d.service.register_acl_entries((0..5).map(entry)).await.unwrap();

    let requests: Vec<ProofRequest> = (0..5)
        .map(|i| {
            let s = if i == 3 { "forged@gmail.com" } else { AUTHORIZED };
            ProofRequest::new(subject(i), secret(s))
        })
        .collect();
    let report = d.service.verify_batch(requests).await;

    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.outcomes[3].error(), Some(&VerificationError::Rejected(subject(3))));
    assert_eq!(report.outcomes[0].error(), Some(&VerificationError::NotCommitted(subject(0))));
    // Held-back honest items are not counted as security rejects.
    assert_eq!(report.outcomes[0].error().unwrap().kind(), FailureKind::Caller);
    assert_eq!(report.outcomes[3].error().unwrap().kind(), FailureKind::SecurityReject);
    for i in 0..5 {
        assert!(!d.ledger.is_verified(&subject(i)).await.unwrap());
    }
}

// ---------------------------------------------------------------------------
// 4. Merkle engine
// ---------------------------------------------------------------------------

#[test]
fn three_leaf_root_pads_with_last_leaf() {
    let [a, b, c] = ["a", "b", "c"].map(sha256_str);
    let tree = MerkleTree::build(vec![a, b, c]).unwrap();
    assert_eq!(tree.root(), hash_pair(&hash_pair(&a, &b), &hash_pair(&c, &c)));
}

#[test]
fn every_index_proves_for_every_size() {
    for n in 1..=17usize {
        let leaves: Vec<Digest256> = (0..n).map(|i| sha256_str(&format!("vc-{i}"))).collect();
        let tree = MerkleTree::build(leaves.clone()).unwrap();
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert!(verify_inclusion(leaf, &proof, &tree.root(), i), "n={n} i={i}");
        }
    }
}

#[test]
fn changing_a_leaf_invalidates_old_proofs() {
    let leaves: Vec<Digest256> = (0..6).map(|i| sha256_str(&format!("vc-{i}"))).collect();
    let old = MerkleTree::build(leaves.clone()).unwrap();
    let mut changed = leaves.clone();
    changed[4] = sha256_str("tampered");
    let new = MerkleTree::build(changed).unwrap();

    for i in 0..leaves.len() {
        let old_proof = old.proof(i).unwrap();
        let new_proof = new.proof(i).unwrap();
        // Proofs whose path touches leaf 4 break; all break for leaf 4 itself.
        if i == 4 || i == 5 {
            assert!(!verify_inclusion(&leaves[i], &old_proof, &new.root(), i));
            assert!(!verify_inclusion(&leaves[i], &new_proof, &old.root(), i));
        }
        assert!(verify_inclusion(&leaves[i], &old_proof, &old.root(), i));
    }
    assert_ne!(old.root(), new.root());
}

#[tokio::test]
async fn anchored_root_checks_through_the_ledger() {
    let d = deploy_default();
    let leaves: Vec<Digest256> = ["a", "b", "c"].into_iter().map(sha256_str).collect();
    let root = d.service.build_and_anchor_tree(leaves.clone()).await.unwrap();
    assert_eq!(d.ledger.merkle_root().await.unwrap(), Some(root));

    let tree = MerkleTree::build(leaves.clone()).unwrap();
    let proof = tree.proof(1).unwrap();
    assert!(d.ledger.verify_merkle_proof(&proof, &leaves[1]).await.unwrap());
    assert!(!d.ledger.verify_merkle_proof(&proof, &leaves[0]).await.unwrap());

    assert_eq!(d.service.build_and_anchor_tree(Vec::new()).await, Err(VerificationError::TreeEmpty));
}

// ---------------------------------------------------------------------------
// 5. Expiry boundary
// ---------------------------------------------------------------------------

#[test]
fn entitlement_valid_at_expiration_and_expired_one_second_later() {
    let acl = AccessControlList::from_entries([entry(1)]);
    let s = secret(AUTHORIZED);
    let at = Timestamp::from_epoch_secs(EPOCH + 1000);

    let granted = acl.check_entitlement(&subject(1), &s, at).unwrap();
    assert!(granted.disclosure_mask.contains("gpa"));
    assert!(matches!(
        acl.check_entitlement(&subject(1), &s, at.plus_secs(1)),
        Err(EntitlementError::Expired { .. })
    ));
    assert_eq!(
        acl.check_entitlement(&subject(1), &secret("hr2@gmail.com"), at),
        Err(EntitlementError::SecretMismatch(subject(1)))
    );
    assert_eq!(
        acl.check_entitlement(&subject(2), &s, at),
        Err(EntitlementError::NotFound(subject(2)))
    );
}

#[tokio::test]
async fn service_honours_the_same_boundary() {
    let d = deploy_default();
    d.service.register_acl(entry(1)).await.unwrap();

    d.clock.set(Timestamp::from_epoch_secs(EPOCH + 1000));
    assert!(d.service.verify_single(ProofRequest::new(subject(1), secret(AUTHORIZED))).await.is_verified());

    d.clock.advance(1);
    let outcome = d.service.verify_single(ProofRequest::new(subject(1), secret(AUTHORIZED))).await;
    assert_eq!(outcome.error(), Some(&VerificationError::EntitlementExpired(subject(1))));
}

// ---------------------------------------------------------------------------
// 6. Disclosure
// ---------------------------------------------------------------------------

#[test]
fn masking_is_idempotent_and_shape_preserving() {
    let r = record("Alice");
    let m = DisclosureMask::new(["gpa", "not-a-field"]);
    let once = mask(&r, &m);
    assert_eq!(mask(&once, &m), once);
    assert_eq!(once.len(), r.len());
    assert_eq!(once.get("gpa").unwrap(), REDACTION_SENTINEL);
    assert_eq!(once.get("name"), r.get("name"));
    assert!(once.get("not-a-field").is_none());
}

// ---------------------------------------------------------------------------
// 7. Two verification strategies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn strategies_agree_on_outcome_but_not_on_error() {
    for mode in [VerificationMode::ZeroKnowledge, VerificationMode::HashReveal] {
        let d = deploy(LARGE_PRIME, mode, BatchPolicy::BestEffort);
        d.service.register_acl(entry(1)).await.unwrap();
        let height = d.ledger.height();

        let ok = d.service.verify_single(ProofRequest::new(subject(1), secret(AUTHORIZED))).await;
        assert_eq!(ok.claim().unwrap().mode(), mode);

        let bad = d.service.verify_single(ProofRequest::new(subject(1), secret("hr2@gmail.com"))).await;
        let expected = match mode {
            VerificationMode::ZeroKnowledge => VerificationError::Rejected(subject(1)),
            VerificationMode::HashReveal => VerificationError::SecretMismatch(subject(1)),
        };
        assert_eq!(bad.error(), Some(&expected));

        // Only the zero-knowledge rounds reach the ledger.
        let submitted = d.ledger.height() > height;
        assert_eq!(submitted, mode == VerificationMode::ZeroKnowledge);
    }
}

// ---------------------------------------------------------------------------
// 8. Outage versus reject
// ---------------------------------------------------------------------------

#[tokio::test]
async fn outage_and_reject_are_distinguishable() {
    let d = deploy_default();
    d.service.register_acl(entry(1)).await.unwrap();

    let rejected = d.service.verify_single(ProofRequest::new(subject(1), secret("hr2@gmail.com"))).await;
    assert_eq!(rejected.error().unwrap().kind(), FailureKind::SecurityReject);

    d.ledger.set_available(false);
    let outage = d.service.verify_single(ProofRequest::new(subject(1), secret(AUTHORIZED))).await;
    assert!(matches!(outage.error(), Some(VerificationError::LedgerUnavailable(_))));
    assert_eq!(outage.error().unwrap().kind(), FailureKind::Availability);

    d.ledger.set_available(true);
    assert!(d.service.verify_single(ProofRequest::new(subject(1), secret(AUTHORIZED))).await.is_verified());
}

// ---------------------------------------------------------------------------
// 9. Full flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn issue_anchor_verify_disclose() {
    let d = deploy_default();
    let subjects: Vec<_> = (1..=3).map(subject).collect();
    d.service.register_acl_entries((1..=3).map(entry)).await.unwrap();
    for (i, s) in subjects.iter().enumerate() {
        d.service.register_credential(s.clone(), record(&format!("Student {i}")));
    }
    d.service.anchor_credentials(&subjects).await.unwrap();
    for s in &subjects {
        d.service.register_transcript(s).await.unwrap();
    }

    let requests = vec![
        ProofRequest::new(subject(1), secret(AUTHORIZED)).with_presented_vc_hash(subject(1).vc_hash()),
        ProofRequest::new(subject(2), secret(AUTHORIZED)).with_presented_vc_hash(sha256_str("forged vc")),
        ProofRequest::new(subject(3), secret(AUTHORIZED)),
    ];
    let report = d.service.verify_batch(requests).await;
    assert_eq!(report.status, BatchStatus::PartialFailure);
    assert_eq!(report.outcomes[1].error(), Some(&VerificationError::IntegrityMismatch(subject(2))));

    let claim = report.outcomes[0].claim().unwrap();
    let view = d.service.disclose(&subject(1), claim).await.unwrap();
    assert_eq!(view.get("name").unwrap(), "Student 0");
    assert_eq!(view.get("gpa").unwrap(), REDACTION_SENTINEL);

    // A claim is bound to its subject.
    assert_eq!(
        d.service.disclose(&subject(3), claim).await,
        Err(VerificationError::EntitlementNotFound(subject(3)))
    );
}

// ---------------------------------------------------------------------------
// 10. Reference group
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reference_group_repeated_rounds_all_verify() {
    let d = deploy(REFERENCE_PRIME, VerificationMode::ZeroKnowledge, BatchPolicy::BestEffort);
    d.service.register_acl(entry(1)).await.unwrap();

    // Eleven possible commitments, so many of these rounds share one.
    for round in 0..40 {
        let outcome = d.service.verify_single(ProofRequest::new(subject(1), secret(AUTHORIZED))).await;
        assert!(outcome.is_verified(), "round {round}: {:?}", outcome.error());
        assert_eq!(outcome.metrics.cost, 26_000);
    }
}

#[tokio::test]
async fn reference_group_shared_secret_batches_all_verify() {
    for policy in [BatchPolicy::BestEffort, BatchPolicy::AllOrNothing] {
        let d = deploy(REFERENCE_PRIME, VerificationMode::ZeroKnowledge, policy);
        d.service.register_acl_entries((0..5).map(entry)).await.unwrap();

        for batch in 0..10 {
            let requests: Vec<ProofRequest> = (0..5).map(|i| ProofRequest::new(subject(i), secret(AUTHORIZED))).collect();
            let report = d.service.verify_batch(requests).await;
            assert_eq!(report.status, BatchStatus::Complete, "{policy} batch {batch}: {:?}", report.failures());
            assert_eq!(report.accepted(), 5);
        }
    }
}
