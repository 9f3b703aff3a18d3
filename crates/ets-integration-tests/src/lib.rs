//! Shared fixtures for the cross-crate scenario tests.

use std::sync::Arc;

use ets_access::{AclEntry, CredentialRecord, DisclosureMask};
use ets_core::{Clock, SubjectId, Timestamp, VerifierSecret};
use ets_ledger::InMemoryLedger;
use ets_verify::{BatchPolicy, VerificationMode, VerificationService, VerifierConfig};

/// 2^255 - 19. Distinct secrets never share a witness here; under
/// [`REFERENCE_PRIME`] they often do, so wrong-secret scenarios use this one.
pub const LARGE_PRIME: &str = "57896044618658097711785492504343953926634992332820282019728792003956564819949";

/// The default deployment modulus. `2` has order 11 mod 23, so commitments
/// repeat across rounds.
pub const REFERENCE_PRIME: &str = "23";

/// Fixed start time for scenarios.
pub const EPOCH: i64 = 1_700_000_000;

pub const AUTHORIZED: &str = "hr1@gmail.com";

pub fn subject(i: usize) -> SubjectId {
    SubjectId::new(format!("did:university:student{i}")).expect("fixture DID is valid")
}

pub fn secret(s: &str) -> VerifierSecret {
    VerifierSecret::new(s).expect("fixture secret is non-empty")
}

/// Entry authorizing [`AUTHORIZED`] to see everything but `gpa`, expiring
/// at `EPOCH + 1000`.
pub fn entry(i: usize) -> AclEntry {
    AclEntry::new(
        subject(i),
        &secret(AUTHORIZED),
        DisclosureMask::new(["gpa"]),
        Timestamp::from_epoch_secs(EPOCH + 1000),
    )
}

pub fn record(name: &str) -> CredentialRecord {
    let mut r = CredentialRecord::new();
    r.insert("name", name);
    r.insert("degree", "BSc Computer Science");
    r.insert("gpa", "3.9");
    r
}

/// A service, its ledger, and the shared fixed clock.
pub struct Deployment {
    pub service: VerificationService,
    pub ledger: Arc<InMemoryLedger>,
    pub clock: Clock,
}

pub fn deploy(modulus: &str, mode: VerificationMode, batch_policy: BatchPolicy) -> Deployment {
    let config = VerifierConfig {
        modulus: modulus.into(),
        mode,
        batch_policy,
        ..VerifierConfig::default()
    };
    let clock = Clock::fixed(Timestamp::from_epoch_secs(EPOCH));
    let group = config.group().expect("fixture group is valid");
    let ledger = Arc::new(InMemoryLedger::new(group).with_clock(clock.clone()));
    let service = VerificationService::new(config, ledger.clone())
        .expect("fixture config is valid")
        .with_clock(clock.clone());
    Deployment { service, ledger, clock }
}

/// Zero-knowledge, best-effort, over the large group.
pub fn deploy_default() -> Deployment {
    deploy(LARGE_PRIME, VerificationMode::ZeroKnowledge, BatchPolicy::BestEffort)
}
