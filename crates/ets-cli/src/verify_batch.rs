//! # Verify-Batch Subcommand
//!
//! Seeds an in-process ledger with an ACL document (and optionally a
//! credential store, whose records are anchored under a Merkle root), then
//! verifies a `{"students": [...]}` payload and prints a JSON report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use ets_access::{AclDocument, CredentialStore};
use ets_core::{Digest256, SubjectId};
use ets_ledger::{InMemoryLedger, Ledger};
use ets_verify::{
    BatchMetrics, BatchPayload, BatchPolicy, BatchReport, BatchStatus, FailureKind, VerificationService, VerifierConfig,
};

use crate::files::{read_json, runtime, write_json};
use crate::{EXIT_OK, EXIT_REJECTED};

#[derive(Args, Debug)]
pub struct VerifyBatchArgs {
    /// ACL document.
    #[arg(long)]
    pub acl: PathBuf,

    /// Batch payload.
    #[arg(long)]
    pub payload: PathBuf,

    /// Credential store, subject DID to record. Anchored in ACL order.
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Report file; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ItemReport {
    pub subject_id: SubjectId,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    pub cost: u64,
    pub elapsed_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub status: BatchStatus,
    pub policy: BatchPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<Digest256>,
    pub items: Vec<ItemReport>,
    pub metrics: BatchMetrics,
}

impl ReportOutput {
    fn new(report: BatchReport, merkle_root: Option<Digest256>) -> Self {
        let items = report
            .outcomes
            .into_iter()
            .map(|o| ItemReport {
                verified: o.is_verified(),
                error: o.error().map(ToString::to_string),
                kind: o.error().map(|e| e.kind()),
                cost: o.metrics.cost,
                elapsed_ms: o.metrics.elapsed.as_millis(),
                subject_id: o.subject_id,
            })
            .collect();
        Self {
            status: report.status,
            policy: report.policy,
            merkle_root,
            items,
            metrics: report.metrics,
        }
    }

    /// Exit code: rejects win over outages, outages over success.
    pub fn exit_code(&self) -> u8 {
        let kinds: Vec<FailureKind> = self.items.iter().filter_map(|i| i.kind).collect();
        if kinds.contains(&FailureKind::SecurityReject) {
            EXIT_REJECTED
        } else if kinds.is_empty() {
            EXIT_OK
        } else {
            1
        }
    }
}

pub fn run_verify_batch(args: &VerifyBatchArgs, config: &VerifierConfig) -> Result<u8> {
    let output = runtime()?.block_on(verify(args, config.clone()))?;
    write_json(&output, args.out.as_deref())?;
    Ok(output.exit_code())
}

pub async fn verify(args: &VerifyBatchArgs, config: VerifierConfig) -> Result<ReportOutput> {
    let acl: AclDocument = read_json(&args.acl)?;
    let payload: BatchPayload = read_json(&args.payload)?;
    let records: Option<CredentialStore> = args.records.as_deref().map(read_json).transpose()?;

    let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new(config.group()?));
    let service = VerificationService::with_transport_retry(config, ledger)?;

    let subjects: Vec<SubjectId> = acl.students.iter().map(|e| e.subject_id.clone()).collect();
    service.register_acl_entries(acl.students).await?;

    let merkle_root = match records {
        Some(store) => {
            for subject in store.subjects() {
                if let Some(stored) = store.get(subject) {
                    service.register_credential_with_hash(subject.clone(), stored.record.clone(), stored.vc_hash);
                }
            }
            Some(service.anchor_credentials(&subjects).await?)
        }
        None => None,
    };

    tracing::info!(items = payload.students.len(), "verifying batch");
    let report = service.verify_batch(payload.students).await;
    Ok(ReportOutput::new(report, merkle_root))
}
