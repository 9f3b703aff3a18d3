//! # Disclose Subcommand
//!
//! Verifies one verifier for one subject, registers the subject's
//! transcript, and prints the credential record with the policy's fields
//! redacted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use ets_access::{AclDocument, CredentialRecord};
use ets_core::{SubjectId, VerifierSecret};
use ets_ledger::{InMemoryLedger, Ledger};
use ets_verify::{FailureKind, ProofRequest, VerificationError, VerificationService, VerifierConfig};

use crate::files::{read_json, runtime, write_json};
use crate::{EXIT_OK, EXIT_REJECTED};

#[derive(Args, Debug)]
pub struct DiscloseArgs {
    /// ACL document.
    #[arg(long)]
    pub acl: PathBuf,

    /// The subject's credential record, a flat JSON object.
    #[arg(long)]
    pub record: PathBuf,

    /// Subject DID.
    #[arg(long)]
    pub subject: String,

    /// Verifier secret.
    #[arg(long)]
    pub secret: String,
}

pub fn run_disclose(args: &DiscloseArgs, config: &VerifierConfig) -> Result<u8> {
    match runtime()?.block_on(disclose(args, config.clone()))? {
        Ok(view) => {
            write_json(&view, None)?;
            Ok(EXIT_OK)
        }
        Err(e) if e.kind() == FailureKind::SecurityReject => {
            eprintln!("disclosure refused: {e}");
            Ok(EXIT_REJECTED)
        }
        Err(e) => Err(e.into()),
    }
}

/// The outer error is an input problem; the inner one is the verification
/// result.
pub async fn disclose(
    args: &DiscloseArgs,
    config: VerifierConfig,
) -> Result<Result<CredentialRecord, VerificationError>> {
    let acl: AclDocument = read_json(&args.acl)?;
    let record: CredentialRecord = read_json(&args.record)?;
    let subject = SubjectId::new(args.subject.as_str())?;
    let secret = VerifierSecret::new(&args.secret)?;

    let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new(config.group()?));
    let service = VerificationService::with_transport_retry(config, ledger)?;
    service.register_acl_entries(acl.students).await?;
    service.register_credential(subject.clone(), record);

    let result = async {
        service.register_transcript(&subject).await?;
        let claim = service
            .verify_single(ProofRequest::new(subject.clone(), secret))
            .await
            .result?;
        service.disclose(&subject, &claim).await
    }
    .await;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ets_access::{generate_acl_entries, DisclosureMask, REDACTION_SENTINEL};
    use ets_core::Timestamp;
    use serde_json::json;

    fn fixture(dir: &tempfile::TempDir, subject: &str, secret: &str) -> DiscloseArgs {
        let acl = AclDocument {
            students: generate_acl_entries(
                2,
                &VerifierSecret::new("hr1@gmail.com").unwrap(),
                Timestamp::now().plus_secs(3600),
                &DisclosureMask::new(["gpa"]),
            ),
        };
        let acl_path = dir.path().join("acl.json");
        let record_path = dir.path().join("record.json");
        write_json(&acl, Some(&acl_path)).unwrap();
        write_json(&json!({"name": "Alice", "gpa": "3.9"}), Some(&record_path)).unwrap();
        DiscloseArgs {
            acl: acl_path,
            record: record_path,
            subject: subject.into(),
            secret: secret.into(),
        }
    }

    #[tokio::test]
    async fn authorized_verifier_sees_masked_record() {
        let dir = tempfile::tempdir().unwrap();
        let args = fixture(&dir, "did:university:student1", "hr1@gmail.com");
        let view = disclose(&args, VerifierConfig::default()).await.unwrap().unwrap();
        assert_eq!(view.get("name").unwrap(), "Alice");
        assert_eq!(view.get("gpa").unwrap(), REDACTION_SENTINEL);
    }

    #[tokio::test]
    async fn unknown_subject_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let args = fixture(&dir, "did:university:student7", "hr1@gmail.com");
        let err = disclose(&args, VerifierConfig::default()).await.unwrap().unwrap_err();
        assert_eq!(err.kind(), FailureKind::SecurityReject);
    }
}
