//! Proof requests and the batch payload file format.

use serde::Deserialize;

use ets_core::{Digest256, EtsError, SubjectId, VerifierSecret};

/// One verifier asking to prove its entitlement for one subject.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RequestWire")]
pub struct ProofRequest {
    pub subject_id: SubjectId,
    pub secret: VerifierSecret,
    /// Credential hash from the verifiable presentation, when one was shown.
    pub presented_vc_hash: Option<Digest256>,
}

impl ProofRequest {
    pub fn new(subject_id: SubjectId, secret: VerifierSecret) -> Self {
        Self {
            subject_id,
            secret,
            presented_vc_hash: None,
        }
    }

    pub fn with_presented_vc_hash(mut self, hash: Digest256) -> Self {
        self.presented_vc_hash = Some(hash);
        self
    }
}

#[derive(Deserialize)]
struct RequestWire {
    #[serde(alias = "student_did")]
    subject_id: SubjectId,
    #[serde(alias = "email")]
    secret: String,
    #[serde(default, alias = "hashed_vc")]
    presented_vc_hash: Option<Digest256>,
}

impl TryFrom<RequestWire> for ProofRequest {
    type Error = EtsError;

    fn try_from(w: RequestWire) -> Result<Self, Self::Error> {
        Ok(Self {
            subject_id: w.subject_id,
            secret: VerifierSecret::new(&w.secret)?,
            presented_vc_hash: w.presented_vc_hash,
        })
    }
}

/// `{"students": [...]}`, the batch verification payload.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPayload {
    pub students: Vec<ProofRequest>,
}
