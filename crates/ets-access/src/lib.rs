//! # ets-access: Entitlement and Disclosure
//!
//! Decides whether a verifier may see a subject's credential, and what it
//! sees.
//!
//! - **ACL** (`acl.rs`): one active entry per subject binding the hash of
//!   the authorized verifier secret, the disclosure mask, and an
//!   expiration. Re-issuing supersedes; nothing is ever deleted.
//! - **Disclosure** (`disclosure.rs`): field masks and the pure masking
//!   function over credential records.
//! - **Transcript** (`transcript.rs`): the registration anchored on the
//!   ledger and the disclosure token handed to a verifier.
//! - **Store** (`store.rs`): the off-ledger credential store keyed by
//!   subject.

pub mod acl;
pub mod disclosure;
pub mod store;
pub mod transcript;

pub use acl::{generate_acl_entries, AccessControlList, AclDocument, AclEntry, Entitlement, EntitlementError};
pub use disclosure::{mask, CredentialRecord, DisclosureMask, REDACTION_SENTINEL};
pub use store::{CredentialStore, StoredCredential};
pub use transcript::{DisclosureToken, TranscriptRegistration};
