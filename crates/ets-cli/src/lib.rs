//! # ets-cli: E-Transcript Stack Command-Line Interface
//!
//! Drives the verification core from JSON and YAML files. Every command
//! runs against a fresh in-process ledger seeded from its inputs.
//!
//! ## Subcommands
//!
//! - `acl generate`: fixture ACL documents
//! - `prove`: build and check one Schnorr proof tuple
//! - `verify-batch`: verify a payload of proof requests, print a JSON report
//! - `merkle root|proof|verify`: credential tree operations
//! - `disclose`: verify one verifier and print the masked record
//!
//! ## Exit codes
//!
//! `0` success, `1` error (bad input, ledger unavailable), `2` a proof or
//! entitlement was rejected.

pub mod acl;
pub mod disclose;
pub mod files;
pub mod merkle;
pub mod prove;
pub mod verify_batch;

/// Everything checked out.
pub const EXIT_OK: u8 = 0;
/// A proof, secret, credential, or entitlement was refused.
pub const EXIT_REJECTED: u8 = 2;
