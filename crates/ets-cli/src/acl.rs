//! # ACL Subcommand
//!
//! Fixture ACL documents in the `{"students": [...]}` format the other
//! commands read.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use ets_access::{generate_acl_entries, AclDocument, DisclosureMask};
use ets_core::{Timestamp, VerifierSecret};

use crate::files::write_json;
use crate::EXIT_OK;

#[derive(Args, Debug)]
pub struct AclArgs {
    #[command(subcommand)]
    pub command: AclCommand,
}

#[derive(Subcommand, Debug)]
pub enum AclCommand {
    /// Generate entries for did:university:student1..=N.
    Generate {
        #[arg(long)]
        count: usize,

        /// Verifier secret every entry authorizes.
        #[arg(long)]
        secret: String,

        /// Expiration of the first entry, Unix seconds. Defaults to now plus
        /// one day; entry i expires i*1000 seconds later.
        #[arg(long)]
        base_time: Option<i64>,

        /// Field hidden from the verifier. Repeatable.
        #[arg(long = "mask", default_values_t = ["gpa".to_string()])]
        mask: Vec<String>,

        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn run_acl(args: &AclArgs) -> Result<u8> {
    match &args.command {
        AclCommand::Generate {
            count,
            secret,
            base_time,
            mask,
            out,
        } => {
            let secret = VerifierSecret::new(secret)?;
            let base = base_time
                .map(Timestamp::from_epoch_secs)
                .unwrap_or_else(|| Timestamp::now().plus_secs(86_400));
            let document = AclDocument {
                students: generate_acl_entries(*count, &secret, base, &DisclosureMask::new(mask)),
            };
            write_json(&document, out.as_deref())?;
            tracing::info!(count, "ACL entries generated");
            Ok(EXIT_OK)
        }
    }
}
