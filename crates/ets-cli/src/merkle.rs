//! # Merkle Subcommand
//!
//! Root, inclusion proof, and proof verification over a JSON array of
//! hex leaf digests.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};

use ets_core::Digest256;
use ets_crypto::{verify_inclusion, MerkleProof, MerkleTree};

use crate::files::{read_json, write_json};
use crate::{EXIT_OK, EXIT_REJECTED};

#[derive(Args, Debug)]
pub struct MerkleArgs {
    #[command(subcommand)]
    pub command: MerkleCommand,
}

#[derive(Subcommand, Debug)]
pub enum MerkleCommand {
    /// Print the root over the leaves in file order.
    Root {
        /// JSON array of hex digests.
        leaves: PathBuf,
    },

    /// Print the inclusion proof for one leaf.
    Proof {
        leaves: PathBuf,

        #[arg(long)]
        index: usize,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check a proof file written by `merkle proof` against a root.
    Verify {
        proof: PathBuf,

        /// Root to check against, hex.
        #[arg(long)]
        root: String,

        /// Leaf digest, hex. Defaults to the leaf recorded in the proof file.
        #[arg(long)]
        leaf: Option<String>,
    },
}

/// What `merkle proof` writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofFile {
    pub root: Digest256,
    pub leaf: Digest256,
    pub proof: MerkleProof,
}

pub fn run_merkle(args: &MerkleArgs) -> Result<u8> {
    match &args.command {
        MerkleCommand::Root { leaves } => {
            let tree = load_tree(leaves)?;
            write_json(
                &serde_json::json!({ "root": tree.root(), "leaves": tree.leaf_count() }),
                None,
            )?;
            Ok(EXIT_OK)
        }
        MerkleCommand::Proof { leaves, index, out } => {
            let file = prove(&load_tree(leaves)?, *index)?;
            write_json(&file, out.as_deref())?;
            Ok(EXIT_OK)
        }
        MerkleCommand::Verify { proof, root, leaf } => {
            let file: ProofFile = read_json(proof)?;
            let root = Digest256::from_hex(root).context("invalid --root")?;
            let leaf = match leaf {
                Some(hex) => Digest256::from_hex(hex).context("invalid --leaf")?,
                None => file.leaf,
            };
            let valid = verify_inclusion(&leaf, &file.proof, &root, file.proof.leaf_index);
            write_json(&serde_json::json!({ "valid": valid }), None)?;
            Ok(if valid { EXIT_OK } else { EXIT_REJECTED })
        }
    }
}

fn load_tree(path: &std::path::Path) -> Result<MerkleTree> {
    let leaves: Vec<Digest256> = read_json(path)?;
    Ok(MerkleTree::build(leaves)?)
}

pub fn prove(tree: &MerkleTree, index: usize) -> Result<ProofFile> {
    let proof = tree.proof(index)?;
    let leaf = *tree
        .leaves()
        .get(index)
        .context("leaf index out of range")?;
    Ok(ProofFile {
        root: tree.root(),
        leaf,
        proof,
    })
}
