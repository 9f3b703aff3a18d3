//! # Binary Merkle Tree
//!
//! Binds an ordered list of credential digests to a single root that is
//! anchored on the ledger.
//!
//! ## Algorithm
//!
//! - Interior node: `SHA256(hex(left) || hex(right))`, hashing the two
//!   64-character lowercase hex strings as UTF-8 text. Ledger clients that
//!   recompute roots do the same, so the text form is part of the format.
//! - A layer with an odd node count duplicates its last node.
//! - A single-leaf tree has the leaf itself as its root.
//!
//! Proofs are positional: the sibling list runs bottom-up and the leaf index
//! decides, at each level, whether the running hash is the left or right
//! operand.

use serde::{Deserialize, Serialize};

use ets_core::{sha256_str, CryptoError, Digest256};

/// Interior node hash over the hex text of both children.
pub fn hash_pair(left: &Digest256, right: &Digest256) -> Digest256 {
    let mut text = String::with_capacity(128);
    text.push_str(&left.to_hex());
    text.push_str(&right.to_hex());
    sha256_str(&text)
}

/// An inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the leaf in the original list.
    pub leaf_index: usize,
    /// Sibling hashes from the leaf layer up to (excluding) the root.
    pub siblings: Vec<Digest256>,
}

/// A fully materialized tree. Layer 0 holds the leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<Digest256>>,
    root: Digest256,
}

impl MerkleTree {
    /// Build a tree over `leaves` in the given order.
    ///
    /// # Errors
    ///
    /// `CryptoError::TreeEmpty` if `leaves` is empty.
    pub fn build(leaves: Vec<Digest256>) -> Result<Self, CryptoError> {
        if leaves.is_empty() {
            return Err(CryptoError::TreeEmpty);
        }

        let mut root = leaves[0];
        let mut layers = vec![leaves];
        while let Some(current) = layers.last() {
            if current.len() == 1 {
                break;
            }
            let next = current
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    hash_pair(left, pair.get(1).unwrap_or(left))
                })
                .collect();
            layers.push(next);
        }
        if let Some(top) = layers.last().and_then(|t| t.first()) {
            root = *top;
        }
        Ok(Self { layers, root })
    }

    /// The root digest.
    pub fn root(&self) -> Digest256 {
        self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    pub fn leaves(&self) -> &[Digest256] {
        self.layers.first().map_or(&[], Vec::as_slice)
    }

    /// Inclusion proof for the leaf at `index`.
    ///
    /// # Errors
    ///
    /// `CryptoError::ProofPositionInvalid` if `index >= leaf_count()`.
    pub fn proof(&self, index: usize) -> Result<MerkleProof, CryptoError> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return Err(CryptoError::ProofPositionInvalid { index, leaf_count });
        }

        let mut siblings = Vec::with_capacity(self.layers.len().saturating_sub(1));
        let mut pos = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = pos ^ 1;
            // Odd tail: the node is paired with itself.
            let node = layer.get(sibling).unwrap_or(&layer[pos]);
            siblings.push(*node);
            pos /= 2;
        }
        Ok(MerkleProof {
            leaf_index: index,
            siblings,
        })
    }
}

/// Check that `leaf` sits at `index` under `root`.
///
/// The caller supplies `index` explicitly; a proof replayed at another
/// position fails because the operand order changes.
pub fn verify_inclusion(leaf: &Digest256, proof: &MerkleProof, root: &Digest256, index: usize) -> bool {
    if proof.leaf_index != index {
        return false;
    }
    let mut acc = *leaf;
    let mut pos = index;
    for sibling in &proof.siblings {
        acc = if pos % 2 == 0 {
            hash_pair(&acc, sibling)
        } else {
            hash_pair(sibling, &acc)
        };
        pos /= 2;
    }
    pos == 0 && acc == *root
}
