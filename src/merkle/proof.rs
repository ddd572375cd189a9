/// Merkle inclusion proof generation and verification.
use serde::{Deserialize, Serialize};

use super::tree::MerkleTree;
use crate::crypto::HashAlgorithm;
use crate::error::{ChainpointError, Result};

/// Position of a sibling relative to the node being authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Left,
    Right,
}

/// An inclusion proof for a single leaf, ordered leaf-to-root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: usize,
    /// Digest of the proven leaf.
    pub leaf_digest: Vec<u8>,
    /// Sibling digests with their side, one per paired level.
    pub steps: Vec<(Position, Vec<u8>)>,
}

impl MerkleTree {
    /// Generate an inclusion proof for the leaf at `index`.
    ///
    /// Walks the stored levels from the leaf up. At levels where the node
    /// has no sibling (odd-count promotion) no step is emitted.
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        if !self.is_ready() {
            return Err(ChainpointError::TreeNotReady);
        }
        if index >= self.leaf_count() {
            return Err(ChainpointError::IndexOutOfRange {
                index,
                count: self.leaf_count(),
            });
        }

        let mut steps = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };

            if sibling_idx < level.len() {
                let position = if sibling_idx < idx {
                    Position::Left
                } else {
                    Position::Right
                };
                steps.push((position, level[sibling_idx].clone()));
            }

            idx /= 2;
        }

        Ok(MerkleProof {
            leaf_index: index,
            leaf_digest: self.leaf(index)?.to_vec(),
            steps,
        })
    }
}

/// Verify an inclusion proof against a target digest and a claimed root.
///
/// Folds the steps leaf-to-root: a `Left` sibling is prepended, a `Right`
/// sibling appended, and the pair hashed with `algorithm`. Pure function
/// with no tree dependency, so proofs received from external sources can
/// be checked in isolation.
pub fn verify_proof(
    algorithm: HashAlgorithm,
    steps: &[(Position, Vec<u8>)],
    target_digest: &[u8],
    claimed_root: &[u8],
) -> bool {
    let mut acc = target_digest.to_vec();

    for (position, sibling) in steps {
        let mut input = Vec::with_capacity(acc.len() + sibling.len());
        match position {
            Position::Left => {
                input.extend_from_slice(sibling);
                input.extend_from_slice(&acc);
            }
            Position::Right => {
                input.extend_from_slice(&acc);
                input.extend_from_slice(sibling);
            }
        }
        acc = algorithm.digest(&input);
    }

    acc == claimed_root
}
