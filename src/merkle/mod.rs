/// Merkle tree construction and inclusion proofs.
pub mod proof;
pub mod tree;

pub use proof::{verify_proof, MerkleProof, Position};
pub use tree::MerkleTree;
