/// Chainpoint v2 receipt codec.
///
/// A receipt is the portable proof-of-existence artifact: it ties a
/// target hash to a Merkle root through an inclusion proof, and names
/// the blockchain transaction the root was anchored in. Receipts are
/// value objects: created once from a built tree, immutable, with no
/// back-reference to the tree.
///
/// Wire format (round-trips exactly):
/// ```json
/// { "@context": "https://w3id.org/chainpoint/v2",
///   "type": "ChainpointSHA256v2",
///   "targetHash": "<hex>",
///   "merkleRoot": "<hex>",
///   "proof": [ {"left": "<hex>"}, {"right": "<hex>"} ],
///   "anchors": [ {"type": "BTCOpReturn", "sourceId": "<txid>"} ] }
/// ```
use serde::{Deserialize, Serialize};

use crate::anchor::AnchorType;
use crate::crypto::HashAlgorithm;
use crate::error::{ChainpointError, Result};
use crate::merkle::{MerkleTree, Position};

/// The fixed Chainpoint v2 context URI.
pub const CHAINPOINT_CONTEXT: &str = "https://w3id.org/chainpoint/v2";

/// A Chainpoint v2 receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The fixed Chainpoint context URI.
    #[serde(rename = "@context")]
    pub context: String,
    /// Hash-type tag, e.g. "ChainpointSHA256v2".
    #[serde(rename = "type")]
    pub hash_type: String,
    /// Hex digest of the proven leaf.
    #[serde(rename = "targetHash")]
    pub target_hash: String,
    /// Hex digest of the anchored Merkle root.
    #[serde(rename = "merkleRoot")]
    pub merkle_root: String,
    /// Inclusion proof steps, leaf-to-root.
    pub proof: Vec<ProofStep>,
    /// Blockchain anchors asserted to contain the root.
    pub anchors: Vec<ReceiptAnchor>,
}

/// One sibling step in a receipt proof. Serializes to `{"left": "<hex>"}`
/// or `{"right": "<hex>"}` per the Chainpoint wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofStep {
    Left(String),
    Right(String),
}

/// A blockchain anchor reference inside a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAnchor {
    /// Anchor kind tag, e.g. "BTCOpReturn".
    #[serde(rename = "type")]
    pub anchor_type: String,
    /// Transaction id containing the anchored root.
    #[serde(rename = "sourceId")]
    pub source_id: String,
}

impl ReceiptAnchor {
    /// The anchor kind, if this crate knows it.
    pub fn kind(&self) -> Option<AnchorType> {
        AnchorType::from_tag(&self.anchor_type)
    }
}

impl Receipt {
    /// Build a receipt for the leaf at `index` of a built tree.
    pub fn from_tree(
        tree: &MerkleTree,
        index: usize,
        anchor_type: AnchorType,
        source_id: impl Into<String>,
    ) -> Result<Self> {
        let proof = tree.proof(index)?;
        let steps = proof
            .steps
            .iter()
            .map(|(position, digest)| match position {
                Position::Left => ProofStep::Left(hex::encode(digest)),
                Position::Right => ProofStep::Right(hex::encode(digest)),
            })
            .collect();

        Ok(Self {
            context: CHAINPOINT_CONTEXT.to_string(),
            hash_type: tree.algorithm().chainpoint_type().to_string(),
            target_hash: hex::encode(tree.leaf(index)?),
            merkle_root: tree.root_hex()?,
            proof: steps,
            anchors: vec![ReceiptAnchor {
                anchor_type: anchor_type.tag().to_string(),
                source_id: source_id.into(),
            }],
        })
    }

    /// Parse and shape-check a receipt from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let receipt: Receipt = serde_json::from_str(json)
            .map_err(|e| ChainpointError::MalformedReceipt(e.to_string()))?;
        receipt.check_shape()?;
        Ok(receipt)
    }

    /// Serialize to the Chainpoint JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChainpointError::MalformedReceipt(e.to_string()))
    }

    /// Resolve the receipt's hash-type tag to an algorithm.
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm> {
        HashAlgorithm::from_chainpoint_type(&self.hash_type)
    }

    /// The proof steps as raw digests, ready for verification.
    pub fn proof_steps(&self) -> Result<Vec<(Position, Vec<u8>)>> {
        self.proof
            .iter()
            .map(|step| {
                let (position, digest_hex) = match step {
                    ProofStep::Left(d) => (Position::Left, d),
                    ProofStep::Right(d) => (Position::Right, d),
                };
                let digest = hex::decode(digest_hex).map_err(|e| {
                    ChainpointError::MalformedReceipt(format!("proof step is not hex: {e}"))
                })?;
                Ok((position, digest))
            })
            .collect()
    }

    /// Field-shape validation beyond what deserialization enforces:
    /// the hash type must be a known tag and the digest fields hex of
    /// that algorithm's length.
    fn check_shape(&self) -> Result<()> {
        let algorithm = self.hash_algorithm()?;
        for (field, value) in [
            ("targetHash", &self.target_hash),
            ("merkleRoot", &self.merkle_root),
        ] {
            let bytes = hex::decode(value).map_err(|e| {
                ChainpointError::MalformedReceipt(format!("{field} is not hex: {e}"))
            })?;
            if bytes.len() != algorithm.digest_len() {
                return Err(ChainpointError::MalformedReceipt(format!(
                    "{field} is {} bytes, expected {} for {}",
                    bytes.len(),
                    algorithm.digest_len(),
                    algorithm
                )));
            }
        }
        self.proof_steps()?;
        Ok(())
    }
}
