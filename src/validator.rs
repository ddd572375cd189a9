/// Receipt validation: the full proof-of-existence check.
///
/// Orchestrates the codec, Merkle verification, and anchor decoding into
/// one pass over a receipt:
///
/// 1. context URI check
/// 2. hash-type check
/// 3. target hash vs the expected content hash
/// 4. Merkle inclusion proof
/// 5. first recognized anchor
/// 6. on-chain output scripts via the fetch collaborator
/// 7. anchor payload decode
/// 8. anchored hash vs Merkle root
///
/// Every step short-circuits into `Verdict::Invalid` with its reason.
/// Only a fetch failure escapes as an error; retry policy belongs to
/// the fetch collaborator, never to the validator.
use tracing::{debug, info};

use crate::anchor::payload::{decode_anchor, extract_op_return};
use crate::anchor::{AnchorFetcher, Network};
use crate::error::{ChainpointError, Result};
use crate::merkle::verify_proof;
use crate::receipt::{Receipt, CHAINPOINT_CONTEXT};

/// Terminal outcome of receipt validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(InvalidReason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Why a receipt failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// `@context` is not the Chainpoint v2 URI.
    BadContext,
    /// The receipt's hash-type tag is not a known algorithm.
    UnsupportedHashType,
    /// `targetHash` does not match the expected content hash.
    HashMismatch,
    /// The Merkle inclusion proof does not reproduce the root.
    ProofFailed,
    /// No anchor of a verifiable kind in the receipt.
    NoRecognizedAnchor,
    /// No fetched output script carries an OP_RETURN data payload.
    NoDataPayload,
    /// An OP_RETURN payload was found but could not be decoded.
    MalformedAnchorPayload(String),
    /// The anchored hash does not match the receipt's Merkle root.
    AnchorMismatch,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadContext => write!(f, "receipt context is not the Chainpoint v2 URI"),
            Self::UnsupportedHashType => write!(f, "unknown receipt hash type"),
            Self::HashMismatch => write!(f, "target hash does not match the expected hash"),
            Self::ProofFailed => write!(f, "Merkle proof verification failed"),
            Self::NoRecognizedAnchor => write!(f, "no recognized anchor in receipt"),
            Self::NoDataPayload => write!(f, "no OP_RETURN data payload in transaction outputs"),
            Self::MalformedAnchorPayload(msg) => write!(f, "malformed anchor payload: {msg}"),
            Self::AnchorMismatch => write!(f, "anchored hash does not match the Merkle root"),
        }
    }
}

/// Validates receipts against expected content hashes and on-chain
/// anchor payloads fetched through `F`.
pub struct ReceiptValidator<F: AnchorFetcher> {
    fetcher: F,
    network: Network,
}

impl<F: AnchorFetcher> ReceiptValidator<F> {
    pub fn new(fetcher: F, network: Network) -> Self {
        Self { fetcher, network }
    }

    /// Fully validate `receipt` against `expected_hash`.
    ///
    /// Returns `Ok(Verdict)` for every locally decidable outcome. Only a
    /// failed anchor fetch surfaces as `Err`, unmodified.
    pub async fn validate(&self, receipt: &Receipt, expected_hash: &str) -> Result<Verdict> {
        if !receipt.context.eq_ignore_ascii_case(CHAINPOINT_CONTEXT) {
            return Ok(Verdict::Invalid(InvalidReason::BadContext));
        }

        let algorithm = match receipt.hash_algorithm() {
            Ok(algorithm) => algorithm,
            Err(_) => return Ok(Verdict::Invalid(InvalidReason::UnsupportedHashType)),
        };

        if !receipt.target_hash.eq_ignore_ascii_case(expected_hash) {
            return Ok(Verdict::Invalid(InvalidReason::HashMismatch));
        }

        let target = hex::decode(&receipt.target_hash)
            .map_err(|e| ChainpointError::MalformedReceipt(format!("targetHash: {e}")))?;
        let root = hex::decode(&receipt.merkle_root)
            .map_err(|e| ChainpointError::MalformedReceipt(format!("merkleRoot: {e}")))?;
        let steps = receipt.proof_steps()?;
        if !verify_proof(algorithm, &steps, &target, &root) {
            return Ok(Verdict::Invalid(InvalidReason::ProofFailed));
        }
        debug!(target_hash = %receipt.target_hash, "Merkle proof verified");

        let anchor = match receipt
            .anchors
            .iter()
            .find(|a| a.kind().is_some_and(|k| k.is_verifiable()))
        {
            Some(anchor) => anchor,
            None => return Ok(Verdict::Invalid(InvalidReason::NoRecognizedAnchor)),
        };

        let scripts = self
            .fetcher
            .fetch_output_scripts(&anchor.source_id, self.network)
            .await?;

        let payload = match scripts.iter().find_map(|s| extract_op_return(s).ok()) {
            Some(payload) => payload,
            None => return Ok(Verdict::Invalid(InvalidReason::NoDataPayload)),
        };

        let decoded = match decode_anchor(payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                return Ok(Verdict::Invalid(InvalidReason::MalformedAnchorPayload(
                    e.to_string(),
                )))
            }
        };

        if !decoded.hash_hex.eq_ignore_ascii_case(&receipt.merkle_root) {
            return Ok(Verdict::Invalid(InvalidReason::AnchorMismatch));
        }

        info!(
            txid = %anchor.source_id,
            root = %receipt.merkle_root,
            format = ?decoded.format,
            "Receipt anchor verified"
        );
        Ok(Verdict::Valid)
    }
}
