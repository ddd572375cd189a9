/// Blockchain anchoring: payload decoding and the transaction fetch seam.
///
/// A receipt's Merkle root is anchored on-chain inside an OP_RETURN
/// output. This module decodes the on-chain payload back into the
/// anchored hash and defines the collaborator trait through which raw
/// output scripts are fetched from a blockchain-indexing API. The core
/// only consumes script hex; it never performs the HTTP call itself.
pub mod esplora;
pub mod payload;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Anchor kinds named by Chainpoint v2 receipts.
///
/// Only the Bitcoin OP_RETURN kind is verifiable here; `EthData` is
/// carried so receipts bearing it parse cleanly and are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorType {
    BtcOpReturn,
    EthData,
}

impl AnchorType {
    /// Parse a receipt anchor tag. Returns None for unknown kinds.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "BTCOpReturn" => Some(Self::BtcOpReturn),
            "ETHData" => Some(Self::EthData),
            _ => None,
        }
    }

    /// The wire tag used in receipt JSON.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::BtcOpReturn => "BTCOpReturn",
            Self::EthData => "ETHData",
        }
    }

    /// Whether this crate can verify anchors of this kind.
    pub fn is_verifiable(&self) -> bool {
        matches!(self, Self::BtcOpReturn)
    }
}

/// Which Bitcoin network a transaction lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Test,
}

/// Collaborator supplying raw on-chain data for anchor verification.
///
/// Implementations own all network concerns: endpoints, timeouts,
/// retries. The validator only consumes the returned script hex, so it
/// can equally be driven by an in-memory stub in tests.
#[async_trait]
pub trait AnchorFetcher: Send + Sync {
    /// Fetch the output scripts of `txid`, in output order, as hex.
    async fn fetch_output_scripts(&self, txid: &str, network: Network) -> Result<Vec<String>>;
}
