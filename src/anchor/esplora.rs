/// Esplora-backed anchor fetcher.
///
/// Talks to an Esplora-style REST API (blockstream.info, mempool.space)
/// to fetch a transaction's outputs. This is the thin I/O shim around
/// the pure verification core: it returns raw `scriptpubkey` hex in
/// output order and nothing else.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{AnchorFetcher, Network};
use crate::error::{ChainpointError, Result};

const MAINNET_API: &str = "https://blockstream.info/api";
const TESTNET_API: &str = "https://blockstream.info/testnet/api";

/// Anchor fetcher backed by an Esplora-style indexer API.
pub struct EsploraFetcher {
    client: Client,
    mainnet_url: String,
    testnet_url: String,
}

/// Transaction response, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
struct Tx {
    vout: Vec<TxOut>,
}

#[derive(Debug, Deserialize)]
struct TxOut {
    scriptpubkey: String,
}

impl EsploraFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            mainnet_url: MAINNET_API.to_string(),
            testnet_url: TESTNET_API.to_string(),
        }
    }

    /// Use a custom API endpoint for both networks (e.g. a local Esplora).
    pub fn with_base_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            client: Client::new(),
            mainnet_url: url.clone(),
            testnet_url: url,
        }
    }

    fn base_url(&self, network: Network) -> &str {
        match network {
            Network::Main => &self.mainnet_url,
            Network::Test => &self.testnet_url,
        }
    }
}

impl Default for EsploraFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnchorFetcher for EsploraFetcher {
    async fn fetch_output_scripts(&self, txid: &str, network: Network) -> Result<Vec<String>> {
        let url = format!("{}/tx/{}", self.base_url(network), txid);
        debug!(%txid, %url, "Fetching anchor transaction");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainpointError::AnchorFetchFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ChainpointError::AnchorFetchFailed(format!(
                "{url} returned {}",
                resp.status()
            )));
        }

        let tx: Tx = resp
            .json()
            .await
            .map_err(|e| ChainpointError::AnchorFetchFailed(format!("bad tx response: {e}")))?;

        Ok(tx.vout.into_iter().map(|o| o.scriptpubkey).collect())
    }
}
