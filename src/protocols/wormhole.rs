//! Wormhole cross-chain messages through the Wormholescan API.

use chrono::{DateTime, Utc};
use futures::{FutureExt, future::BoxFuture};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use url::Url;

use crate::{
    Config, Error, Network, Result,
    adapter::ProtocolAdapter,
    transport::{self, Transport},
};

/// Component name and config key.
pub const NAME: &str = "wormhole";

/// Wormhole chain id of Solana.
pub const SOLANA_CHAIN_ID: u16 = 1;

/// Wormholescan base URL for a network.
pub fn default_url(network: Network) -> Url {
    if network.is_mainnet() {
        "https://api.wormholescan.io".parse().unwrap()
    } else {
        "https://api.testnet.wormholescan.io".parse().unwrap()
    }
}

/// Delivery status of one cross-chain message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStatus {
    /// `chain/emitter/sequence`.
    pub id: String,
    pub emitter_chain: u16,
    pub emitter_address: String,
    pub sequence: u64,
    pub source_status: Option<String>,
    pub target_status: Option<String>,
    /// Whether the message was delivered on the target chain.
    pub redeemed: bool,
    pub target_tx_hash: Option<String>,
}

/// A guardian-signed VAA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedVaa {
    pub id: String,
    /// Base64-encoded VAA bytes.
    pub vaa: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub tx_hash: Option<String>,
}

/// Wormholescan client.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
    base_url: Url,
}

impl Client {
    /// Creates a client for the configured network.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            base_url: config
                .endpoint(NAME)
                .cloned()
                .unwrap_or_else(|| default_url(config.network)),
        })
    }

    /// Sets a custom base URL.
    pub fn with_url(self, base_url: Url) -> Self {
        Self { base_url, ..self }
    }

    /// Messages emitted by a source transaction (`/api/v1/operations`).
    ///
    /// An empty result is `NotFound`.
    pub async fn operations(&self, tx_hash: &str) -> Result<Vec<MessageStatus>> {
        let mut url = transport::join(&self.base_url, "api/v1/operations")?;
        url.query_pairs_mut().append_pair("txHash", tx_hash);

        let raw: OperationsResponse = self.transport.get_json("wormhole.operations", url).await?;
        if raw.operations.is_empty() {
            return Err(Error::not_found(
                "wormhole.operations",
                format!("no messages for {tx_hash}"),
            ));
        }
        Ok(raw.operations.into_iter().map(MessageStatus::from).collect())
    }

    /// A signed VAA by its coordinates (`/api/v1/vaas/{chain}/{emitter}/{sequence}`).
    pub async fn vaa(&self, chain_id: u16, emitter: &str, sequence: u64) -> Result<SignedVaa> {
        let url = transport::join(
            &self.base_url,
            &format!("api/v1/vaas/{chain_id}/{emitter}/{sequence}"),
        )?;
        let raw: VaaResponse = self.transport.get_json("wormhole.vaa", url).await?;
        Ok(SignedVaa {
            id: raw.data.id,
            vaa: raw.data.vaa,
            timestamp: raw.data.timestamp,
            tx_hash: raw.data.tx_hash,
        })
    }

    async fn health(&self) -> Result<()> {
        let url = transport::join(&self.base_url, "api/v1/health")?;
        let _: serde_json::Value = self.transport.get_json("wormhole.health", url).await?;
        Ok(())
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        self.health().boxed()
    }
}

#[derive(Deserialize)]
struct OperationsResponse {
    #[serde(default)]
    operations: Vec<RawOperation>,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    id: String,
    emitter_chain: u16,
    emitter_address: EmitterAddress,
    #[serde_as(as = "DisplayFromStr")]
    sequence: u64,
    #[serde(default)]
    source_chain: Option<ChainLeg>,
    #[serde(default)]
    target_chain: Option<ChainLeg>,
}

#[derive(Deserialize)]
struct EmitterAddress {
    hex: String,
}

#[derive(Deserialize)]
struct ChainLeg {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transaction: Option<LegTransaction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegTransaction {
    tx_hash: String,
}

impl From<RawOperation> for MessageStatus {
    fn from(raw: RawOperation) -> Self {
        let (target_status, target_tx_hash) = match raw.target_chain {
            Some(leg) => (leg.status, leg.transaction.map(|tx| tx.tx_hash)),
            None => (None, None),
        };
        Self {
            id: raw.id,
            emitter_chain: raw.emitter_chain,
            emitter_address: raw.emitter_address.hex,
            sequence: raw.sequence,
            source_status: raw.source_chain.and_then(|leg| leg.status),
            redeemed: target_status
                .as_deref()
                .is_some_and(|status| status.eq_ignore_ascii_case("completed")),
            target_status,
            target_tx_hash,
        }
    }
}

#[derive(Deserialize)]
struct VaaResponse {
    data: RawVaa,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVaa {
    id: String,
    vaa: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    tx_hash: Option<String>,
}
