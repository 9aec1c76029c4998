//! Magic Eden NFT marketplace: collection statistics and listings.
//!
//! Magic Eden quotes collection figures in lamports and listing prices in SOL;
//! both are normalized to [`Amount`] with 9 decimals.

use futures::{FutureExt, future::BoxFuture};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    Config, Error, Pubkey, Result,
    adapter::ProtocolAdapter,
    transport::{self, Auth, Transport},
    units::{self, Amount, SOL_DECIMALS},
};

/// Component name and config key.
pub const NAME: &str = "magiceden";

/// Page size used when [`Page::limit`] is `None`.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page the upstream serves.
pub const MAX_PAGE_LIMIT: u32 = 100;

pub fn default_url() -> Url {
    "https://api-mainnet.magiceden.dev".parse().unwrap()
}

/// Offset pagination.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub offset: u32,
    /// Defaults to [`DEFAULT_PAGE_LIMIT`]; at most [`MAX_PAGE_LIMIT`].
    #[serde(default)]
    pub limit: Option<u32>,
}

impl Page {
    fn limit(&self, operation: &'static str) -> Result<u32> {
        match self.limit.unwrap_or(DEFAULT_PAGE_LIMIT) {
            0 => Err(Error::invalid_argument(operation, "limit must be positive")),
            limit if limit > MAX_PAGE_LIMIT => Err(Error::invalid_argument(
                operation,
                format!("limit {limit} exceeds {MAX_PAGE_LIMIT}"),
            )),
            limit => Ok(limit),
        }
    }
}

/// Statistics of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub symbol: String,
    pub name: Option<String>,
    pub floor_price: Option<Amount>,
    pub listed_count: Option<u64>,
    pub volume_all: Option<Amount>,
    pub avg_price_24h: Option<Amount>,
}

/// An active listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub token_mint: Pubkey,
    pub seller: Pubkey,
    pub price: Amount,
    pub pda_address: Option<String>,
}

/// Magic Eden REST client.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
    base_url: Url,
}

impl Client {
    /// Creates a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let auth = config.api_key(NAME).map_or(Auth::None, Auth::Bearer);
        Ok(Self {
            transport: Transport::with_auth(config, auth)?,
            base_url: config.endpoint(NAME).cloned().unwrap_or_else(default_url),
        })
    }

    /// Sets a custom base URL.
    pub fn with_url(self, base_url: Url) -> Self {
        Self { base_url, ..self }
    }

    /// Statistics of a collection (`/v2/collections/{symbol}/stats`).
    pub async fn collection_stats(&self, symbol: &str) -> Result<CollectionStats> {
        let url = transport::join(&self.base_url, &format!("v2/collections/{symbol}/stats"))?;
        let raw: RawStats = self
            .transport
            .get_json("magiceden.collection_stats", url)
            .await?;
        raw.normalize("magiceden.collection_stats")
    }

    /// Active listings of a collection (`/v2/collections/{symbol}/listings`).
    pub async fn listings(&self, symbol: &str, page: Page) -> Result<Vec<Listing>> {
        let limit = page.limit("magiceden.listings")?;
        let mut url = transport::join(&self.base_url, &format!("v2/collections/{symbol}/listings"))?;
        url.query_pairs_mut()
            .append_pair("offset", &page.offset.to_string())
            .append_pair("limit", &limit.to_string());

        let raw: Vec<RawListing> = self.transport.get_json("magiceden.listings", url).await?;
        raw.into_iter()
            .map(|listing| {
                Ok(Listing {
                    token_mint: listing.token_mint,
                    seller: listing.seller,
                    price: Amount::from_display(listing.price, SOL_DECIMALS).map_err(|err| {
                        Error::malformed("magiceden.listings", err.message().to_owned())
                    })?,
                    pda_address: listing.pda_address,
                })
            })
            .collect()
    }

    /// Most traded collections of the last day (`/v2/marketplace/popular_collections`).
    pub async fn popular_collections(&self, limit: u32) -> Result<Vec<CollectionStats>> {
        let limit = Page {
            offset: 0,
            limit: Some(limit),
        }
        .limit("magiceden.popular_collections")?;
        let mut url = transport::join(&self.base_url, "v2/marketplace/popular_collections")?;
        url.query_pairs_mut()
            .append_pair("timeRange", "1d")
            .append_pair("limit", &limit.to_string());

        let raw: Vec<RawStats> = self
            .transport
            .get_json("magiceden.popular_collections", url)
            .await?;
        raw.into_iter()
            .map(|stats| stats.normalize("magiceden.popular_collections"))
            .collect()
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.popular_collections(1).await.map(drop) }.boxed()
    }
}

/// Floors a lamport figure the upstream may send with a fractional part.
fn lamports(operation: &'static str, value: Option<Decimal>) -> Result<Option<Amount>> {
    value
        .map(|value| {
            units::to_base_units(value, 0)
                .map(Amount::lamports)
                .map_err(|err| Error::malformed(operation, err.message().to_owned()))
        })
        .transpose()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStats {
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    floor_price: Option<Decimal>,
    #[serde(default)]
    listed_count: Option<u64>,
    #[serde(default)]
    volume_all: Option<Decimal>,
    #[serde(default, rename = "avgPrice24hr")]
    avg_price_24h: Option<Decimal>,
}

impl RawStats {
    fn normalize(self, operation: &'static str) -> Result<CollectionStats> {
        Ok(CollectionStats {
            floor_price: lamports(operation, self.floor_price)?,
            volume_all: lamports(operation, self.volume_all)?,
            avg_price_24h: lamports(operation, self.avg_price_24h)?,
            symbol: self.symbol,
            name: self.name,
            listed_count: self.listed_count,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListing {
    token_mint: Pubkey,
    seller: Pubkey,
    price: Decimal,
    #[serde(default)]
    pda_address: Option<String>,
}
