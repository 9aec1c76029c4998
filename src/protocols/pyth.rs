//! Pyth price oracle through the Hermes REST API.
//!
//! Oracle prices arrive as an integer mantissa plus a base-10 exponent; they are
//! scaled into [`Decimal`] through [`units::from_exponent`].
//!
//! # Examples
//!
//! ```no_run
//! use solsdk::{Config, protocols::pyth};
//!
//! # async fn example() -> solsdk::Result<()> {
//! let client = pyth::Client::new(&Config::default())?;
//! let sol = client.latest_price(pyth::SOL_USD).await?;
//! println!("SOL/USD {} ± {} at {}", sol.price, sol.confidence, sol.publish_time);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use futures::{FutureExt, future::BoxFuture};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use url::Url;

use super::tokens;
use crate::{
    Config, Error, ErrorKind, Pubkey, Result,
    adapter::ProtocolAdapter,
    transport::{self, Transport},
    units,
};

/// Component name and config key.
pub const NAME: &str = "pyth";

pub const SOL_USD: &str = "ef0d8b6fda2ceba41da15d4095d1da392a0d2f8ed0c6c7bc0f4cfac8c280b56d";
pub const BTC_USD: &str = "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43";
pub const ETH_USD: &str = "ff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace";
pub const USDC_USD: &str = "eaa020c61cc479712813461ce153894a96a6c00b21ed0cfc2798d1f9a9e9c94a";

pub fn default_url() -> Url {
    "https://hermes.pyth.network".parse().unwrap()
}

/// USD feed id for a well-known mint.
pub fn usd_feed_for_mint(mint: &Pubkey) -> Option<&'static str> {
    match tokens::by_mint(mint)?.symbol {
        "SOL" => Some(SOL_USD),
        "USDC" => Some(USDC_USD),
        _ => None,
    }
}

/// Lowercase hex without the `0x` prefix, the form Hermes answers with.
fn normalize_feed_id(id: &str) -> String {
    id.trim_start_matches("0x").to_ascii_lowercase()
}

/// Normalizes `id` and checks it is 32 bytes of hex.
fn parse_feed_id(operation: &'static str, id: &str) -> Result<String> {
    let normalized = normalize_feed_id(id);
    if normalized.len() != 64 || !normalized.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::invalid_argument(
            operation,
            format!("feed id {id:?} is not 64 hex characters"),
        ));
    }
    Ok(normalized)
}

/// A parsed oracle price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    /// Feed id, lowercase hex without `0x`.
    pub feed_id: String,
    pub price: Decimal,
    pub confidence: Decimal,
    /// Exponentially-weighted moving average price, when published.
    pub ema_price: Option<Decimal>,
    pub publish_time: DateTime<Utc>,
}

/// Feed metadata returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedInfo {
    pub id: String,
    pub symbol: Option<String>,
    pub asset_type: Option<String>,
    pub description: Option<String>,
}

/// Hermes client.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
    base_url: Url,
}

impl Client {
    /// Creates a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            base_url: config.endpoint(NAME).cloned().unwrap_or_else(default_url),
        })
    }

    /// Sets a custom base URL.
    pub fn with_url(self, base_url: Url) -> Self {
        Self { base_url, ..self }
    }

    /// Latest prices for several feeds (`/v2/updates/price/latest`).
    ///
    /// `InvalidArgument` if any id is not 64 hex characters, `0x` optional.
    pub async fn latest_prices(&self, feed_ids: &[&str]) -> Result<Vec<OraclePrice>> {
        if feed_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = feed_ids
            .iter()
            .map(|id| parse_feed_id("pyth.latest_prices", id))
            .collect::<Result<Vec<_>>>()?;
        let mut url = transport::join(&self.base_url, "v2/updates/price/latest")?;
        {
            let mut query = url.query_pairs_mut();
            for id in &ids {
                query.append_pair("ids[]", id);
            }
            query.append_pair("parsed", "true");
        }

        let response: LatestPriceResponse =
            self.transport.get_json("pyth.latest_prices", url).await?;
        response
            .parsed
            .into_iter()
            .map(|feed| {
                Ok(OraclePrice {
                    price: feed.price.scaled()?,
                    confidence: feed.price.scaled_confidence()?,
                    ema_price: feed.ema_price.map(|ema| ema.scaled()).transpose()?,
                    publish_time: feed.price.publish_time()?,
                    feed_id: normalize_feed_id(&feed.id),
                })
            })
            .collect()
    }

    /// Latest price of one feed. `NotFound` when Hermes does not know it.
    pub async fn latest_price(&self, feed_id: &str) -> Result<OraclePrice> {
        const OP: &str = "pyth.latest_price";
        let wanted = parse_feed_id(OP, feed_id)?;
        match self.latest_prices(&[wanted.as_str()]).await {
            Ok(prices) => prices
                .into_iter()
                .find(|price| price.feed_id == wanted)
                .ok_or_else(|| Error::not_found(OP, format!("no feed {wanted}"))),
            // Hermes answers 400 for ids it does not know
            Err(err) if err.kind() == ErrorKind::InvalidRequest => Err(Error::not_found(
                OP,
                format!("no feed {wanted}: {}", err.message()),
            )),
            Err(err) => Err(err),
        }
    }

    /// Searches feeds by symbol text (`/v2/price_feeds`).
    pub async fn search_feeds(&self, query: &str) -> Result<Vec<FeedInfo>> {
        let mut url = transport::join(&self.base_url, "v2/price_feeds")?;
        url.query_pairs_mut().append_pair("query", query);

        let feeds: Vec<RawFeed> = self.transport.get_json("pyth.search_feeds", url).await?;
        Ok(feeds
            .into_iter()
            .map(|feed| FeedInfo {
                id: normalize_feed_id(&feed.id),
                symbol: feed.attributes.symbol,
                asset_type: feed.attributes.asset_type,
                description: feed.attributes.description,
            })
            .collect())
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.latest_price(SOL_USD).await.map(drop) }.boxed()
    }
}

#[derive(Deserialize)]
struct LatestPriceResponse {
    #[serde(default)]
    parsed: Vec<ParsedFeed>,
}

#[derive(Deserialize)]
struct ParsedFeed {
    id: String,
    price: RawPrice,
    #[serde(default)]
    ema_price: Option<RawPrice>,
}

#[serde_as]
#[derive(Deserialize)]
struct RawPrice {
    #[serde_as(as = "DisplayFromStr")]
    price: i64,
    #[serde_as(as = "DisplayFromStr")]
    conf: u64,
    expo: i32,
    publish_time: i64,
}

impl RawPrice {
    fn check_expo(&self) -> Result<()> {
        if self.expo > 0 {
            return Err(Error::malformed(
                "pyth.latest_prices",
                format!("positive exponent {}", self.expo),
            ));
        }
        Ok(())
    }

    fn scaled(&self) -> Result<Decimal> {
        self.check_expo()?;
        units::from_exponent(self.price, self.expo)
    }

    fn scaled_confidence(&self) -> Result<Decimal> {
        self.check_expo()?;
        units::from_signed_base_units(i128::from(self.conf), self.expo.unsigned_abs())
    }

    fn publish_time(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.publish_time, 0).ok_or_else(|| {
            Error::malformed(
                "pyth.latest_prices",
                format!("publish time {} out of range", self.publish_time),
            )
        })
    }
}

#[derive(Deserialize)]
struct RawFeed {
    id: String,
    #[serde(default)]
    attributes: FeedAttributes,
}

#[derive(Default, Deserialize)]
struct FeedAttributes {
    symbol: Option<String>,
    asset_type: Option<String>,
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn test_scale_price() {
        let raw: RawPrice = serde_json::from_value(serde_json::json!({
            "price": "14523000000",
            "conf": "7150000",
            "expo": -8,
            "publish_time": 1_700_000_000
        }))
        .unwrap();
        assert_eq!(raw.scaled().unwrap(), dec!(145.23));
        assert_eq!(raw.scaled_confidence().unwrap(), dec!(0.0715));
        assert_eq!(raw.publish_time().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_positive_exponent_is_malformed() {
        let raw = RawPrice {
            price: 1,
            conf: 0,
            expo: 3,
            publish_time: 0,
        };
        assert!(raw.scaled().unwrap_err().kind().is_unknown());
    }

    #[test]
    fn test_feed_helpers() {
        assert_eq!(normalize_feed_id("0xEF0D8b6fda"), "ef0d8b6fda");
        assert_eq!(
            parse_feed_id("test", &format!("0x{}", SOL_USD.to_uppercase())).unwrap(),
            SOL_USD
        );
        assert!(parse_feed_id("test", "abcd").unwrap_err().kind().is_invalid_argument());
        let not_hex = format!("{}zz", &SOL_USD[..62]);
        assert!(parse_feed_id("test", &not_hex).unwrap_err().kind().is_invalid_argument());
        assert_eq!(usd_feed_for_mint(&tokens::SOL.pubkey()), Some(SOL_USD));
        assert_eq!(usd_feed_for_mint(&tokens::BONK.pubkey()), None);
    }
}
