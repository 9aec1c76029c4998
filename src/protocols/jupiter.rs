//! Jupiter swap aggregator: quotes and USD prices.
//!
//! Requests carry an `x-api-key` header when `Config::api_key("jupiter")` is set.
//!
//! # Examples
//!
//! ```no_run
//! use solsdk::{Config, protocols::{jupiter, tokens}, units::Amount};
//! use rust_decimal::dec;
//!
//! # async fn example() -> solsdk::Result<()> {
//! let client = jupiter::Client::new(&Config::default())?;
//!
//! let quote = client
//!     .quote(&jupiter::QuoteParams {
//!         input_mint: tokens::SOL.pubkey(),
//!         output_mint: tokens::USDC.pubkey(),
//!         amount: Amount::from_display(dec!(1.5), tokens::SOL.decimals)?,
//!         output_decimals: tokens::USDC.decimals,
//!         slippage_bps: None,
//!         only_direct_routes: false,
//!     })
//!     .await?;
//! println!("1.5 SOL -> {} USDC via {:?}", quote.out_amount, quote.route);
//!
//! let sol = client.price(&tokens::SOL.pubkey()).await?;
//! println!("SOL = ${}", sol.usd_price);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use futures::{FutureExt, future::BoxFuture};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use url::Url;

use super::tokens;
use crate::{
    Config, Error, Pubkey, Result,
    adapter::ProtocolAdapter,
    transport::{self, Auth, Transport},
    units::{Amount, BPS_DENOMINATOR},
};

/// Component name and config key.
pub const NAME: &str = "jupiter";

/// Slippage applied when [`QuoteParams::slippage_bps`] is `None`.
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

pub fn default_url() -> Url {
    "https://lite-api.jup.ag".parse().unwrap()
}

/// Quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteParams {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    /// Exact input amount; its decimals are those of `input_mint`.
    pub amount: Amount,
    /// Decimals of `output_mint`, used to normalize the quoted output.
    pub output_decimals: u32,
    /// Defaults to [`DEFAULT_SLIPPAGE_BPS`]. At most 10 000.
    #[serde(default)]
    pub slippage_bps: Option<u16>,
    #[serde(default)]
    pub only_direct_routes: bool,
}

impl QuoteParams {
    fn validate(&self) -> Result<u16> {
        let slippage_bps = self.slippage_bps.unwrap_or(DEFAULT_SLIPPAGE_BPS);
        if u64::from(slippage_bps) > BPS_DENOMINATOR {
            return Err(Error::invalid_argument(
                "jupiter.quote",
                format!("slippage {slippage_bps} bps exceeds {BPS_DENOMINATOR}"),
            ));
        }
        if self.amount.is_zero() {
            return Err(Error::invalid_argument("jupiter.quote", "amount is zero"));
        }
        if self.input_mint == self.output_mint {
            return Err(Error::invalid_argument(
                "jupiter.quote",
                "input and output mints are the same",
            ));
        }
        Ok(slippage_bps)
    }
}

/// A normalized swap quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub in_amount: Amount,
    pub out_amount: Amount,
    /// Minimum output after slippage.
    pub min_out_amount: Amount,
    pub slippage_bps: u16,
    /// Price impact as a fraction, e.g. `0.0012` for 0.12%.
    pub price_impact: Decimal,
    /// AMM labels along the route, in order.
    pub route: Vec<String>,
    pub context_slot: Option<u64>,
}

/// USD price of a mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub mint: Pubkey,
    pub usd_price: Decimal,
    pub decimals: Option<u32>,
    /// 24h change in percent.
    pub price_change_24h: Option<Decimal>,
}

/// Jupiter REST client.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
    base_url: Url,
}

impl Client {
    /// Creates a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let auth = match config.api_key(NAME) {
            Some(key) => Auth::Header("x-api-key", key),
            None => Auth::None,
        };
        Ok(Self {
            transport: Transport::with_auth(config, auth)?,
            base_url: config.endpoint(NAME).cloned().unwrap_or_else(default_url),
        })
    }

    /// Sets a custom base URL.
    pub fn with_url(self, base_url: Url) -> Self {
        Self { base_url, ..self }
    }

    /// Quotes an exact-in swap (`/swap/v1/quote`).
    ///
    /// Parameters are validated before any network call.
    pub async fn quote(&self, params: &QuoteParams) -> Result<Quote> {
        let slippage_bps = params.validate()?;

        let mut url = transport::join(&self.base_url, "swap/v1/quote")?;
        url.query_pairs_mut()
            .append_pair("inputMint", &params.input_mint.to_string())
            .append_pair("outputMint", &params.output_mint.to_string())
            .append_pair("amount", &params.amount.raw().to_string())
            .append_pair("slippageBps", &slippage_bps.to_string())
            .append_pair("swapMode", "ExactIn")
            .append_pair(
                "onlyDirectRoutes",
                if params.only_direct_routes { "true" } else { "false" },
            );

        let raw: RawQuote = self.transport.get_json("jupiter.quote", url).await?;
        Ok(Quote {
            input_mint: raw.input_mint,
            output_mint: raw.output_mint,
            in_amount: Amount::new(raw.in_amount, params.amount.decimals())?,
            out_amount: Amount::new(raw.out_amount, params.output_decimals)?,
            min_out_amount: Amount::new(raw.other_amount_threshold, params.output_decimals)?,
            slippage_bps: raw.slippage_bps,
            price_impact: raw.price_impact_pct,
            route: raw
                .route_plan
                .into_iter()
                .filter_map(|step| step.swap_info.label)
                .collect(),
            context_slot: raw.context_slot,
        })
    }

    /// USD prices of several mints (`/price/v3`).
    ///
    /// Mints Jupiter has no price for are absent from the map.
    pub async fn prices(&self, mints: &[Pubkey]) -> Result<BTreeMap<Pubkey, TokenPrice>> {
        if mints.is_empty() {
            return Ok(BTreeMap::new());
        }
        let ids = mints
            .iter()
            .map(Pubkey::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut url = transport::join(&self.base_url, "price/v3")?;
        url.query_pairs_mut().append_pair("ids", &ids);

        let raw: BTreeMap<Pubkey, Option<RawPrice>> =
            self.transport.get_json("jupiter.prices", url).await?;
        Ok(raw
            .into_iter()
            .filter_map(|(mint, price)| {
                let price = price?;
                Some((
                    mint,
                    TokenPrice {
                        mint,
                        usd_price: price.usd_price,
                        decimals: price.decimals,
                        price_change_24h: price.price_change_24h,
                    },
                ))
            })
            .collect())
    }

    /// USD price of one mint. `NotFound` when Jupiter has none.
    pub async fn price(&self, mint: &Pubkey) -> Result<TokenPrice> {
        self.prices(std::slice::from_ref(mint))
            .await?
            .remove(mint)
            .ok_or_else(|| Error::not_found("jupiter.price", format!("no price for {mint}")))
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.price(&tokens::SOL.pubkey()).await.map(drop) }.boxed()
    }
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuote {
    input_mint: Pubkey,
    output_mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    in_amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    out_amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    other_amount_threshold: u64,
    slippage_bps: u16,
    #[serde(default)]
    price_impact_pct: Decimal,
    #[serde(default)]
    route_plan: Vec<RoutePlanStep>,
    #[serde(default)]
    context_slot: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutePlanStep {
    swap_info: SwapInfo,
}

#[derive(Deserialize)]
struct SwapInfo {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrice {
    usd_price: Decimal,
    #[serde(default)]
    decimals: Option<u32>,
    #[serde(default)]
    price_change_24h: Option<Decimal>,
}
