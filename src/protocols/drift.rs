//! Drift perpetuals: market data and user positions.
//!
//! Position sizes are signed: a short has a negative base amount.

use futures::{FutureExt, future::BoxFuture};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use url::Url;

use crate::{
    Config, Error, Pubkey, Result,
    adapter::ProtocolAdapter,
    transport::{self, Transport},
    units::SignedAmount,
};

/// Component name and config key.
pub const NAME: &str = "drift";

/// Decimals of perp base amounts.
pub const BASE_DECIMALS: u32 = 9;

/// Decimals of quote amounts and PnL.
pub const QUOTE_DECIMALS: u32 = 6;

pub fn default_url() -> Url {
    "https://data.api.drift.trade".parse().unwrap()
}

/// A perpetual market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerpMarket {
    pub market_index: u16,
    /// e.g. `"SOL-PERP"`.
    pub ticker: String,
    pub last_price: Option<Decimal>,
    pub index_price: Option<Decimal>,
    /// Hourly funding rate.
    pub funding_rate: Option<Decimal>,
    /// In base units of the market.
    pub open_interest: Option<Decimal>,
}

/// An open perp position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerpPosition {
    pub market_index: u16,
    pub sub_account: u16,
    pub base_amount: SignedAmount,
    pub quote_entry_amount: SignedAmount,
    /// `None` when the upstream omits it.
    pub unrealized_pnl: Option<SignedAmount>,
    pub settled_pnl: Option<SignedAmount>,
}

impl PerpPosition {
    /// Whether the position is short.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.base_amount.raw() < 0
    }
}

/// Drift data API client.
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

    /// Perpetual markets (`/contracts`). Spot entries are skipped.
    pub async fn markets(&self) -> Result<Vec<PerpMarket>> {
        let url = transport::join(&self.base_url, "contracts")?;
        let raw: ContractsResponse = self.transport.get_json("drift.markets", url).await?;
        Ok(raw
            .contracts
            .into_iter()
            .filter(|contract| contract.product_type.eq_ignore_ascii_case("perp"))
            .map(|contract| PerpMarket {
                market_index: contract.contract_index,
                ticker: contract.ticker_id,
                last_price: contract.last_price,
                index_price: contract.index_price,
                funding_rate: contract.funding_rate,
                open_interest: contract.open_interest,
            })
            .collect())
    }

    /// Open perp positions of `authority`, optionally for one sub-account.
    pub async fn positions(
        &self,
        authority: &Pubkey,
        sub_account: Option<u16>,
    ) -> Result<Vec<PerpPosition>> {
        let mut url = transport::join(&self.base_url, &format!("user/{authority}/positions"))?;
        if let Some(sub_account) = sub_account {
            url.query_pairs_mut()
                .append_pair("subAccountId", &sub_account.to_string());
        }

        let raw: PositionsResponse = self.transport.get_json("drift.positions", url).await?;
        raw.positions
            .into_iter()
            .filter(|position| sub_account.is_none_or(|id| position.sub_account_id == id))
            .map(|position| {
                let quote = |raw: i128| SignedAmount::new(raw, QUOTE_DECIMALS);
                Ok(PerpPosition {
                    market_index: position.market_index,
                    sub_account: position.sub_account_id,
                    base_amount: SignedAmount::new(position.base_asset_amount, BASE_DECIMALS)?,
                    quote_entry_amount: quote(position.quote_entry_amount)?,
                    unrealized_pnl: position.unrealized_pnl.map(quote).transpose()?,
                    settled_pnl: position.settled_pnl.map(quote).transpose()?,
                })
            })
            .collect::<Result<_>>()
            .map_err(|err| Error::malformed("drift.positions", err.message().to_owned()))
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.markets().await.map(drop) }.boxed()
    }
}

#[derive(Deserialize)]
struct ContractsResponse {
    #[serde(default)]
    contracts: Vec<RawContract>,
}

#[derive(Deserialize)]
struct RawContract {
    contract_index: u16,
    ticker_id: String,
    #[serde(default)]
    product_type: String,
    #[serde(default)]
    last_price: Option<Decimal>,
    #[serde(default)]
    index_price: Option<Decimal>,
    #[serde(default)]
    funding_rate: Option<Decimal>,
    #[serde(default)]
    open_interest: Option<Decimal>,
}

#[derive(Deserialize)]
struct PositionsResponse {
    #[serde(default)]
    positions: Vec<RawPosition>,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    market_index: u16,
    #[serde(default)]
    sub_account_id: u16,
    #[serde_as(as = "DisplayFromStr")]
    base_asset_amount: i128,
    #[serde_as(as = "DisplayFromStr")]
    quote_entry_amount: i128,
    #[serde_as(as = "Option<DisplayFromStr>")]
    unrealized_pnl: Option<i128>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    settled_pnl: Option<i128>,
}
