//! Kamino lending markets: reserve metrics and user obligations.
//!
//! The health factor reported here is `liquidation_ltv / ltv`, a display
//! figure computed from the upstream's own ratios. It is not liquidation math.

use futures::{FutureExt, future::BoxFuture};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    Config, Pubkey, Result,
    adapter::ProtocolAdapter,
    transport::{self, Transport},
};

/// Component name and config key.
pub const NAME: &str = "kamino";

/// Kamino main market.
pub const MAIN_MARKET: &str = "7u3HeHxYDLhnCoErrtycNokbQYbWGzLs6JSDqGAv5PfF";

pub fn default_url() -> Url {
    "https://api.kamino.finance".parse().unwrap()
}

/// Metrics of one reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserve {
    pub address: Pubkey,
    pub symbol: String,
    pub mint: Pubkey,
    /// Fraction, e.g. `0.052` for 5.2%.
    pub supply_apy: Decimal,
    pub borrow_apy: Decimal,
    /// Token units supplied.
    pub total_supply: Decimal,
    pub total_borrow: Decimal,
    pub total_supply_usd: Decimal,
    pub total_borrow_usd: Decimal,
    pub max_ltv: Decimal,
}

/// A user's position in one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub address: Pubkey,
    pub deposited_usd: Decimal,
    pub borrowed_usd: Decimal,
    pub net_value_usd: Decimal,
    /// Loan to value, as a fraction.
    pub ltv: Decimal,
    pub liquidation_ltv: Decimal,
    /// `liquidation_ltv / ltv`; `None` when nothing is borrowed.
    pub health_factor: Option<Decimal>,
}

/// Kamino REST client.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
    base_url: Url,
    market: Pubkey,
}

impl Client {
    /// Creates a client for the main market.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            base_url: config.endpoint(NAME).cloned().unwrap_or_else(default_url),
            market: MAIN_MARKET.parse()?,
        })
    }

    /// Sets a custom base URL.
    pub fn with_url(self, base_url: Url) -> Self {
        Self { base_url, ..self }
    }

    /// Sets the market used when a call passes `None`.
    pub fn with_market(self, market: Pubkey) -> Self {
        Self { market, ..self }
    }

    /// Reserve metrics of a market, the default market when `None`.
    pub async fn reserves(&self, market: Option<&Pubkey>) -> Result<Vec<Reserve>> {
        let market = market.unwrap_or(&self.market);
        let url = transport::join(
            &self.base_url,
            &format!("kamino-market/{market}/reserves/metrics"),
        )?;
        let raw: Vec<RawReserve> = self.transport.get_json("kamino.reserves", url).await?;
        Ok(raw.into_iter().map(Reserve::from).collect())
    }

    /// Obligations of `owner` in a market, the default market when `None`.
    pub async fn obligations(
        &self,
        owner: &Pubkey,
        market: Option<&Pubkey>,
    ) -> Result<Vec<Obligation>> {
        let market = market.unwrap_or(&self.market);
        let url = transport::join(
            &self.base_url,
            &format!("kamino-market/{market}/users/{owner}/obligations"),
        )?;
        let raw: Vec<RawObligation> = self.transport.get_json("kamino.obligations", url).await?;
        Ok(raw.into_iter().map(Obligation::from).collect())
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.reserves(None).await.map(drop) }.boxed()
    }
}

/// `liquidation_ltv / ltv`, or `None` without debt.
pub fn health_factor(ltv: Decimal, liquidation_ltv: Decimal) -> Option<Decimal> {
    if ltv <= Decimal::ZERO {
        return None;
    }
    liquidation_ltv.checked_div(ltv)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReserve {
    reserve: Pubkey,
    liquidity_token: String,
    liquidity_token_mint: Pubkey,
    max_ltv: Decimal,
    borrow_apy: Decimal,
    supply_apy: Decimal,
    total_supply: Decimal,
    total_borrow: Decimal,
    total_borrow_usd: Decimal,
    total_supply_usd: Decimal,
}

impl From<RawReserve> for Reserve {
    fn from(raw: RawReserve) -> Self {
        Self {
            address: raw.reserve,
            symbol: raw.liquidity_token,
            mint: raw.liquidity_token_mint,
            supply_apy: raw.supply_apy,
            borrow_apy: raw.borrow_apy,
            total_supply: raw.total_supply,
            total_borrow: raw.total_borrow,
            total_supply_usd: raw.total_supply_usd,
            total_borrow_usd: raw.total_borrow_usd,
            max_ltv: raw.max_ltv,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObligation {
    obligation_address: Pubkey,
    refreshed_stats: RefreshedStats,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshedStats {
    user_total_deposit: Decimal,
    user_total_borrow: Decimal,
    net_account_value: Decimal,
    loan_to_value: Decimal,
    liquidation_ltv: Decimal,
}

impl From<RawObligation> for Obligation {
    fn from(raw: RawObligation) -> Self {
        let stats = raw.refreshed_stats;
        let health_factor = if stats.user_total_borrow.is_zero() {
            None
        } else {
            health_factor(stats.loan_to_value, stats.liquidation_ltv)
        };
        Self {
            address: raw.obligation_address,
            deposited_usd: stats.user_total_deposit,
            borrowed_usd: stats.user_total_borrow,
            net_value_usd: stats.net_account_value,
            ltv: stats.loan_to_value,
            liquidation_ltv: stats.liquidation_ltv,
            health_factor,
        }
    }
}
