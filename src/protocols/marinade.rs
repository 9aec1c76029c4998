//! Marinade liquid staking: mSOL price and staking yield.

use chrono::{DateTime, Utc};
use futures::{FutureExt, future::BoxFuture};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    Config, Result,
    adapter::ProtocolAdapter,
    transport::{self, Transport},
};

/// Component name and config key.
pub const NAME: &str = "marinade";

pub fn default_url() -> Url {
    "https://api.marinade.finance".parse().unwrap()
}

/// Annualized yield over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingApy {
    /// Fraction, e.g. `0.0712` for 7.12%.
    pub value: Decimal,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Price and yield together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingStats {
    /// SOL per mSOL.
    pub msol_price: Decimal,
    pub apy: StakingApy,
}

/// Marinade REST client.
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

    /// SOL per mSOL (`/msol/price_sol`).
    pub async fn msol_price(&self) -> Result<Decimal> {
        let url = transport::join(&self.base_url, "msol/price_sol")?;
        self.transport.get_json("marinade.msol_price", url).await
    }

    /// 30-day trailing APY (`/msol/apy/30d`).
    pub async fn apy(&self) -> Result<StakingApy> {
        let url = transport::join(&self.base_url, "msol/apy/30d")?;
        let raw: RawApy = self.transport.get_json("marinade.apy", url).await?;
        Ok(StakingApy {
            value: raw.value,
            start_time: raw.start_time,
            end_time: raw.end_time,
        })
    }

    /// Price and APY. Two concurrent calls; fails if either fails.
    pub async fn stats(&self) -> Result<StakingStats> {
        let (msol_price, apy) = tokio::try_join!(self.msol_price(), self.apy())?;
        Ok(StakingStats { msol_price, apy })
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.msol_price().await.map(drop) }.boxed()
    }
}

#[derive(Deserialize)]
struct RawApy {
    value: Decimal,
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
}
