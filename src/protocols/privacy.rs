//! Privacy-transfer relayer.
//!
//! The relayer has no public default endpoint; it must be configured with
//! `Config::with_endpoint("privacy", url)`. A configured API key is sent as a
//! bearer token.
//!
//! The client is session-style: [`Client::initialize`] fetches the relayer's
//! fee schedule and supported mints, and every other operation fails with
//! `InvalidState` until it has succeeded.
//!
//! # Examples
//!
//! ```no_run
//! use solsdk::{Config, Network, Pubkey, protocols::privacy, units::Amount};
//!
//! # async fn example() -> solsdk::Result<()> {
//! let config = Config::new(Network::Mainnet)
//!     .with_endpoint("privacy", "https://relayer.example.com".parse().unwrap());
//! let client = privacy::Client::new(&config)?;
//! client.initialize().await?;
//!
//! let quote = client
//!     .quote_withdraw(&privacy::WithdrawParams {
//!         amount: Amount::lamports(2_000_000_000),
//!         mint: None,
//!     })
//!     .await?;
//! println!("fee {} SOL, receive {} SOL", quote.fee, quote.receive);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{FutureExt, future::BoxFuture};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use url::Url;

use crate::{
    Config, Error, Network, Pubkey, Result,
    adapter::{ProtocolAdapter, Session},
    compose::cache::SingleFlight,
    transport::{self, Auth, Transport},
    units::{self, Amount, SOL_DECIMALS},
};

/// Component name and config key.
pub const NAME: &str = "privacy";

/// Relayer parameters fetched by [`Client::initialize`].
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerConfig {
    #[serde(rename = "relayerAddress")]
    pub relayer: Pubkey,
    pub fee_bps: u16,
    /// Fee floor in lamports. Only native SOL withdrawals are subject to it.
    #[serde_as(as = "DisplayFromStr")]
    pub minimum_fee: u64,
    /// SPL mints the relayer accepts besides native SOL.
    #[serde(default)]
    pub supported_mints: Vec<Pubkey>,
}

impl RelayerConfig {
    /// `floor(raw * fee_bps / 10_000)`, raised to `minimum_fee` for native SOL.
    ///
    /// The floor is denominated in lamports, so SPL withdrawals pay the
    /// proportional fee alone.
    #[must_use]
    pub fn fee_for(&self, raw: u64, native: bool) -> u64 {
        let fee = units::bps_of(raw, self.fee_bps);
        if native { fee.max(self.minimum_fee) } else { fee }
    }
}

/// Withdrawal to quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawParams {
    pub amount: Amount,
    /// SPL mint; native SOL when `None`.
    #[serde(default)]
    pub mint: Option<Pubkey>,
}

/// Fee breakdown of a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawQuote {
    pub amount: Amount,
    pub fee: Amount,
    /// `amount - fee`.
    pub receive: Amount,
    pub relayer: Pubkey,
}

/// A shielded account registered with the relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldedAccount {
    pub id: String,
    pub address: Pubkey,
    pub network: Network,
    pub created_at: Option<DateTime<Utc>>,
}

/// Relayer client.
#[derive(Debug)]
pub struct Client {
    transport: Transport,
    base_url: Url,
    session: Session<RelayerConfig>,
    accounts: SingleFlight<(Network, Pubkey), ShieldedAccount>,
}

impl Client {
    /// Creates a client. `InvalidArgument` when no relayer endpoint is configured.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.endpoint(NAME).cloned().ok_or_else(|| {
            Error::invalid_argument("privacy.new", "no relayer endpoint configured")
        })?;
        let auth = config.api_key(NAME).map_or(Auth::None, Auth::Bearer);
        Ok(Self {
            transport: Transport::with_auth(config, auth)?,
            base_url,
            session: Session::new(NAME),
            accounts: SingleFlight::new(),
        })
    }

    /// Fetches the relayer parameters (`/config`) and starts the session.
    ///
    /// Calling it again refreshes the parameters. On failure the previous
    /// parameters, if any, stay in place.
    pub async fn initialize(&self) -> Result<Arc<RelayerConfig>> {
        self.session
            .initialize(|| self.fetch_config("privacy.initialize"))
            .await
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    pub async fn is_initialized(&self) -> bool {
        self.session.is_initialized().await
    }

    /// Shielded SOL balance of `owner` (`/balance/{owner}`).
    pub async fn shielded_balance(&self, owner: &Pubkey) -> Result<Amount> {
        self.session.get("privacy.shielded_balance").await?;
        let url = transport::join(&self.base_url, &format!("balance/{owner}"))?;
        let raw: RawBalance = self
            .transport
            .get_json("privacy.shielded_balance", url)
            .await?;
        Amount::new(raw.amount, raw.decimals).map_err(|err| {
            Error::malformed("privacy.shielded_balance", err.message().to_owned())
        })
    }

    /// Computes the relayer fee of a withdrawal. No network call.
    pub async fn quote_withdraw(&self, params: &WithdrawParams) -> Result<WithdrawQuote> {
        const OP: &str = "privacy.quote_withdraw";
        let relayer = self.session.get(OP).await?;

        match params.mint {
            Some(mint) if !relayer.supported_mints.contains(&mint) => {
                return Err(Error::invalid_argument(
                    OP,
                    format!("mint {mint} is not supported by the relayer"),
                ));
            }
            None if params.amount.decimals() != SOL_DECIMALS => {
                return Err(Error::invalid_argument(
                    OP,
                    format!(
                        "native SOL has {SOL_DECIMALS} decimals, got {}",
                        params.amount.decimals()
                    ),
                ));
            }
            _ => {}
        }

        let raw = params.amount.raw();
        let fee = relayer.fee_for(raw, params.mint.is_none());
        if raw <= fee {
            return Err(Error::invalid_argument(
                OP,
                format!("amount {} does not cover fee {fee}", params.amount),
            ));
        }

        let decimals = params.amount.decimals();
        Ok(WithdrawQuote {
            amount: params.amount,
            fee: Amount::new(fee, decimals)?,
            receive: Amount::new(raw - fee, decimals)?,
            relayer: relayer.relayer,
        })
    }

    /// Returns the shielded account of `identity` on `network`, creating it once.
    ///
    /// Concurrent calls for the same pair share one `POST /accounts`; the result
    /// is cached for the lifetime of the client. Failures are not cached.
    pub async fn account(&self, network: Network, identity: &Pubkey) -> Result<ShieldedAccount> {
        const OP: &str = "privacy.account";
        self.session.get(OP).await?;

        self.accounts
            .get_or_try_init((network, *identity), || async move {
                let url = transport::join(&self.base_url, "accounts")?;
                let body = AccountRequest {
                    network,
                    identity: *identity,
                };
                let raw: RawAccount = self.transport.post_json(OP, url, &body).await?;
                log::debug!("{OP}: created {} for {identity} on {network}", raw.account_id);
                Ok(ShieldedAccount {
                    id: raw.account_id,
                    address: raw.address,
                    network,
                    created_at: raw.created_at,
                })
            })
            .await
    }

    async fn fetch_config(&self, operation: &'static str) -> Result<RelayerConfig> {
        let url = transport::join(&self.base_url, "config")?;
        self.transport.get_json(operation, url).await
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.fetch_config("privacy.probe").await.map(drop) }.boxed()
    }
}

#[serde_as]
#[derive(Deserialize)]
struct RawBalance {
    #[serde_as(as = "DisplayFromStr")]
    amount: u64,
    decimals: u32,
}

#[derive(Serialize)]
struct AccountRequest {
    network: Network,
    identity: Pubkey,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAccount {
    account_id: String,
    address: Pubkey,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}
