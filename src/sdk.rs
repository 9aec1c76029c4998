//! One entry point owning every protocol client, plus the composite
//! operations that fan out across them.
//!
//! # Examples
//!
//! ```no_run
//! use solsdk::Pubkey;
//!
//! # async fn example() -> solsdk::Result<()> {
//! let sdk = solsdk::mainnet()?;
//! let owner: Pubkey = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".parse()?;
//!
//! let portfolio = sdk.portfolio(&owner).await;
//! if let Some(sol) = portfolio.solana.data() {
//!     println!("{sol} SOL");
//! }
//! for (branch, kind) in portfolio.failures() {
//!     println!("{branch} unavailable: {kind}");
//! }
//!
//! let health = sdk.health_check().await;
//! println!("{:.0}% of upstreams reachable", health.overall * 100.0);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use futures::{FutureExt, future::BoxFuture};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Config, ErrorKind, Pubkey, Result,
    adapter::ProtocolAdapter,
    compose::{
        AggregateReport, Aggregator, ProtocolResult,
        health::{HealthProber, HealthReport},
    },
    protocols::{
        drift::{self, PerpMarket, PerpPosition},
        jupiter,
        kamino::{self, Obligation, Reserve},
        magiceden::{self, CollectionStats},
        marinade::{self, StakingStats},
        privacy, pyth,
        solana::{self, TokenBalance},
        tokens, wormhole,
    },
    units::Amount,
};

/// Collections returned in [`MarketOverview::nfts`].
const OVERVIEW_COLLECTIONS: u32 = 10;

/// A wallet's holdings across protocols. Each branch succeeds or fails alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Wallet the holdings belong to.
    pub owner: Pubkey,
    /// Native SOL balance.
    pub solana: ProtocolResult<Amount>,
    /// Non-zero SPL token balances.
    pub tokens: ProtocolResult<Vec<TokenBalance>>,
    /// Kamino lending obligations.
    pub kamino: ProtocolResult<Vec<Obligation>>,
    /// Drift perp positions.
    pub drift: ProtocolResult<Vec<PerpPosition>>,
    /// SOL per mSOL.
    pub marinade: ProtocolResult<Decimal>,
    /// When the snapshot was assembled.
    pub timestamp: DateTime<Utc>,
}

impl Portfolio {
    /// SOL value of the mSOL held, when both the token and price branches succeeded.
    pub fn staked_sol(&self) -> Option<Decimal> {
        let balances = self.tokens.data()?;
        let price = self.marinade.data()?;
        let msol = tokens::MSOL.pubkey();
        let held: Decimal = balances
            .iter()
            .filter(|balance| balance.mint == msol)
            .map(|balance| balance.amount.display())
            .sum();
        held.checked_mul(*price)
    }

    /// Failed branches with their kind.
    pub fn failures(&self) -> Vec<(&'static str, ErrorKind)> {
        [
            ("solana", self.solana.failure_kind()),
            ("tokens", self.tokens.failure_kind()),
            ("kamino", self.kamino.failure_kind()),
            ("drift", self.drift.failure_kind()),
            ("marinade", self.marinade.failure_kind()),
        ]
        .into_iter()
        .filter_map(|(branch, kind)| Some((branch, kind?)))
        .collect()
    }
}

/// Market-wide snapshot across protocols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    /// SOL/USD from each price source.
    pub sol_price: AggregateReport<Decimal>,
    /// Kamino main-market reserves.
    pub lending: ProtocolResult<Vec<Reserve>>,
    /// Drift perp markets.
    pub perps: ProtocolResult<Vec<PerpMarket>>,
    /// Marinade price and yield.
    pub staking: ProtocolResult<StakingStats>,
    /// Most traded Magic Eden collections.
    pub nfts: ProtocolResult<Vec<CollectionStats>>,
    /// When the snapshot was assembled.
    pub timestamp: DateTime<Utc>,
}

/// Entry point holding one client per protocol.
#[derive(Debug)]
pub struct Sdk {
    config: Config,
    aggregator: Aggregator,
    prober: HealthProber,
    connection: solana::Client,
    jupiter: jupiter::Client,
    pyth: pyth::Client,
    kamino: kamino::Client,
    marinade: marinade::Client,
    drift: drift::Client,
    magiceden: magiceden::Client,
    wormhole: wormhole::Client,
    privacy: Option<privacy::Client>,
}

impl Sdk {
    /// Builds every client from one configuration.
    ///
    /// The privacy relayer client is only built when its endpoint is configured.
    pub fn new(config: Config) -> Result<Self> {
        let privacy = match config.endpoint(privacy::NAME) {
            Some(_) => Some(privacy::Client::new(&config)?),
            None => None,
        };
        Ok(Self {
            aggregator: Aggregator::new(config.timeout()),
            prober: HealthProber::new(config.timeout()),
            connection: solana::Client::new(&config)?,
            jupiter: jupiter::Client::new(&config)?,
            pyth: pyth::Client::new(&config)?,
            kamino: kamino::Client::new(&config)?,
            marinade: marinade::Client::new(&config)?,
            drift: drift::Client::new(&config)?,
            magiceden: magiceden::Client::new(&config)?,
            wormhole: wormhole::Client::new(&config)?,
            privacy,
            config,
        })
    }

    /// The configuration the clients were built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &solana::Client {
        &self.connection
    }

    pub fn jupiter(&self) -> &jupiter::Client {
        &self.jupiter
    }

    pub fn pyth(&self) -> &pyth::Client {
        &self.pyth
    }

    pub fn kamino(&self) -> &kamino::Client {
        &self.kamino
    }

    pub fn marinade(&self) -> &marinade::Client {
        &self.marinade
    }

    pub fn drift(&self) -> &drift::Client {
        &self.drift
    }

    pub fn magiceden(&self) -> &magiceden::Client {
        &self.magiceden
    }

    pub fn wormhole(&self) -> &wormhole::Client {
        &self.wormhole
    }

    /// The relayer client, when configured.
    pub fn privacy(&self) -> Option<&privacy::Client> {
        self.privacy.as_ref()
    }

    /// Holdings of `owner` across protocols. Never fails as a whole.
    pub async fn portfolio(&self, owner: &Pubkey) -> Portfolio {
        let agg = &self.aggregator;
        let (solana, tokens, kamino, drift, marinade) = tokio::join!(
            agg.settle("solana", self.connection.balance(owner)),
            agg.settle("tokens", self.connection.token_accounts(owner)),
            agg.settle("kamino", self.kamino.obligations(owner, None)),
            agg.settle("drift", self.drift.positions(owner, None)),
            agg.settle("marinade", self.marinade.msol_price()),
        );
        Portfolio {
            owner: *owner,
            solana,
            tokens,
            kamino,
            drift,
            marinade,
            timestamp: Utc::now(),
        }
    }

    /// USD price of `mint` from every source that covers it.
    ///
    /// Jupiter is always asked; Pyth only when a USD feed is known for the mint.
    pub async fn prices(&self, mint: &Pubkey) -> AggregateReport<Decimal> {
        let mut sources: Vec<(&str, BoxFuture<'_, Result<Decimal>>)> = vec![(
            jupiter::NAME,
            async move { Ok(self.jupiter.price(mint).await?.usd_price) }.boxed(),
        )];
        if let Some(feed) = pyth::usd_feed_for_mint(mint) {
            sources.push((
                pyth::NAME,
                async move { Ok(self.pyth.latest_price(feed).await?.price) }.boxed(),
            ));
        }
        self.aggregator.aggregate(sources).await
    }

    /// Prices, lending, perps, staking and NFT figures in one call.
    pub async fn market_overview(&self) -> MarketOverview {
        let sol = tokens::SOL.pubkey();
        let agg = &self.aggregator;
        let (sol_price, lending, perps, staking, nfts) = tokio::join!(
            self.prices(&sol),
            agg.settle(kamino::NAME, self.kamino.reserves(None)),
            agg.settle(drift::NAME, self.drift.markets()),
            agg.settle(marinade::NAME, self.marinade.stats()),
            agg.settle(
                magiceden::NAME,
                self.magiceden.popular_collections(OVERVIEW_COLLECTIONS)
            ),
        );
        MarketOverview {
            sol_price,
            lending,
            perps,
            staking,
            nfts,
            timestamp: Utc::now(),
        }
    }

    /// Probes every upstream. Never fails.
    pub async fn health_check(&self) -> HealthReport {
        let mut components: Vec<&dyn ProtocolAdapter> = vec![
            &self.connection,
            &self.jupiter,
            &self.pyth,
            &self.kamino,
            &self.marinade,
            &self.drift,
            &self.magiceden,
            &self.wormhole,
        ];
        if let Some(privacy) = &self.privacy {
            components.push(privacy);
        }
        self.prober.check(&components).await
    }
}
