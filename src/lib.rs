//! # solsdk
//!
//! Typed Rust clients for Solana DeFi protocols, with a composition layer that
//! combines many upstream calls into one result without failing wholesale.
//!
//! ## Quick Navigation
//!
//! | Module | Description | Common Use Cases |
//! |--------|-------------|------------------|
//! | [`Sdk`] | All clients behind one config | Portfolios, market overviews, health |
//! | [`protocols`] | Per-protocol clients | Quotes, prices, reserves, positions |
//! | [`compose`] | Settle-all aggregation | Custom fan-outs with partial failure |
//! | [`compose::health`] | Reachability probing | Dashboards, readiness checks |
//! | [`units`] | Base unit conversions | Lamports to SOL, token decimals |
//! | [`config`] | Construction-time settings | Endpoints, API keys, timeouts |
//!
//! ## Features
//!
//! - Clients for Solana RPC, Jupiter, Pyth, Kamino, Marinade, Drift, Magic Eden,
//!   Wormhole and a privacy-transfer relayer
//! - One error taxonomy ([`ErrorKind`]) for every upstream failure
//! - Exact amounts: base units plus decimals, displayed as [`Decimal`]
//! - Partial-failure aggregation: every requested branch gets a result
//! - Per-request and per-branch timeouts
//!
//! ## Getting Started
//!
//! ### Installation
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! solsdk = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ### Your First Query
//!
//! ```no_run
//! use solsdk::protocols::tokens;
//!
//! #[tokio::main]
//! async fn main() -> solsdk::Result<()> {
//!     let sdk = solsdk::mainnet()?;
//!
//!     let prices = sdk.prices(&tokens::SOL.pubkey()).await;
//!     for (source, price) in prices.successes() {
//!         println!("{source}: SOL = ${price}");
//!     }
//!     for (source, kind) in prices.failures() {
//!         println!("{source} failed: {kind}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Endpoints
//!
//! ```no_run
//! use std::time::Duration;
//! use solsdk::{Config, Network, Sdk};
//!
//! # fn example() -> solsdk::Result<()> {
//! let config = Config::new(Network::Mainnet)
//!     .with_rpc_url("https://my-rpc.example.com".parse().unwrap())
//!     .with_api_key("jupiter", "my-key")
//!     .with_timeout(Duration::from_secs(10));
//! let sdk = Sdk::new(config)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                     Sdk                      │
//! │  portfolio · market_overview · health_check  │
//! ├──────────────────────────────────────────────┤
//! │      Aggregator / HealthProber (compose)     │
//! ├──────────────────────────────────────────────┤
//! │ solana · jupiter · pyth · kamino · marinade  │
//! │ drift · magiceden · wormhole · privacy       │
//! ├──────────────────────────────────────────────┤
//! │         Transport (reqwest) · units          │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never
//! installs a logger. Failed branches are logged at `warn`, retries at `debug`.

pub mod adapter;
pub mod compose;
pub mod config;
mod error;
pub mod protocols;
mod pubkey;
mod sdk;
pub mod transport;
pub mod units;

pub use config::{Config, Network};
pub use error::{Error, ErrorKind, Result};
pub use pubkey::Pubkey;
/// Re-exported decimal type from rust_decimal.
///
/// Used for every price, rate and display amount.
pub use rust_decimal::{Decimal, dec};
pub use sdk::{MarketOverview, Portfolio, Sdk};

/// Creates an [`Sdk`] for mainnet with default settings.
///
/// # Example
///
/// ```
/// let sdk = solsdk::mainnet().unwrap();
/// assert!(sdk.config().network.is_mainnet());
/// ```
pub fn mainnet() -> Result<Sdk> {
    Sdk::new(Config::new(Network::Mainnet))
}

/// Creates an [`Sdk`] for devnet with default settings.
pub fn devnet() -> Result<Sdk> {
    Sdk::new(Config::new(Network::Devnet))
}
