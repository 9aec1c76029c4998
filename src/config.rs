//! Construction-time configuration.
//!
//! A [`Config`] is built once and handed to [`Sdk::new`](crate::Sdk::new) or to an
//! individual protocol client. Nothing in this crate reads environment variables
//! or other ambient state while serving a request.
//!
//! ```
//! use std::time::Duration;
//! use solsdk::{Config, Network};
//!
//! let config = Config::new(Network::Devnet)
//!     .with_rpc_url("https://my-rpc.example.com".parse().unwrap())
//!     .with_api_key("jupiter", "my-key")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_retries(1);
//!
//! assert!(config.network.is_devnet());
//! assert_eq!(config.api_key("jupiter"), Some("my-key"));
//! ```

use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Solana cluster selection.
///
/// Serializes to lowercase: `"mainnet"`, `"devnet"`, `"testnet"`.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
    derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Mainnet beta
    #[default]
    #[display("mainnet")]
    Mainnet,
    /// Devnet
    #[display("devnet")]
    Devnet,
    /// Testnet
    #[display("testnet")]
    Testnet,
}

impl Network {
    /// Returns the public JSON-RPC endpoint for this cluster.
    ///
    /// ```
    /// use solsdk::Network;
    ///
    /// assert_eq!(
    ///     Network::Mainnet.rpc_url().as_str(),
    ///     "https://api.mainnet-beta.solana.com/"
    /// );
    /// ```
    pub fn rpc_url(&self) -> Url {
        match self {
            Self::Mainnet => "https://api.mainnet-beta.solana.com".parse().unwrap(),
            Self::Devnet => "https://api.devnet.solana.com".parse().unwrap(),
            Self::Testnet => "https://api.testnet.solana.com".parse().unwrap(),
        }
    }
}

/// Client configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cluster the clients talk to.
    pub network: Network,
    /// JSON-RPC endpoint override. Defaults to [`Network::rpc_url`].
    pub rpc_url: Option<Url>,
    /// Per-protocol base URL overrides, keyed by protocol name (e.g. `"jupiter"`).
    pub endpoints: BTreeMap<String, Url>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Transport-level retries for transient failures. Adapters never retry on their own.
    pub retries: u32,
    api_keys: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            rpc_url: None,
            endpoints: BTreeMap::new(),
            timeout_ms: millis(DEFAULT_TIMEOUT),
            retries: 0,
            api_keys: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Creates a configuration for the given network with default settings.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    /// Overrides the JSON-RPC endpoint.
    pub fn with_rpc_url(self, rpc_url: Url) -> Self {
        Self {
            rpc_url: Some(rpc_url),
            ..self
        }
    }

    /// Overrides the base URL of one protocol.
    pub fn with_endpoint(mut self, protocol: impl Into<String>, url: Url) -> Self {
        self.endpoints.insert(protocol.into(), url);
        self
    }

    /// Sets the API key of one protocol.
    pub fn with_api_key(mut self, protocol: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(protocol.into(), key.into());
        self
    }

    /// Sets the per-request timeout.
    ///
    /// A zero timeout would fail every request, so it is ignored and the
    /// current value kept. Sub-millisecond timeouts round up to 1 ms.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            log::warn!("ignoring zero timeout, keeping {} ms", self.timeout_ms);
            return self;
        }
        Self {
            timeout_ms: millis(timeout).max(1),
            ..self
        }
    }

    /// Sets the number of transport-level retries.
    pub fn with_retries(self, retries: u32) -> Self {
        Self { retries, ..self }
    }

    /// Returns the effective JSON-RPC endpoint.
    pub fn rpc_url(&self) -> Url {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.network.rpc_url())
    }

    /// Returns the base URL override of a protocol, if any.
    pub fn endpoint(&self, protocol: &str) -> Option<&Url> {
        self.endpoints.get(protocol)
    }

    /// Returns the API key of a protocol, if any.
    pub fn api_key(&self, protocol: &str) -> Option<&str> {
        self.api_keys.get(protocol).map(String::as_str)
    }

    /// Returns the per-request timeout. [`DEFAULT_TIMEOUT`] when `timeout_ms` is zero.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        match self.timeout_ms {
            0 => DEFAULT_TIMEOUT,
            ms => Duration::from_millis(ms),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted: BTreeMap<_, _> = self.api_keys.keys().map(|k| (k, "<redacted>")).collect();
        f.debug_struct("Config")
            .field("network", &self.network)
            .field("rpc_url", &self.rpc_url)
            .field("endpoints", &self.endpoints)
            .field("timeout_ms", &self.timeout_ms)
            .field("retries", &self.retries)
            .field("api_keys", &redacted)
            .finish()
    }
}
