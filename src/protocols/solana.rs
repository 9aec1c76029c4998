//! Solana JSON-RPC connection.
//!
//! Reports under the component name `connection`. The endpoint is
//! [`Config::rpc_url`], which defaults to the public endpoint of the configured
//! [`Network`](crate::Network).
//!
//! # Examples
//!
//! ```no_run
//! use solsdk::{Config, Pubkey, protocols::solana};
//!
//! # async fn example() -> solsdk::Result<()> {
//! let client = solana::Client::new(&Config::default())?;
//! let owner: Pubkey = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".parse()?;
//!
//! let sol = client.balance(&owner).await?;
//! println!("{sol} SOL at slot {}", client.slot().await?);
//!
//! for token in client.token_accounts(&owner).await? {
//!     println!("{}: {}", token.mint, token.amount);
//! }
//! # Ok(())
//! # }
//! ```

use futures::{FutureExt, future::BoxFuture};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};
use url::Url;

use crate::{
    Config, Error, Pubkey, Result, adapter::ProtocolAdapter, transport::Transport,
    units::Amount,
};

/// Component name.
pub const NAME: &str = "connection";

/// SPL Token program.
pub const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Token-2022 program.
pub const TOKEN_2022_PROGRAM: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// Token program owning an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum TokenProgram {
    #[display("spl-token")]
    Token,
    #[display("spl-token-2022")]
    Token2022,
}

impl TokenProgram {
    /// Program address.
    #[must_use]
    pub const fn program_id(&self) -> &'static str {
        match self {
            Self::Token => TOKEN_PROGRAM,
            Self::Token2022 => TOKEN_2022_PROGRAM,
        }
    }
}

/// A non-zero SPL token balance held by an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Token account address.
    pub account: Pubkey,
    pub mint: Pubkey,
    pub amount: Amount,
    pub program: TokenProgram,
}

/// JSON-RPC client.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
    rpc_url: Url,
}

impl Client {
    /// Creates a client for the configured RPC endpoint.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            rpc_url: config.rpc_url(),
        })
    }

    /// Points the client at another RPC endpoint.
    pub fn with_url(self, rpc_url: Url) -> Self {
        Self { rpc_url, ..self }
    }

    /// Returns the RPC endpoint.
    pub fn url(&self) -> &Url {
        &self.rpc_url
    }

    /// Current slot (`getSlot`).
    pub async fn slot(&self) -> Result<u64> {
        self.transport
            .rpc("solana.slot", self.rpc_url.clone(), "getSlot", json!([]))
            .await
    }

    /// Native SOL balance (`getBalance`).
    pub async fn balance(&self, owner: &Pubkey) -> Result<Amount> {
        let response: WithContext<u64> = self
            .transport
            .rpc(
                "solana.balance",
                self.rpc_url.clone(),
                "getBalance",
                json!([owner.to_string()]),
            )
            .await?;
        Ok(Amount::lamports(response.value))
    }

    /// Non-zero token balances across both token programs.
    ///
    /// Issues one `getTokenAccountsByOwner` call per program, concurrently.
    /// Fails if either call fails.
    pub async fn token_accounts(&self, owner: &Pubkey) -> Result<Vec<TokenBalance>> {
        let (legacy, token_2022) = tokio::try_join!(
            self.token_accounts_of(owner, TokenProgram::Token),
            self.token_accounts_of(owner, TokenProgram::Token2022),
        )?;
        Ok(legacy.into_iter().chain(token_2022).collect())
    }

    async fn token_accounts_of(
        &self,
        owner: &Pubkey,
        program: TokenProgram,
    ) -> Result<Vec<TokenBalance>> {
        let response: WithContext<Vec<KeyedAccount>> = self
            .transport
            .rpc(
                "solana.token_accounts",
                self.rpc_url.clone(),
                "getTokenAccountsByOwner",
                json!([
                    owner.to_string(),
                    { "programId": program.program_id() },
                    { "encoding": "jsonParsed" }
                ]),
            )
            .await?;

        response
            .value
            .into_iter()
            .filter(|keyed| keyed.account.data.parsed.info.token_amount.amount != 0)
            .map(|keyed| {
                let info = keyed.account.data.parsed.info;
                Ok(TokenBalance {
                    account: keyed.pubkey,
                    mint: info.mint,
                    amount: Amount::new(info.token_amount.amount, info.token_amount.decimals)
                        .map_err(|err| {
                            Error::malformed("solana.token_accounts", err.message().to_owned())
                        })?,
                    program,
                })
            })
            .collect()
    }

    /// Decimals of a mint (`getTokenSupply`).
    pub async fn mint_decimals(&self, mint: &Pubkey) -> Result<u32> {
        let response: WithContext<UiTokenAmount> = self
            .transport
            .rpc(
                "solana.mint_decimals",
                self.rpc_url.clone(),
                "getTokenSupply",
                json!([mint.to_string()]),
            )
            .await?;
        Ok(response.value.decimals)
    }
}

impl ProtocolAdapter for Client {
    fn name(&self) -> &'static str {
        NAME
    }

    fn probe(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.slot().await.map(drop) }.boxed()
    }
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct KeyedAccount {
    pubkey: Pubkey,
    account: ParsedAccount,
}

#[derive(Deserialize)]
struct ParsedAccount {
    data: ParsedData,
}

#[derive(Deserialize)]
struct ParsedData {
    parsed: ParsedTokenAccount,
}

#[derive(Deserialize)]
struct ParsedTokenAccount {
    info: TokenAccountInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: Pubkey,
    token_amount: UiTokenAmount,
}

#[serde_as]
#[derive(Deserialize)]
struct UiTokenAmount {
    #[serde_as(as = "DisplayFromStr")]
    amount: u64,
    decimals: u32,
}
