use clap::Parser;
use solsdk::{Config, Network, Pubkey, Sdk};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Wallet to inspect.
    #[arg(short, long)]
    owner: Pubkey,
    /// Solana network.
    #[arg(short, long, default_value = "mainnet")]
    network: Network,
    /// RPC url, the public endpoint of the network when omitted.
    #[arg(short, long)]
    rpc_url: Option<url::Url>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = simple_logger::init_with_level(log::Level::Debug);
    let args = Cli::parse();

    let mut config = Config::new(args.network);
    if let Some(rpc_url) = args.rpc_url {
        config = config.with_rpc_url(rpc_url);
    }
    let sdk = Sdk::new(config)?;

    let portfolio = sdk.portfolio(&args.owner).await;
    if let Some(sol) = portfolio.solana.data() {
        println!("SOL: {sol}");
    }
    for balance in portfolio.tokens.data().into_iter().flatten() {
        println!("{} ({}): {}", balance.mint, balance.program, balance.amount);
    }
    for obligation in portfolio.kamino.data().into_iter().flatten() {
        println!(
            "kamino {}: deposited ${} borrowed ${} health {:?}",
            obligation.address,
            obligation.deposited_usd,
            obligation.borrowed_usd,
            obligation.health_factor
        );
    }
    for position in portfolio.drift.data().into_iter().flatten() {
        println!(
            "drift market {}: {} base, pnl {}",
            position.market_index,
            position.base_amount,
            position
                .unrealized_pnl
                .map_or_else(|| "n/a".to_owned(), |pnl| pnl.to_string())
        );
    }
    if let Some(staked) = portfolio.staked_sol() {
        println!("staked (mSOL in SOL): {staked}");
    }
    for (branch, kind) in portfolio.failures() {
        println!("{branch} unavailable: {kind}");
    }

    Ok(())
}
