use std::time::Duration;

use clap::Parser;
use solsdk::{Config, Network, Sdk};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Solana network.
    #[arg(short, long, default_value = "mainnet")]
    network: Network,
    /// Per-probe timeout in milliseconds.
    #[arg(short, long, default_value_t = 5_000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = simple_logger::init_with_level(log::Level::Warn);
    let args = Cli::parse();

    let config = Config::new(args.network).with_timeout(Duration::from_millis(args.timeout_ms));
    let sdk = Sdk::new(config)?;

    let report = sdk.health_check().await;
    for (component, up) in &report.components {
        println!("{component:>12}: {}", if *up { "up" } else { "down" });
    }
    println!("overall: {:.0}%", report.overall * 100.0);

    Ok(())
}
