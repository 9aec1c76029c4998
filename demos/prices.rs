use clap::Parser;
use solsdk::{Pubkey, protocols::tokens};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Token symbol (SOL, USDC, JUP...) or mint address.
    #[arg(default_value = "SOL")]
    token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = simple_logger::init_with_level(log::Level::Info);
    let args = Cli::parse();

    let mint = match tokens::by_symbol(&args.token) {
        Some(token) => token.pubkey(),
        None => args.token.parse::<Pubkey>()?,
    };

    let sdk = solsdk::mainnet()?;
    let report = sdk.prices(&mint).await;
    for (source, price) in report.successes() {
        println!("{source:>10}: ${price}");
    }
    for (source, kind) in report.failures() {
        println!("{source:>10}: {kind}");
    }

    Ok(())
}
