use std::time::{Duration, Instant};

use rust_decimal::dec;
use serde_json::json;
use solsdk::{
    Config, ErrorKind, Network, Pubkey,
    protocols::{drift, jupiter, kamino, magiceden, marinade, privacy, pyth, solana, tokens, wormhole},
    units::Amount,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

const OWNER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

fn owner() -> Pubkey {
    OWNER.parse().unwrap()
}

fn config_for(server: &MockServer) -> Config {
    let url: url::Url = server.uri().parse().unwrap();
    let mut config = Config::new(Network::Mainnet)
        .with_rpc_url(url.clone())
        .with_timeout(Duration::from_secs(5));
    for name in [
        jupiter::NAME,
        pyth::NAME,
        kamino::NAME,
        marinade::NAME,
        drift::NAME,
        magiceden::NAME,
        wormhole::NAME,
        privacy::NAME,
    ] {
        config = config.with_endpoint(name, url.clone());
    }
    config
}

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
}

#[tokio::test]
async fn test_solana_balance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "getBalance", "params": [OWNER] })))
        .respond_with(rpc_result(json!({ "context": { "slot": 1 }, "value": 1_500_000_000u64 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = solana::Client::new(&config_for(&server)).unwrap();
    let balance = client.balance(&owner()).await.unwrap();
    assert_eq!(balance.raw(), 1_500_000_000);
    assert_eq!(balance.display(), dec!(1.5));
}

#[tokio::test]
async fn test_solana_token_accounts_skip_empty() {
    let server = MockServer::start().await;
    let account = |mint: &str, amount: &str, decimals: u32| {
        json!({
            "pubkey": "BnNuzKkwUxhgvtrwKJa7WPVAP4NE1qC5QHoYhdeuhs2K",
            "account": {
                "data": {
                    "parsed": {
                        "info": {
                            "mint": mint,
                            "owner": OWNER,
                            "tokenAmount": { "amount": amount, "decimals": decimals }
                        },
                        "type": "account"
                    },
                    "program": "spl-token"
                },
                "lamports": 2039280
            }
        })
    };
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getTokenAccountsByOwner" })))
        .respond_with(rpc_result(json!({
            "context": { "slot": 1 },
            "value": [
                account(tokens::USDC.mint, "98996405", 6),
                account(tokens::BONK.mint, "0", 5),
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = solana::Client::new(&config_for(&server)).unwrap();
    let balances = client.token_accounts(&owner()).await.unwrap();

    // one non-empty account per token program
    assert_eq!(balances.len(), 2);
    assert!(balances.iter().all(|b| b.mint == tokens::USDC.pubkey()));
    assert_eq!(balances[0].amount.display(), dec!(98.996405));
    assert_eq!(balances[0].program, solana::TokenProgram::Token);
    assert_eq!(balances[1].program, solana::TokenProgram::Token2022);
}

#[tokio::test]
async fn test_solana_token_account_bad_decimals_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getTokenAccountsByOwner" })))
        .respond_with(rpc_result(json!({
            "context": { "slot": 1 },
            "value": [{
                "pubkey": "BnNuzKkwUxhgvtrwKJa7WPVAP4NE1qC5QHoYhdeuhs2K",
                "account": {
                    "data": {
                        "parsed": {
                            "info": {
                                "mint": tokens::USDC.mint,
                                "owner": OWNER,
                                "tokenAmount": { "amount": "1", "decimals": 40 }
                            },
                            "type": "account"
                        },
                        "program": "spl-token"
                    },
                    "lamports": 2039280
                }
            }]
        })))
        .mount(&server)
        .await;

    let client = solana::Client::new(&config_for(&server)).unwrap();
    let err = client.token_accounts(&owner()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.operation(), "solana.token_accounts");
}

#[tokio::test]
async fn test_solana_rpc_error_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid param: WrongSize" }
        })))
        .mount(&server)
        .await;

    let client = solana::Client::new(&config_for(&server)).unwrap();
    let err = client.mint_decimals(&tokens::USDC.pubkey()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.operation(), "solana.mint_decimals");
    assert_eq!(err.message(), "Invalid param: WrongSize");
}

#[tokio::test]
async fn test_jupiter_quote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/swap/v1/quote"))
        .and(header("x-api-key", "secret"))
        .and(query_param("inputMint", tokens::SOL.mint))
        .and(query_param("outputMint", tokens::USDC.mint))
        .and(query_param("amount", "1500000000"))
        .and(query_param("slippageBps", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inputMint": tokens::SOL.mint,
            "inAmount": "1500000000",
            "outputMint": tokens::USDC.mint,
            "outAmount": "217845000",
            "otherAmountThreshold": "216755775",
            "swapMode": "ExactIn",
            "slippageBps": 50,
            "priceImpactPct": "0.0001",
            "routePlan": [
                { "swapInfo": { "ammKey": "x", "label": "Whirlpool" }, "percent": 100 }
            ],
            "contextSlot": 300000000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).with_api_key(jupiter::NAME, "secret");
    let client = jupiter::Client::new(&config).unwrap();
    let quote = client
        .quote(&jupiter::QuoteParams {
            input_mint: tokens::SOL.pubkey(),
            output_mint: tokens::USDC.pubkey(),
            amount: Amount::from_display(dec!(1.5), 9).unwrap(),
            output_decimals: 6,
            slippage_bps: None,
            only_direct_routes: false,
        })
        .await
        .unwrap();

    assert_eq!(quote.in_amount.display(), dec!(1.5));
    assert_eq!(quote.out_amount.display(), dec!(217.845));
    assert_eq!(quote.min_out_amount.raw(), 216_755_775);
    assert_eq!(quote.price_impact, dec!(0.0001));
    assert_eq!(quote.route, ["Whirlpool"]);
}

#[tokio::test]
async fn test_jupiter_invalid_quote_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = jupiter::Client::new(&config_for(&server)).unwrap();
    let err = client
        .quote(&jupiter::QuoteParams {
            input_mint: tokens::SOL.pubkey(),
            output_mint: tokens::USDC.pubkey(),
            amount: Amount::lamports(1),
            output_decimals: 6,
            slippage_bps: Some(20_000),
            only_direct_routes: false,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_jupiter_status_classification() {
    let server = MockServer::start().await;
    Mock::given(path("/swap/v1/quote"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Could not find any route",
            "errorCode": "COULD_NOT_FIND_ANY_ROUTE"
        })))
        .mount(&server)
        .await;
    Mock::given(path("/price/v3"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&server)
        .await;

    let client = jupiter::Client::new(&config_for(&server)).unwrap();
    let err = client
        .quote(&jupiter::QuoteParams {
            input_mint: tokens::SOL.pubkey(),
            output_mint: tokens::BONK.pubkey(),
            amount: Amount::lamports(1_000),
            output_decimals: 5,
            slippage_bps: Some(100),
            only_direct_routes: true,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.message(), "Could not find any route");

    let err = client.price(&tokens::SOL.pubkey()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.message(), "Too Many Requests");
}

#[tokio::test]
async fn test_jupiter_missing_price_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(path("/price/v3"))
        .and(query_param("ids", tokens::BONK.mint))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = jupiter::Client::new(&config_for(&server)).unwrap();
    let err = client.price(&tokens::BONK.pubkey()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.operation(), "jupiter.price");
}

#[tokio::test]
async fn test_malformed_body_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(path("/msol/price_sol"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = marinade::Client::new(&config_for(&server)).unwrap();
    let err = client.msol_price().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(path("/msol/price_sol"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/msol/price_sol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1.2803)))
        .expect(1)
        .mount(&server)
        .await;

    let client = marinade::Client::new(&config_for(&server).with_retries(1)).unwrap();
    assert_eq!(client.msol_price().await.unwrap(), dec!(1.2803));
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let server = MockServer::start().await;
    Mock::given(path("/msol/price_sol"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = marinade::Client::new(&config_for(&server)).unwrap();
    let err = client.msol_price().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_timeout_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(path("/msol/price_sol"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(1.28))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).with_timeout(Duration::from_millis(200));
    let client = marinade::Client::new(&config).unwrap();
    let started = Instant::now();
    let err = client.msol_price().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_marinade_stats() {
    let server = MockServer::start().await;
    Mock::given(path("/msol/price_sol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1.2803)))
        .mount(&server)
        .await;
    Mock::given(path("/msol/apy/30d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": 0.0712,
            "start_time": "2025-01-01T00:00:00Z",
            "end_time": "2025-01-31T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = marinade::Client::new(&config_for(&server)).unwrap();
    let stats = client.stats().await.unwrap();
    assert_eq!(stats.msol_price, dec!(1.2803));
    assert_eq!(stats.apy.value, dec!(0.0712));
}

#[tokio::test]
async fn test_pyth_latest_price() {
    let server = MockServer::start().await;
    Mock::given(path("/v2/updates/price/latest"))
        .and(query_param("ids[]", pyth::SOL_USD))
        .and(query_param("parsed", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "binary": { "encoding": "hex", "data": [] },
            "parsed": [{
                "id": pyth::SOL_USD,
                "price": { "price": "14523000000", "conf": "7150000", "expo": -8, "publish_time": 1700000000 },
                "ema_price": { "price": "14498000000", "conf": "7000000", "expo": -8, "publish_time": 1700000000 },
                "metadata": { "slot": 1 }
            }]
        })))
        .mount(&server)
        .await;

    let client = pyth::Client::new(&config_for(&server)).unwrap();
    let price = client
        .latest_price(&format!("0x{}", pyth::SOL_USD))
        .await
        .unwrap();
    assert_eq!(price.price, dec!(145.23));
    assert_eq!(price.confidence, dec!(0.0715));
    assert_eq!(price.ema_price, Some(dec!(144.98)));
    assert_eq!(price.publish_time.timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_pyth_unknown_feed_is_not_found() {
    let unknown = "00".repeat(32);
    let server = MockServer::start().await;
    Mock::given(path("/v2/updates/price/latest"))
        .and(query_param("ids[]", unknown.as_str()))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(format!("Price ids not found: {unknown}")),
        )
        .mount(&server)
        .await;

    let client = pyth::Client::new(&config_for(&server)).unwrap();
    let err = client.latest_price(&unknown).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.operation(), "pyth.latest_price");
    assert!(err.message().contains("Price ids not found"));
}

#[tokio::test]
async fn test_pyth_malformed_feed_id_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(path("/v2/updates/price/latest"))
        .respond_with(ResponseTemplate::new(400))
        .expect(0)
        .mount(&server)
        .await;

    let client = pyth::Client::new(&config_for(&server)).unwrap();
    let err = client.latest_price("abcd").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = client
        .latest_prices(&[pyth::SOL_USD, "0xnot-a-feed"])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_pyth_search_feeds() {
    let server = MockServer::start().await;
    Mock::given(path("/v2/price_feeds"))
        .and(query_param("query", "sol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": pyth::SOL_USD,
            "attributes": {
                "asset_type": "Crypto",
                "base": "SOL",
                "description": "SOLANA / US DOLLAR",
                "symbol": "Crypto.SOL/USD"
            }
        }])))
        .mount(&server)
        .await;

    let client = pyth::Client::new(&config_for(&server)).unwrap();
    let feeds = client.search_feeds("sol").await.unwrap();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].symbol.as_deref(), Some("Crypto.SOL/USD"));
}

#[tokio::test]
async fn test_kamino_reserves_and_obligations() {
    let server = MockServer::start().await;
    Mock::given(path(format!("/kamino-market/{}/reserves/metrics", kamino::MAIN_MARKET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "reserve": "BnNuzKkwUxhgvtrwKJa7WPVAP4NE1qC5QHoYhdeuhs2K",
            "liquidityToken": "SOL",
            "liquidityTokenMint": tokens::SOL.mint,
            "maxLtv": "0.74",
            "borrowApy": "0.0611",
            "supplyApy": "0.0453",
            "totalSupply": "2800000.5",
            "totalBorrow": "2100000",
            "totalBorrowUsd": "304500000",
            "totalSupplyUsd": "406000072.5"
        }])))
        .mount(&server)
        .await;
    Mock::given(path(format!(
        "/kamino-market/{}/users/{OWNER}/obligations",
        kamino::MAIN_MARKET
    )))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
        "obligationAddress": "BnNuzKkwUxhgvtrwKJa7WPVAP4NE1qC5QHoYhdeuhs2K",
        "refreshedStats": {
            "userTotalDeposit": "1000",
            "userTotalBorrow": "400",
            "netAccountValue": "600",
            "loanToValue": "0.4",
            "liquidationLtv": "0.8"
        }
    }])))
    .mount(&server)
    .await;

    let client = kamino::Client::new(&config_for(&server)).unwrap();
    let reserves = client.reserves(None).await.unwrap();
    assert_eq!(reserves[0].symbol, "SOL");
    assert_eq!(reserves[0].max_ltv, dec!(0.74));

    let obligations = client.obligations(&owner(), None).await.unwrap();
    assert_eq!(obligations[0].health_factor, Some(dec!(2)));
    assert_eq!(obligations[0].borrowed_usd, dec!(400));
}

#[tokio::test]
async fn test_kamino_obligation_missing_stats_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(path(format!(
        "/kamino-market/{}/users/{OWNER}/obligations",
        kamino::MAIN_MARKET
    )))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
        "obligationAddress": "BnNuzKkwUxhgvtrwKJa7WPVAP4NE1qC5QHoYhdeuhs2K",
        "refreshedStats": { "userTotalDeposit": "1000" }
    }])))
    .mount(&server)
    .await;

    let client = kamino::Client::new(&config_for(&server)).unwrap();
    let err = client.obligations(&owner(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
}

#[tokio::test]
async fn test_drift_positions_for_sub_account() {
    let server = MockServer::start().await;
    Mock::given(path(format!("/user/{OWNER}/positions")))
        .and(query_param("subAccountId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "positions": [
                {
                    "marketIndex": 0,
                    "subAccountId": 1,
                    "baseAssetAmount": "-2000000000",
                    "quoteEntryAmount": "290000000",
                    "unrealizedPnl": "-1500000",
                    "settledPnl": "250000"
                },
                {
                    "marketIndex": 1,
                    "subAccountId": 0,
                    "baseAssetAmount": "100000000",
                    "quoteEntryAmount": "-6000000000"
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = drift::Client::new(&config_for(&server)).unwrap();
    let positions = client.positions(&owner(), Some(1)).await.unwrap();
    assert_eq!(positions.len(), 1);
    assert!(positions[0].is_short());
    assert_eq!(positions[0].base_amount.display(), dec!(-2));
    assert_eq!(
        positions[0].unrealized_pnl.map(|pnl| pnl.display()),
        Some(dec!(-1.5))
    );
}

#[tokio::test]
async fn test_drift_position_without_pnl_is_unknown_not_zero() {
    let server = MockServer::start().await;
    Mock::given(path(format!("/user/{OWNER}/positions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "positions": [{
                "marketIndex": 2,
                "baseAssetAmount": "1000000000",
                "quoteEntryAmount": "-145000000"
            }]
        })))
        .mount(&server)
        .await;

    let client = drift::Client::new(&config_for(&server)).unwrap();
    let positions = client.positions(&owner(), None).await.unwrap();
    assert_eq!(positions[0].unrealized_pnl, None);
    assert_eq!(positions[0].settled_pnl, None);
}

#[tokio::test]
async fn test_drift_out_of_range_amount_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(path(format!("/user/{OWNER}/positions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "positions": [{
                "marketIndex": 0,
                "baseAssetAmount": i128::MAX.to_string(),
                "quoteEntryAmount": "0"
            }]
        })))
        .mount(&server)
        .await;

    let client = drift::Client::new(&config_for(&server)).unwrap();
    let err = client.positions(&owner(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.operation(), "drift.positions");
}

#[tokio::test]
async fn test_magiceden_listings_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(path("/v2/collections/okay_bears/listings"))
        .and(header("authorization", "Bearer me-key"))
        .and(query_param("offset", "40"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "pdaAddress": "4Zdsq6jDKJdYd6d53rrS6hCaGVmTDcw3pxC2T43KHqZ5",
            "auctionHouse": "",
            "tokenAddress": "6Y5YaxRPvK6Qj7Y9kquVn9hS5dsVbYdVdMeVjZx9jcbs",
            "tokenMint": tokens::JUP.mint,
            "seller": OWNER,
            "tokenSize": 1,
            "price": 12.75
        }])))
        .mount(&server)
        .await;

    let config = config_for(&server).with_api_key(magiceden::NAME, "me-key");
    let client = magiceden::Client::new(&config).unwrap();
    let page = magiceden::Page {
        offset: 40,
        limit: None,
    };
    let listings = client.listings("okay_bears", page).await.unwrap();
    assert_eq!(listings[0].price, Amount::lamports(12_750_000_000));
    assert_eq!(listings[0].seller, owner());
}

#[tokio::test]
async fn test_magiceden_negative_listing_price_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(path("/v2/collections/okay_bears/listings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "pdaAddress": "4Zdsq6jDKJdYd6d53rrS6hCaGVmTDcw3pxC2T43KHqZ5",
            "tokenMint": tokens::JUP.mint,
            "seller": OWNER,
            "price": -1.5
        }])))
        .mount(&server)
        .await;

    let client = magiceden::Client::new(&config_for(&server)).unwrap();
    let err = client
        .listings("okay_bears", magiceden::Page::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.operation(), "magiceden.listings");
}

#[tokio::test]
async fn test_magiceden_unknown_collection() {
    let server = MockServer::start().await;
    Mock::given(path("/v2/collections/nope/stats"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "msg": "collection not found" })))
        .mount(&server)
        .await;

    let client = magiceden::Client::new(&config_for(&server)).unwrap();
    let err = client.collection_stats("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "collection not found");
}

#[tokio::test]
async fn test_wormhole_operations() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/operations"))
        .and(query_param("txHash", "5abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "operations": [{
                "id": "1/ec73/42",
                "emitterChain": 1,
                "emitterAddress": { "hex": "ec73", "native": "wormDTUJ6AWPNvk59vGQbDvGJmqbDTdgWgAqcLBCgUb" },
                "sequence": "42",
                "sourceChain": { "chainId": 1, "status": "confirmed" },
                "targetChain": { "chainId": 2, "status": "completed", "transaction": { "txHash": "0xdef" } }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/operations"))
        .and(query_param("txHash", "missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "operations": [] })))
        .mount(&server)
        .await;

    let client = wormhole::Client::new(&config_for(&server)).unwrap();
    let ops = client.operations("5abc").await.unwrap();
    assert_eq!(ops[0].sequence, 42);
    assert!(ops[0].redeemed);

    let err = client.operations("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_wormhole_vaa() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/vaas/1/ec73/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "1/ec73/42",
                "sequence": 42,
                "vaa": "AQAAAAQNAL1qji7v9KP==",
                "timestamp": "2025-02-01T12:00:00Z",
                "txHash": "5abc"
            }
        })))
        .mount(&server)
        .await;

    let client = wormhole::Client::new(&config_for(&server)).unwrap();
    let vaa = client.vaa(1, "ec73", 42).await.unwrap();
    assert_eq!(vaa.vaa, "AQAAAAQNAL1qji7v9KP==");
    assert_eq!(vaa.tx_hash.as_deref(), Some("5abc"));
}

fn relayer_config(fee_bps: u16) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "relayerAddress": OWNER,
        "feeBps": fee_bps,
        "minimumFee": "5000000",
        "supportedMints": [tokens::USDC.mint]
    }))
}

#[tokio::test]
async fn test_privacy_session_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(relayer_config(35))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(relayer_config(50))
        .mount(&server)
        .await;

    let client = privacy::Client::new(&config_for(&server)).unwrap();
    let params = privacy::WithdrawParams {
        amount: Amount::lamports(10_000_000_000),
        mint: None,
    };
    assert_eq!(
        client.quote_withdraw(&params).await.unwrap_err().kind(),
        ErrorKind::InvalidState
    );

    client.initialize().await.unwrap();
    let quote = client.quote_withdraw(&params).await.unwrap();
    assert_eq!(quote.fee.raw(), 35_000_000);
    assert_eq!(quote.receive.raw(), 9_965_000_000);

    // failed refresh keeps the previous parameters
    let err = client.initialize().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(client.quote_withdraw(&params).await.unwrap().fee.raw(), 35_000_000);

    client.initialize().await.unwrap();
    assert_eq!(client.quote_withdraw(&params).await.unwrap().fee.raw(), 50_000_000);
}

#[tokio::test]
async fn test_privacy_quote_rejections() {
    let server = MockServer::start().await;
    Mock::given(path("/config"))
        .respond_with(relayer_config(35))
        .mount(&server)
        .await;

    let client = privacy::Client::new(&config_for(&server)).unwrap();
    client.initialize().await.unwrap();

    let err = client
        .quote_withdraw(&privacy::WithdrawParams {
            amount: Amount::new(1_000_000_000, 5).unwrap(),
            mint: Some(tokens::BONK.pubkey()),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // below the 0.005 SOL floor
    let err = client
        .quote_withdraw(&privacy::WithdrawParams {
            amount: Amount::lamports(5_000_000),
            mint: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let quote = client
        .quote_withdraw(&privacy::WithdrawParams {
            amount: Amount::new(100_000_000, 6).unwrap(),
            mint: Some(tokens::USDC.pubkey()),
        })
        .await
        .unwrap();
    assert_eq!(quote.fee.raw(), 350_000);
    assert_eq!(quote.receive.display(), dec!(99.65));

    // native SOL must be quoted in lamports
    let err = client
        .quote_withdraw(&privacy::WithdrawParams {
            amount: Amount::new(100_000_000, 6).unwrap(),
            mint: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_privacy_spl_withdrawal_pays_proportional_fee() {
    let server = MockServer::start().await;
    Mock::given(path("/config"))
        .respond_with(relayer_config(35))
        .mount(&server)
        .await;

    let client = privacy::Client::new(&config_for(&server)).unwrap();
    client.initialize().await.unwrap();

    // 10 USDC is below the lamport floor's face value but owes 0.35% only
    let quote = client
        .quote_withdraw(&privacy::WithdrawParams {
            amount: Amount::new(10_000_000, 6).unwrap(),
            mint: Some(tokens::USDC.pubkey()),
        })
        .await
        .unwrap();
    assert_eq!(quote.fee.raw(), 35_000);
    assert_eq!(quote.fee.display(), dec!(0.035));
    assert_eq!(quote.receive.display(), dec!(9.965));
}

#[tokio::test]
async fn test_privacy_shielded_balance_bad_decimals_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(path("/config"))
        .respond_with(relayer_config(35))
        .mount(&server)
        .await;
    Mock::given(path(format!("/balance/{OWNER}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "amount": "1000",
            "decimals": 255
        })))
        .mount(&server)
        .await;

    let client = privacy::Client::new(&config_for(&server)).unwrap();
    client.initialize().await.unwrap();
    let err = client.shielded_balance(&owner()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.operation(), "privacy.shielded_balance");
}

#[tokio::test]
async fn test_privacy_account_single_flight() {
    let server = MockServer::start().await;
    Mock::given(path("/config"))
        .respond_with(relayer_config(35))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts"))
        .and(body_partial_json(json!({ "network": "devnet", "identity": OWNER })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "accountId": "acc-1",
                    "address": "BnNuzKkwUxhgvtrwKJa7WPVAP4NE1qC5QHoYhdeuhs2K",
                    "createdAt": "2025-03-01T00:00:00Z"
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = privacy::Client::new(&config_for(&server)).unwrap();
    client.initialize().await.unwrap();

    let identity = owner();
    let (a, b, c) = tokio::join!(
        client.account(Network::Devnet, &identity),
        client.account(Network::Devnet, &identity),
        client.account(Network::Devnet, &identity),
    );
    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(a.id, "acc-1");

    // served from cache
    assert_eq!(client.account(Network::Devnet, &identity).await.unwrap(), a);
}
