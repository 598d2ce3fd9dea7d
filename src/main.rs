use anyhow::Context;
use lotusx_spot::core::config::ExchangeConfig;
use lotusx_spot::{build_client, StreamEvent};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MAX_TRADES: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Credentials are optional; without them only public calls work
    let config = ExchangeConfig::from_env("BINANCE").unwrap_or_else(|_| ExchangeConfig::read_only());
    let symbol = std::env::args().nth(1).unwrap_or_else(|| "BTCUSDT".to_string());

    let binance = build_client(config).context("building binance client")?;

    binance.ping().await.context("pinging binance")?;
    let time = binance.server_time().await.context("fetching server time")?;
    info!("Binance server time: {}", time.server_time);

    if binance.config().has_credentials() {
        let account = binance
            .account_information()
            .await
            .context("fetching account information")?;
        for balance in account.balances.values().filter(|b| !b.free.is_zero() || !b.locked.is_zero()) {
            info!("{}: free {} locked {}", balance.asset, balance.free, balance.locked);
        }
    }

    let cancel = CancellationToken::new();
    let mut trades = binance.trades(&cancel, &symbol);
    let mut seen = 0;

    while let Some(event) = trades.recv().await {
        match event {
            StreamEvent::Event(trade) => {
                info!(
                    "{} trade {}: {} @ {} (buyer maker: {})",
                    trade.symbol, trade.trade_id, trade.quantity, trade.price, trade.is_buyer_maker
                );
                seen += 1;
                if seen == MAX_TRADES {
                    cancel.cancel();
                }
            }
            StreamEvent::Error(e) => warn!("Trade stream failed: {}", e),
        }
    }

    info!("Received {} trades", seen);
    Ok(())
}
