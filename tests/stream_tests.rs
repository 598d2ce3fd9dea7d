mod common;

use common::{stream_client, trade_frame, ScriptedDialer, Step};
use lotusx_spot::core::types::StreamEvent;
use lotusx_spot::exchanges::binance::TradeEvent;
use lotusx_spot::ExchangeError;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

async fn drain(mut trades: mpsc::Receiver<StreamEvent<TradeEvent>>) -> Vec<StreamEvent<TradeEvent>> {
    let mut events = Vec::new();
    while let Some(event) = timeout(Duration::from_secs(5), trades.recv())
        .await
        .expect("stream should close")
    {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_trades_dial_lowercased_symbol() {
    let dialer = ScriptedDialer::new(vec![Step::End]);
    let client = stream_client(dialer.clone());

    let events = drain(client.trades(&CancellationToken::new(), "BTCUSDT")).await;

    assert!(events.is_empty());
    assert_eq!(
        dialer.dialed()[0].as_str(),
        "wss://stream.binance.com:9443/ws/btcusdt@trade"
    );
}

#[tokio::test]
async fn test_frames_then_read_error() {
    let dialer = ScriptedDialer::new(vec![
        Step::Frame(trade_frame(1)),
        Step::Frame(trade_frame(2)),
        Step::Frame(trade_frame(3)),
        Step::Fail("connection reset by peer"),
    ]);
    let client = stream_client(dialer.clone());

    let events = drain(client.trades(&CancellationToken::new(), "BTCUSDT")).await;

    let ids: Vec<i64> = events
        .iter()
        .filter_map(StreamEvent::event)
        .map(|trade| trade.trade_id)
        .collect();
    assert_eq!(ids, [1, 2, 3]);
    assert_eq!(events.len(), 4);
    assert!(matches!(
        events.last(),
        Some(StreamEvent::Error(ExchangeError::NetworkError(_)))
    ));
    assert!(dialer.wait_closed().await);
}

#[tokio::test]
async fn test_dial_error_is_single_event() {
    let dialer = ScriptedDialer::failing("dns failure");
    let client = stream_client(dialer);

    let events = drain(client.trades(&CancellationToken::new(), "ETHBTC")).await;

    assert_eq!(events.len(), 1);
    assert!(events[0].is_error());
}

#[tokio::test]
async fn test_cancel_before_open_yields_nothing() {
    let dialer = ScriptedDialer::new(vec![Step::Frame(trade_frame(1)), Step::Frame(trade_frame(2))]);
    let client = stream_client(dialer);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let events = drain(client.trades(&cancel, "BTCUSDT")).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_cancel_mid_stream_ends_without_error() {
    let dialer = ScriptedDialer::new(vec![Step::Frame(trade_frame(10))]);
    let client = stream_client(dialer.clone());
    let cancel = CancellationToken::new();

    let mut trades = client.trades(&cancel, "BTCUSDT");
    let first = trades.recv().await.expect("one trade").into_result().unwrap();
    assert_eq!(first.trade_id, 10);

    cancel.cancel();
    let rest = drain(trades).await;
    assert!(rest.is_empty());

    assert!(dialer.wait_closed().await);
}

#[tokio::test]
async fn test_bad_frame_is_terminal() {
    let dialer = ScriptedDialer::new(vec![
        Step::Frame(trade_frame(1)),
        Step::Frame("{not json".to_string()),
        Step::Frame(trade_frame(2)),
    ]);
    let client = stream_client(dialer);

    let events = drain(client.trades(&CancellationToken::new(), "BTCUSDT")).await;

    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        StreamEvent::Error(ExchangeError::DeserializationError(msg)) if msg.starts_with("error decoding trade event")
    ));
}
