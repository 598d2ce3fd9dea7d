use super::types::TradeEvent;
use crate::core::errors::ExchangeError;
use crate::core::kernel::WsCodec;
use url::form_urlencoded::byte_serialize;

/// Decodes raw `@trade` stream frames
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeCodec;

impl WsCodec for TradeCodec {
    type Message = TradeEvent;

    fn decode_frame(&self, frame: &[u8]) -> Result<TradeEvent, ExchangeError> {
        serde_json::from_slice(frame).map_err(|e| {
            ExchangeError::DeserializationError(format!("error decoding trade event: {}", e))
        })
    }
}

/// Stream path for live trades of `symbol`.
///
/// The symbol is lowercased and percent-encoded as a single path segment.
pub fn trade_stream_path(symbol: &str) -> String {
    let symbol = symbol.to_lowercase();
    // form encoding writes spaces as '+', which a path would keep literally
    let escaped = byte_serialize(symbol.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("/ws/{}@trade", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_stream_path() {
        assert_eq!(trade_stream_path("BTCUSDT"), "/ws/btcusdt@trade");
    }

    #[test]
    fn test_trade_stream_path_escapes_symbol() {
        assert_eq!(trade_stream_path("BTC/USDT"), "/ws/btc%2Fusdt@trade");
        assert_eq!(trade_stream_path("a?b#c"), "/ws/a%3Fb%23c@trade");
        assert_eq!(trade_stream_path("bad sym"), "/ws/bad%20sym@trade");
        assert_eq!(trade_stream_path("ethbtc"), "/ws/ethbtc@trade");
    }

    #[test]
    fn test_decode_trade_frame() {
        let frame = br#"{"e":"trade","E":1604705434642,"s":"BTCUSDT","t":455634704,"p":"15617.99000000","q":"0.00720000","b":3530255770,"a":3530255647,"T":1604705434637,"m":false,"M":true}"#;
        let trade = TradeCodec.decode_frame(frame).unwrap();
        assert_eq!(trade.trade_id, 455_634_704);
        assert_eq!(trade.symbol, "BTCUSDT");
    }

    #[test]
    fn test_decode_failure() {
        let err = TradeCodec.decode_frame(b"{\"e\":\"trade\"").unwrap_err();
        assert!(
            matches!(err, ExchangeError::DeserializationError(msg) if msg.starts_with("error decoding trade event"))
        );
    }
}
