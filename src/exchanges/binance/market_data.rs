use super::client::BinanceClient;
use super::codec::{trade_stream_path, TradeCodec};
use super::types::{ServerTime, TradeEvent};
use crate::core::errors::ExchangeError;
use crate::core::kernel::ParameterSet;
use crate::core::types::StreamEvent;
use reqwest::Method;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

const PING_ENDPOINT: &str = "/api/v3/ping";
const TIME_ENDPOINT: &str = "/api/v3/time";

/// Connectivity checks and market streams
impl BinanceClient {
    /// Test connectivity to the REST API
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn ping(&self) -> Result<(), ExchangeError> {
        let request = self
            .rest
            .build_unsigned(Method::GET, PING_ENDPOINT, &ParameterSet::new(), false)?;
        self.rest.execute_empty(request).await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn server_time(&self) -> Result<ServerTime, ExchangeError> {
        let request = self
            .rest
            .build_unsigned(Method::GET, TIME_ENDPOINT, &ParameterSet::new(), false)?;
        self.rest.execute(request).await
    }

    /// Stream live trades for `symbol`.
    ///
    /// Events arrive in the order binance sent them. The channel closes when
    /// `cancel` fires or the stream fails; a failure is delivered as the last
    /// item. Must be called inside a tokio runtime.
    #[instrument(skip(self, cancel), fields(exchange = "binance", symbol = %symbol))]
    pub fn trades(
        &self,
        cancel: &CancellationToken,
        symbol: &str,
    ) -> mpsc::Receiver<StreamEvent<TradeEvent>> {
        match self
            .streams
            .open(cancel, &trade_stream_path(symbol), TradeCodec)
        {
            Ok(receiver) => receiver,
            Err(e) => {
                let (sender, receiver) = mpsc::channel(1);
                // capacity is one and nothing else has sent, so this cannot fail
                let _ = sender.try_send(StreamEvent::Error(e));
                receiver
            }
        }
    }
}
