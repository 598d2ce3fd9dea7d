use crate::core::config::ExchangeConfig;
use crate::core::kernel::{RestClient, StreamClient};

pub(crate) const EXCHANGE_NAME: &str = "binance";

/// Typed client for the binance spot API.
///
/// Cheap to clone; clones share connections and credentials.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    pub(crate) rest: RestClient,
    pub(crate) streams: StreamClient,
    pub(crate) config: ExchangeConfig,
}

impl BinanceClient {
    pub fn new(rest: RestClient, streams: StreamClient, config: ExchangeConfig) -> Self {
        Self {
            rest,
            streams,
            config,
        }
    }

    pub const fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub const fn streams(&self) -> &StreamClient {
        &self.streams
    }

    pub const fn config(&self) -> &ExchangeConfig {
        &self.config
    }
}
