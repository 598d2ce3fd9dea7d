pub mod core;
pub mod exchanges;

pub use core::{
    config::ExchangeConfig,
    errors::{ExchangeError, HttpFailure},
    types::StreamEvent,
};
pub use exchanges::binance::{build_client, BinanceClient, BinanceClientBuilder};
