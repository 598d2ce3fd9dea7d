//! Binance spot API.
//!
//! Endpoints are grouped the same way as the venue documents them:
//! `account` (account and order queries), `trading` (placing and cancelling
//! orders) and `market_data` (connectivity checks and trade streams). All of
//! them hang off [`BinanceClient`], created through [`BinanceClientBuilder`].

pub mod account;
pub mod builder;
pub mod client;
pub mod codec;
pub mod market_data;
pub mod trading;
pub mod types;

// Re-export main types for easier importing
pub use account::OpenOrdersOptions;
pub use builder::{build_client, BinanceClientBuilder};
pub use client::BinanceClient;
pub use codec::TradeCodec;
pub use trading::{CancelOrderOptions, SpotOrderOptions};
pub use types::{
    AccountInformation, Balance, CancelSpotOrderResult, Fill, OrderResponseType, OrderSide,
    OrderStatus, OrderType, QuantityAsset, ServerTime, SpotOrder, SpotOrderResult, TimeInForce,
    TradeEvent,
};
