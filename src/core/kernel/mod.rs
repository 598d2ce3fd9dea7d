//! Kernel - venue-agnostic transport layer
//!
//! The kernel holds everything a typed endpoint needs to talk to the venue,
//! and nothing about any particular endpoint.
//!
//! # Architecture
//!
//! ## Parameters
//! - `ParamRecord`: flat records described by a static field table
//! - `ParameterSet`: sorted wire key/value pairs with deterministic encoding
//!
//! ## Authentication
//! - `Signer`: pluggable payload signer
//! - `HmacSigner`: HMAC-SHA256, lowercase hex
//!
//! ## Transport Layer
//! - `RestClient`: builds unsigned and signed requests, executes them once
//! - `HttpTransport`: one HTTP round trip (`ReqwestTransport` by default)
//! - `StreamClient` / `run_stream`: cancellable read pump feeding a channel
//! - `Dialer` / `FrameConnection`: socket seam (`TungsteniteDialer` by default)
//!
//! ## Message Handling
//! - `WsCodec`: frame to typed message decoding
//!
//! # Example
//!
//! ```rust,no_run
//! use lotusx_spot::core::kernel::*;
//! use reqwest::Method;
//! use secrecy::Secret;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), lotusx_spot::core::errors::ExchangeError> {
//! let config = RestClientConfig::new("https://api.binance.com".to_string(), "binance".to_string())
//!     .with_recv_window(Duration::from_secs(5));
//! let rest = RestClientBuilder::new(config)
//!     .with_api_key(Secret::new("api_key".to_string()))
//!     .with_signer(Arc::new(HmacSigner::new("secret_key".to_string())))
//!     .build()?;
//!
//! let request = rest.build_signed(Method::GET, "/api/v3/account", None)?;
//! let account: serde_json::Value = rest.execute(request).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod params;
pub mod rest;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use codec::WsCodec;
pub use params::{encode, ParamField, ParamRecord, ParamValue, ParameterSet, SKIP};
pub use rest::{
    Clock, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RestClient,
    RestClientBuilder, RestClientConfig,
};
pub use signer::{HmacSigner, Signer};
pub use ws::{
    run_stream, ChannelPublisher, Dialer, FrameConnection, FramePublisher, FrameResult, CLOSE_TIMEOUT,
    StreamClient, TungsteniteDialer,
};
