use super::client::BinanceClient;
use super::types::{AccountInformation, SpotOrder};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ParamField, ParamRecord};
use crate::core::types::duration_millis;
use reqwest::Method;
use std::time::Duration;
use tracing::instrument;

const ACCOUNT_ENDPOINT: &str = "/api/v3/account";
const ORDER_ENDPOINT: &str = "/api/v3/order";
const OPEN_ORDERS_ENDPOINT: &str = "/api/v3/openOrders";

/// Optional settings for the open orders query
#[derive(Debug, Clone, Default)]
pub struct OpenOrdersOptions {
    recv_window: Option<Duration>,
}

impl OpenOrdersOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn recv_window(mut self, recv_window: Duration) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

struct QueryOrderInput {
    symbol: String,
    order_id: i64,
    orig_client_order_id: String,
}

impl ParamRecord for QueryOrderInput {
    const FIELDS: &'static [ParamField<Self>] = &[
        ParamField::new("symbol", |o: &Self| (&o.symbol).into()),
        ParamField::omit_empty("orderId", |o: &Self| o.order_id.into()),
        ParamField::omit_empty("origClientOrderId", |o: &Self| (&o.orig_client_order_id).into()),
    ];
}

struct OpenOrdersInput {
    symbol: Option<String>,
    recv_window: u64,
}

impl ParamRecord for OpenOrdersInput {
    const FIELDS: &'static [ParamField<Self>] = &[
        ParamField::omit_empty("symbol", |o: &Self| o.symbol.as_ref().into()),
        ParamField::omit_empty("recvWindow", |o: &Self| o.recv_window.into()),
    ];
}

/// Account and order queries
impl BinanceClient {
    /// Current account information, including balances keyed by asset
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn account_information(&self) -> Result<AccountInformation, ExchangeError> {
        let request = self
            .rest
            .build_signed(Method::GET, ACCOUNT_ENDPOINT, None)?;
        self.rest.execute(request).await
    }

    #[instrument(skip(self), fields(exchange = "binance", symbol = %symbol))]
    pub async fn query_order_by_id(
        &self,
        symbol: &str,
        order_id: i64,
    ) -> Result<SpotOrder, ExchangeError> {
        self.query_order(QueryOrderInput {
            symbol: symbol.to_string(),
            order_id,
            orig_client_order_id: String::new(),
        })
        .await
    }

    #[instrument(skip(self), fields(exchange = "binance", symbol = %symbol))]
    pub async fn query_order_by_client_id(
        &self,
        symbol: &str,
        client_order_id: &str,
    ) -> Result<SpotOrder, ExchangeError> {
        self.query_order(QueryOrderInput {
            symbol: symbol.to_string(),
            order_id: 0,
            orig_client_order_id: client_order_id.to_string(),
        })
        .await
    }

    async fn query_order(&self, input: QueryOrderInput) -> Result<SpotOrder, ExchangeError> {
        let params = input.to_params()?;
        let request = self
            .rest
            .build_signed(Method::GET, ORDER_ENDPOINT, Some(params))?;
        self.rest.execute(request).await
    }

    /// Open orders on one symbol
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol))]
    pub async fn open_orders_for_symbol(
        &self,
        symbol: &str,
        options: OpenOrdersOptions,
    ) -> Result<Vec<SpotOrder>, ExchangeError> {
        self.open_orders(Some(symbol.to_string()), options).await
    }

    /// Open orders across every symbol.
    ///
    /// Binance weighs this call much heavier than the per-symbol query.
    #[instrument(skip(self, options), fields(exchange = "binance"))]
    pub async fn all_open_orders(
        &self,
        options: OpenOrdersOptions,
    ) -> Result<Vec<SpotOrder>, ExchangeError> {
        self.open_orders(None, options).await
    }

    async fn open_orders(
        &self,
        symbol: Option<String>,
        options: OpenOrdersOptions,
    ) -> Result<Vec<SpotOrder>, ExchangeError> {
        let input = OpenOrdersInput {
            symbol,
            recv_window: options.recv_window.map_or(0, duration_millis),
        };
        let params = input.to_params()?;
        let request = self
            .rest
            .build_signed(Method::GET, OPEN_ORDERS_ENDPOINT, Some(params))?;
        self.rest.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_by_client_id_params() {
        let input = QueryOrderInput {
            symbol: "LTCBTC".to_string(),
            order_id: 0,
            orig_client_order_id: "myOrder1".to_string(),
        };
        let params = input.to_params().unwrap();
        assert_eq!(params.encode(), "origClientOrderId=myOrder1&symbol=LTCBTC");
    }

    #[test]
    fn test_query_always_sends_symbol() {
        let input = QueryOrderInput {
            symbol: String::new(),
            order_id: 7,
            orig_client_order_id: String::new(),
        };
        let params = input.to_params().unwrap();
        assert_eq!(params.get("symbol"), Some(""));
        assert_eq!(params.get("orderId"), Some("7"));
    }

    #[test]
    fn test_all_open_orders_sends_nothing() {
        let input = OpenOrdersInput {
            symbol: None,
            recv_window: 0,
        };
        assert!(input.to_params().unwrap().is_empty());
    }

    #[test]
    fn test_open_orders_recv_window() {
        let input = OpenOrdersInput {
            symbol: Some("BNBBTC".to_string()),
            recv_window: duration_millis(Duration::from_secs(2)),
        };
        assert_eq!(input.to_params().unwrap().encode(), "recvWindow=2000&symbol=BNBBTC");
    }
}
