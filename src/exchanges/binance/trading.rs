use super::client::BinanceClient;
use super::types::{
    CancelSpotOrderResult, OrderResponseType, OrderSide, OrderType, QuantityAsset,
    SpotOrderResult, TimeInForce,
};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ParamField, ParamRecord};
use crate::core::types::duration_millis;
use reqwest::Method;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::instrument;

const ORDER_ENDPOINT: &str = "/api/v3/order";

/// Optional settings for a new order
#[derive(Debug, Clone, Default)]
pub struct SpotOrderOptions {
    client_order_id: Option<String>,
    recv_window: Option<Duration>,
}

impl SpotOrderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Own id for the order, unique among open orders
    #[must_use]
    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Override the client's default receive window for this order
    #[must_use]
    pub const fn recv_window(mut self, recv_window: Duration) -> Self {
        self.recv_window = Some(recv_window);
        self
    }
}

/// Optional settings for a cancel
#[derive(Debug, Clone, Default)]
pub struct CancelOrderOptions {
    new_client_order_id: Option<String>,
}

impl CancelOrderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id given to the cancel itself
    #[must_use]
    pub fn new_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.new_client_order_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SpotOrderInput {
    symbol: String,
    side: OrderSide,
    order_type: OrderType,
    time_in_force: Option<TimeInForce>,
    quantity: Option<Decimal>,
    quote_order_qty: Option<Decimal>,
    price: Option<Decimal>,
    stop_price: Option<Decimal>,
    new_client_order_id: Option<String>,
    new_order_resp_type: Option<OrderResponseType>,
    recv_window: u64,
}

impl SpotOrderInput {
    fn new(symbol: &str, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            order_type,
            time_in_force: None,
            quantity: None,
            quote_order_qty: None,
            price: None,
            stop_price: None,
            new_client_order_id: None,
            new_order_resp_type: None,
            recv_window: 0,
        }
    }

    fn apply(&mut self, options: SpotOrderOptions) {
        if let Some(id) = options.client_order_id {
            self.new_client_order_id = Some(id);
        }
        if let Some(recv_window) = options.recv_window {
            self.recv_window = duration_millis(recv_window);
        }
    }
}

impl ParamRecord for SpotOrderInput {
    const FIELDS: &'static [ParamField<Self>] = &[
        ParamField::omit_empty("symbol", |o: &Self| (&o.symbol).into()),
        ParamField::omit_empty("side", |o: &Self| o.side.into()),
        ParamField::omit_empty("type", |o: &Self| o.order_type.into()),
        ParamField::omit_empty("timeInForce", |o: &Self| o.time_in_force.into()),
        ParamField::omit_empty("quantity", |o: &Self| o.quantity.into()),
        ParamField::omit_empty("quoteOrderQty", |o: &Self| o.quote_order_qty.into()),
        ParamField::omit_empty("price", |o: &Self| o.price.into()),
        ParamField::omit_empty("newClientOrderId", |o: &Self| o.new_client_order_id.as_ref().into()),
        ParamField::omit_empty("stopPrice", |o: &Self| o.stop_price.into()),
        ParamField::omit_empty("newOrderRespType", |o: &Self| o.new_order_resp_type.into()),
        ParamField::omit_empty("recvWindow", |o: &Self| o.recv_window.into()),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CancelSpotOrderInput {
    symbol: String,
    order_id: i64,
    orig_client_order_id: String,
    new_client_order_id: Option<String>,
}

impl ParamRecord for CancelSpotOrderInput {
    const FIELDS: &'static [ParamField<Self>] = &[
        ParamField::omit_empty("symbol", |o: &Self| (&o.symbol).into()),
        ParamField::omit_empty("orderId", |o: &Self| o.order_id.into()),
        ParamField::omit_empty("origClientOrderId", |o: &Self| (&o.orig_client_order_id).into()),
        ParamField::omit_empty("newClientOrderId", |o: &Self| o.new_client_order_id.as_ref().into()),
    ];
}

/// Order placement and cancellation
impl BinanceClient {
    /// Place a limit order
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol, side = %side))]
    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
        options: SpotOrderOptions,
    ) -> Result<SpotOrderResult, ExchangeError> {
        let mut input = SpotOrderInput::new(symbol, side, OrderType::Limit);
        input.quantity = Some(quantity);
        input.price = Some(price);
        input.time_in_force = Some(time_in_force);
        self.place_order(input, options).await
    }

    /// Place a market order.
    ///
    /// `asset` selects whether `quantity` is an amount of the base asset to
    /// trade or an amount of the quote asset to spend or receive.
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol, side = %side))]
    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        asset: QuantityAsset,
        options: SpotOrderOptions,
    ) -> Result<SpotOrderResult, ExchangeError> {
        let mut input = SpotOrderInput::new(symbol, side, OrderType::Market);
        match asset {
            QuantityAsset::Base => input.quantity = Some(quantity),
            QuantityAsset::Quote => input.quote_order_qty = Some(quantity),
        }
        self.place_order(input, options).await
    }

    /// Place a stop loss order, executed as a market order once `stop_price` is reached
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol, side = %side))]
    pub async fn place_stop_loss_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
        options: SpotOrderOptions,
    ) -> Result<SpotOrderResult, ExchangeError> {
        let mut input = SpotOrderInput::new(symbol, side, OrderType::StopLoss);
        input.quantity = Some(quantity);
        input.stop_price = Some(stop_price);
        self.place_order(input, options).await
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol, side = %side))]
    pub async fn place_stop_loss_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
        time_in_force: TimeInForce,
        options: SpotOrderOptions,
    ) -> Result<SpotOrderResult, ExchangeError> {
        let mut input = SpotOrderInput::new(symbol, side, OrderType::StopLossLimit);
        input.quantity = Some(quantity);
        input.stop_price = Some(stop_price);
        input.price = Some(limit_price);
        input.time_in_force = Some(time_in_force);
        self.place_order(input, options).await
    }

    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol, side = %side))]
    pub async fn place_take_profit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
        options: SpotOrderOptions,
    ) -> Result<SpotOrderResult, ExchangeError> {
        let mut input = SpotOrderInput::new(symbol, side, OrderType::TakeProfit);
        input.quantity = Some(quantity);
        input.stop_price = Some(stop_price);
        self.place_order(input, options).await
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol, side = %side))]
    pub async fn place_take_profit_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
        time_in_force: TimeInForce,
        options: SpotOrderOptions,
    ) -> Result<SpotOrderResult, ExchangeError> {
        let mut input = SpotOrderInput::new(symbol, side, OrderType::TakeProfitLimit);
        input.quantity = Some(quantity);
        input.stop_price = Some(stop_price);
        input.price = Some(limit_price);
        input.time_in_force = Some(time_in_force);
        self.place_order(input, options).await
    }

    /// Place a limit order that is rejected if it would immediately match
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol, side = %side))]
    pub async fn place_limit_maker_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        options: SpotOrderOptions,
    ) -> Result<SpotOrderResult, ExchangeError> {
        let mut input = SpotOrderInput::new(symbol, side, OrderType::LimitMaker);
        input.quantity = Some(quantity);
        input.price = Some(price);
        self.place_order(input, options).await
    }

    async fn place_order(
        &self,
        mut input: SpotOrderInput,
        options: SpotOrderOptions,
    ) -> Result<SpotOrderResult, ExchangeError> {
        input.new_order_resp_type = Some(OrderResponseType::Full);
        input.apply(options);

        let params = input.to_params()?;
        let request = self
            .rest
            .build_signed(Method::POST, ORDER_ENDPOINT, Some(params))?;
        self.rest.execute(request).await
    }

    /// Cancel an open order by its exchange id
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol))]
    pub async fn cancel_order_by_order_id(
        &self,
        symbol: &str,
        order_id: i64,
        options: CancelOrderOptions,
    ) -> Result<CancelSpotOrderResult, ExchangeError> {
        self.cancel_order(CancelSpotOrderInput {
            symbol: symbol.to_string(),
            order_id,
            orig_client_order_id: String::new(),
            new_client_order_id: options.new_client_order_id,
        })
        .await
    }

    /// Cancel an open order by the client order id it was placed with
    #[instrument(skip(self, options), fields(exchange = "binance", symbol = %symbol, client_order_id = %client_order_id))]
    pub async fn cancel_order_by_client_order_id(
        &self,
        symbol: &str,
        client_order_id: &str,
        options: CancelOrderOptions,
    ) -> Result<CancelSpotOrderResult, ExchangeError> {
        self.cancel_order(CancelSpotOrderInput {
            symbol: symbol.to_string(),
            order_id: 0,
            orig_client_order_id: client_order_id.to_string(),
            new_client_order_id: options.new_client_order_id,
        })
        .await
    }

    async fn cancel_order(
        &self,
        input: CancelSpotOrderInput,
    ) -> Result<CancelSpotOrderResult, ExchangeError> {
        let params = input.to_params()?;
        let request = self
            .rest
            .build_signed(Method::DELETE, ORDER_ENDPOINT, Some(params))?;
        self.rest.execute(request).await
    }
}
