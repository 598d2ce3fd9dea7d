use crate::core::kernel::ParamValue;
use crate::core::types::millis;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Declares a venue enumeration with its wire names.
///
/// The wire name is used by serde, by `Display` and when the value is rendered
/// into request parameters.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for ParamValue {
            fn from(value: $name) -> Self {
                Self::Text(value.as_str().to_string())
            }
        }
    };
}

wire_enum! {
    pub enum OrderStatus {
        New => "NEW",
        PartiallyFilled => "PARTIALLY_FILLED",
        Filled => "FILLED",
        #[serde(alias = "CANCELLED")]
        Canceled => "CANCELED",
        PendingCancel => "PENDING_CANCEL",
        Rejected => "REJECTED",
        Expired => "EXPIRED",
    }
}

wire_enum! {
    pub enum OrderType {
        Limit => "LIMIT",
        Market => "MARKET",
        StopLoss => "STOP_LOSS",
        StopLossLimit => "STOP_LOSS_LIMIT",
        TakeProfit => "TAKE_PROFIT",
        TakeProfitLimit => "TAKE_PROFIT_LIMIT",
        LimitMaker => "LIMIT_MAKER",
    }
}

wire_enum! {
    /// Amount of detail binance returns for a new order
    pub enum OrderResponseType {
        Ack => "ACK",
        Result => "RESULT",
        Full => "FULL",
    }
}

wire_enum! {
    pub enum OrderSide {
        Buy => "BUY",
        Sell => "SELL",
    }
}

wire_enum! {
    pub enum TimeInForce {
        GoodTilCanceled => "GTC",
        ImmediateOrCancel => "IOC",
        FillOrKill => "FOK",
    }
}

wire_enum! {
    /// Which side of the pair a market order quantity is denominated in
    pub enum QuantityAsset {
        Base => "BASE",
        Quote => "QUOTE",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInformation {
    #[serde(rename = "makerCommission")]
    pub maker_commission: i64,
    #[serde(rename = "takerCommission")]
    pub taker_commission: i64,
    #[serde(rename = "buyerCommission")]
    pub buyer_commission: i64,
    #[serde(rename = "sellerCommission")]
    pub seller_commission: i64,
    #[serde(rename = "canTrade")]
    pub can_trade: bool,
    #[serde(rename = "canWithdraw")]
    pub can_withdraw: bool,
    #[serde(rename = "canDeposit")]
    pub can_deposit: bool,
    #[serde(rename = "updateTime", with = "millis")]
    pub update_time: DateTime<Utc>,
    #[serde(rename = "accountType")]
    pub account_type: String,
    /// Balances keyed by asset
    #[serde(deserialize_with = "balances_by_asset")]
    pub balances: HashMap<String, Balance>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn balances_by_asset<'de, D>(deserializer: D) -> Result<HashMap<String, Balance>, D::Error>
where
    D: Deserializer<'de>,
{
    let balances = Vec::<Balance>::deserialize(deserializer)?;
    Ok(balances
        .into_iter()
        .map(|balance| (balance.asset.clone(), balance))
        .collect())
}

/// One execution reported with a FULL order response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Fill {
    pub price: Decimal,
    pub qty: Decimal,
    pub commission: Decimal,
    #[serde(rename = "commissionAsset")]
    pub commission_asset: String,
}

/// Response to a new order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpotOrderResult {
    pub symbol: String,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    #[serde(rename = "orderListId")]
    pub order_list_id: i64,
    #[serde(rename = "clientOrderId")]
    pub client_order_id: String,
    #[serde(rename = "transactTime", with = "millis")]
    pub transact_time: DateTime<Utc>,
    pub price: Decimal,
    #[serde(rename = "origQty")]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty")]
    pub executed_qty: Decimal,
    // "cummulative" is how the API spells it
    #[serde(rename = "cummulativeQuoteQty")]
    pub cumulative_quote_qty: Decimal,
    pub status: OrderStatus,
    #[serde(rename = "timeInForce")]
    pub time_in_force: TimeInForce,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: OrderSide,
    #[serde(default)]
    pub fills: Vec<Fill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CancelSpotOrderResult {
    pub symbol: String,
    #[serde(rename = "origClientOrderId")]
    pub orig_client_order_id: String,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    #[serde(rename = "orderListId")]
    pub order_list_id: i64,
    #[serde(rename = "clientOrderId")]
    pub client_order_id: String,
    pub price: Decimal,
    #[serde(rename = "origQty")]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty")]
    pub executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty")]
    pub cumulative_quote_qty: Decimal,
    pub status: OrderStatus,
    #[serde(rename = "timeInForce")]
    pub time_in_force: TimeInForce,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: OrderSide,
}

/// An order as returned by the order query and open orders endpoints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpotOrder {
    pub symbol: String,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    #[serde(rename = "orderListId")]
    pub order_list_id: i64,
    #[serde(rename = "clientOrderId")]
    pub client_order_id: String,
    pub price: Decimal,
    #[serde(rename = "origQty")]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty")]
    pub executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty")]
    pub cumulative_quote_qty: Decimal,
    pub status: OrderStatus,
    #[serde(rename = "timeInForce")]
    pub time_in_force: TimeInForce,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: OrderSide,
    #[serde(rename = "stopPrice", default)]
    pub stop_price: Decimal,
    #[serde(rename = "icebergQty", default)]
    pub iceberg_qty: Decimal,
    #[serde(with = "millis")]
    pub time: DateTime<Utc>,
    #[serde(rename = "updateTime", with = "millis")]
    pub update_time: DateTime<Utc>,
    #[serde(rename = "isWorking")]
    pub is_working: bool,
    #[serde(rename = "origQuoteOrderQty", default)]
    pub orig_quote_order_qty: Decimal,
}

// WebSocket Types
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E", with = "millis")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: i64,
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "q")]
    pub quantity: Decimal,
    #[serde(rename = "b")]
    pub buyer_order_id: i64,
    #[serde(rename = "a")]
    pub seller_order_id: i64,
    #[serde(rename = "T", with = "millis")]
    pub trade_time: DateTime<Utc>,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
    #[serde(rename = "M", default)]
    pub is_best_match: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ServerTime {
    #[serde(rename = "serverTime", with = "millis")]
    pub server_time: DateTime<Utc>,
}
