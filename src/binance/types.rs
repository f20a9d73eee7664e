use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub last_price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub filters: Vec<SymbolFilter>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    PriceFilter {
        min_price: Decimal,
        max_price: Decimal,
        tick_size: Decimal,
    },

    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        min_qty: Decimal,
        max_qty: Decimal,
        step_size: Decimal,
    },

    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub balances: Vec<AssetBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

/// Order lifecycle as reported by `/api/v3/order`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    PendingCancel,
    Rejected,
    Expired,
    Unknown(String),
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "NEW" => OrderStatus::New,
            "PARTIALLY_FILLED" => OrderStatus::PartiallyFilled,
            "FILLED" => OrderStatus::Filled,
            "CANCELED" => OrderStatus::Canceled,
            "PENDING_CANCEL" => OrderStatus::PendingCancel,
            "REJECTED" => OrderStatus::Rejected,
            "EXPIRED" | "EXPIRED_IN_MATCH" => OrderStatus::Expired,
            _ => OrderStatus::Unknown(s),
        }
    }
}

impl OrderStatus {
    /// The order can still trade.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::New | OrderStatus::PartiallyFilled | OrderStatus::PendingCancel
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::PendingCancel => "PENDING_CANCEL",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::Unknown(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: u64,
    #[serde(default)]
    pub client_order_id: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub orig_qty: Decimal,
    #[serde(default)]
    pub executed_qty: Decimal,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: OrderSide,
}

impl std::fmt::Display for OrderResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} #{} {} | qty {} | filled {}",
            self.side.as_str(),
            self.order_type.as_str(),
            self.order_id,
            self.status,
            self.orig_qty.normalize(),
            self.executed_qty.normalize()
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_exchange_info_filters() {
        let body = r#"{
            "timezone": "UTC",
            "symbols": [{
                "symbol": "ETHBTC",
                "status": "TRADING",
                "baseAsset": "ETH",
                "quoteAsset": "BTC",
                "filters": [
                    {"filterType": "PRICE_FILTER", "minPrice": "0.00001000", "maxPrice": "922327.00000000", "tickSize": "0.00001000"},
                    {"filterType": "LOT_SIZE", "minQty": "0.00010000", "maxQty": "100000.00000000", "stepSize": "0.00010000"},
                    {"filterType": "ICEBERG_PARTS", "limit": 10}
                ]
            }]
        }"#;

        let info: ExchangeInfo = serde_json::from_str(body).unwrap();
        let symbol = &info.symbols[0];
        assert_eq!(symbol.base_asset, "ETH");
        assert_eq!(symbol.filters.len(), 3);

        match &symbol.filters[1] {
            SymbolFilter::LotSize { min_qty, step_size, .. } => {
                assert_eq!(*min_qty, dec!(0.0001));
                assert_eq!(*step_size, dec!(0.0001));
            }
            other => panic!("expected LOT_SIZE, got {:?}", other),
        }
        assert!(matches!(symbol.filters[2], SymbolFilter::Other));
    }

    #[test]
    fn test_parse_account_balances() {
        let body = r#"{
            "makerCommission": 15, "canTrade": true,
            "balances": [
                {"asset": "BTC", "free": "4723846.89208129", "locked": "0.00000000"},
                {"asset": "LTC", "free": "4763368.68006011", "locked": "12.00000000"}
            ]
        }"#;

        let account: AccountInfo = serde_json::from_str(body).unwrap();
        assert_eq!(account.balances.len(), 2);
        assert_eq!(account.balances[1].asset, "LTC");
        assert_eq!(account.balances[1].free, dec!(4763368.68006011));
    }

    #[test]
    fn test_parse_order_response() {
        let body = r#"{
            "symbol": "ETHBTC", "orderId": 28, "orderListId": -1,
            "clientOrderId": "6gCrw2kRUAF9CvJDGP16IP", "transactTime": 1507725176595,
            "price": "0.05000000", "origQty": "4.00000000", "executedQty": "1.50000000",
            "cummulativeQuoteQty": "0.07500000", "status": "PARTIALLY_FILLED",
            "timeInForce": "GTC", "type": "LIMIT", "side": "BUY"
        }"#;

        let order: OrderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(order.order_id, 28);
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert!(order.status.is_open());
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.executed_qty, dec!(1.5));
        assert_eq!(order.to_string(), "BUY LIMIT #28 PARTIALLY_FILLED | qty 4 | filled 1.5");
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status = OrderStatus::from("SOMETHING_NEW".to_string());
        assert_eq!(status, OrderStatus::Unknown("SOMETHING_NEW".to_string()));
        assert!(!status.is_open());
        assert_eq!(OrderStatus::from("EXPIRED_IN_MATCH".to_string()), OrderStatus::Expired);
    }
}
