use async_trait::async_trait;
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::binance::auth::BinanceAuth;
use crate::binance::error::BinanceError;
use crate::binance::types::*;
use crate::sizing::MarketRules;

pub const DEFAULT_REST_URL: &str = "https://api.binance.com";

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub qty: Decimal,
    /// Required for limit orders, ignored for market orders
    pub price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(symbol: &str, side: OrderSide, qty: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Market,
            qty,
            price: None,
        }
    }

    pub fn limit(symbol: &str, side: OrderSide, qty: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Limit,
            qty,
            price: Some(price),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", self.symbol.clone()),
            ("side", self.side.as_str().to_string()),
            ("type", self.order_type.as_str().to_string()),
            ("quantity", self.qty.normalize().to_string()),
            ("newOrderRespType", "RESULT".to_string()),
        ];

        if self.order_type == OrderType::Limit {
            if let Some(price) = self.price {
                params.push(("price", price.normalize().to_string()));
            }
            params.push(("timeInForce", "GTC".to_string()));
        }

        params
    }
}

/// Everything the trader needs from an exchange.
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn last_price(&self, symbol: &str) -> Result<Decimal, BinanceError>;

    async fn free_balance(&self, asset: &str) -> Result<Decimal, BinanceError>;

    async fn market_rules(&self, symbol: &str) -> Result<MarketRules, BinanceError>;

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderResponse, BinanceError>;

    async fn order_status(&self, symbol: &str, order_id: u64) -> Result<OrderResponse, BinanceError>;

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<OrderResponse, BinanceError>;
}

pub struct BinanceClient {
    client: Client,
    auth: Option<BinanceAuth>,
    rest_url: String,
    recv_window: u64,
}

impl BinanceClient {
    pub fn new(rest_url: String, auth: Option<BinanceAuth>, recv_window: u64) -> Result<Self, BinanceError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()?,
            auth,
            rest_url: rest_url.trim_end_matches('/').to_string(),
            recv_window,
        })
    }

    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BinanceError> {
        let url = format!("{}{}", self.rest_url, path);
        debug!("GET {}", path);

        let response = self.client.get(&url).query(params).send().await?;
        decode(response).await
    }

    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, BinanceError> {
        let auth = self
            .auth
            .as_ref()
            .ok_or(BinanceError::MissingCredentials(path))?;

        let query = auth.sign_query(params, BinanceAuth::get_timestamp(), self.recv_window);
        let url = format!("{}{}?{}", self.rest_url, path, query);
        debug!("{} {}", method, path);

        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", auth.get_api_key())
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BinanceError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => BinanceError::Api {
                status: status.as_u16(),
                code: err.code,
                msg: err.msg,
            },
            Err(_) => BinanceError::Api {
                status: status.as_u16(),
                code: 0,
                msg: body,
            },
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl Exchange for BinanceClient {
    async fn last_price(&self, symbol: &str) -> Result<Decimal, BinanceError> {
        let ticker: Ticker24h = self
            .public_get("/api/v3/ticker/24hr", &[("symbol", symbol.to_string())])
            .await?;
        Ok(ticker.last_price.round_dp(8))
    }

    async fn free_balance(&self, asset: &str) -> Result<Decimal, BinanceError> {
        let account: AccountInfo = self.signed(Method::GET, "/api/v3/account", &[]).await?;

        // Binance omits assets the account has never held
        Ok(account
            .balances
            .iter()
            .find(|b| b.asset == asset)
            .map(|b| b.free.round_dp(8))
            .unwrap_or(Decimal::ZERO))
    }

    async fn market_rules(&self, symbol: &str) -> Result<MarketRules, BinanceError> {
        let info: ExchangeInfo = self
            .public_get("/api/v3/exchangeInfo", &[("symbol", symbol.to_string())])
            .await?;

        let symbol_info = info
            .symbols
            .iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| BinanceError::UnknownSymbol(symbol.to_string()))?;

        MarketRules::from_symbol(symbol_info)
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderResponse, BinanceError> {
        self.signed(Method::POST, "/api/v3/order", &request.params()).await
    }

    async fn order_status(&self, symbol: &str, order_id: u64) -> Result<OrderResponse, BinanceError> {
        let params = [("symbol", symbol.to_string()), ("orderId", order_id.to_string())];
        self.signed(Method::GET, "/api/v3/order", &params).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<OrderResponse, BinanceError> {
        let params = [("symbol", symbol.to_string()), ("orderId", order_id.to_string())];
        self.signed(Method::DELETE, "/api/v3/order", &params).await
    }
}
