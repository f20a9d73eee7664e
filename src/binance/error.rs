use thiserror::Error;

#[derive(Debug, Error)]
pub enum BinanceError {
    #[error("Binance rejected request (HTTP {status}, code {code}): {msg}")]
    Api { status: u16, code: i64, msg: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Symbol {0} is not listed on the exchange")]
    UnknownSymbol(String),

    #[error("Symbol {symbol} has no {filter} filter")]
    MissingFilter { symbol: String, filter: &'static str },

    #[error("Signed endpoint {0} requires API credentials")]
    MissingCredentials(&'static str),
}

impl BinanceError {
    /// True when the exchange refused the request itself (bad quantity,
    /// unknown order, insufficient balance). Rate limits and bans are not
    /// rejections.
    pub fn is_rejection(&self) -> bool {
        match self {
            BinanceError::Api { status, .. } => {
                (400..500).contains(status) && *status != 418 && *status != 429
            }
            _ => false,
        }
    }

    /// Message suitable for a status line.
    pub fn reason(&self) -> String {
        match self {
            BinanceError::Api { msg, .. } => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> BinanceError {
        BinanceError::Api { status, code: -1013, msg: "Filter failure: LOT_SIZE".to_string() }
    }

    #[test]
    fn test_client_errors_are_rejections() {
        assert!(api(400).is_rejection());
        assert_eq!(api(400).reason(), "Filter failure: LOT_SIZE");
    }

    #[test]
    fn test_rate_limits_and_server_errors_are_not_rejections() {
        assert!(!api(429).is_rejection());
        assert!(!api(418).is_rejection());
        assert!(!api(503).is_rejection());
        assert!(!BinanceError::UnknownSymbol("ETHBTC".to_string()).is_rejection());
    }
}
