use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct BinanceAuth {
    api_key: String,
    api_secret: String,
}

impl BinanceAuth {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self { api_key, api_secret }
    }

    pub fn get_api_key(&self) -> &str {
        &self.api_key
    }

    /// HMAC-SHA256 of the full query string, hex encoded.
    pub fn generate_signature(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");

        mac.update(query.as_bytes());

        hex::encode(mac.finalize().into_bytes())
    }

    /// Current timestamp in milliseconds
    pub fn get_timestamp() -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }

    /// Builds `params&timestamp=..&recvWindow=..&signature=..` ready to send.
    pub fn sign_query(&self, params: &[(&str, String)], timestamp: u64, recv_window: u64) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("recvWindow", &recv_window.to_string())
            .append_pair("timestamp", &timestamp.to_string())
            .finish();

        let signature = self.generate_signature(&query);
        format!("{}&signature={}", query, signature)
    }
}
