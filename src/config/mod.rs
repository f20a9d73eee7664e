use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::execution::DEFAULT_REST_URL;

pub const DEFAULT_CONFIG_PATH: &str = "config/trend";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub binance: BinanceConfig,
    pub trading: TradingConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            rest_url: default_rest_url(),
            recv_window_ms: default_recv_window_ms(),
        }
    }
}

impl BinanceConfig {
    /// Key and secret, if both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.api_key.as_deref(), self.api_secret.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => Some((key, secret)),
            _ => None,
        }
    }
}

fn default_rest_url() -> String { DEFAULT_REST_URL.to_string() }
fn default_recv_window_ms() -> u64 { 5000 }

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    #[default]
    Market,
    Limit,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradingConfig {
    pub coin: String,
    pub currency: String,
    #[serde(default = "default_up_percent")]
    pub up_percent: f64,
    #[serde(default = "default_down_percent")]
    pub down_percent: f64,
    #[serde(default = "default_invest_percent")]
    pub invest_percent: f64,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default)]
    pub order_mode: OrderMode,
    // Post every Nth status line to chat
    #[serde(default = "default_status_every")]
    pub status_every: u32,
    // Ticks a limit order may rest before it is cancelled
    #[serde(default = "default_limit_timeout_ticks")]
    pub limit_timeout_ticks: u32,
}

fn default_up_percent() -> f64 { 2.0 }
fn default_down_percent() -> f64 { 3.0 }
fn default_invest_percent() -> f64 { 20.0 }
fn default_check_interval_secs() -> u64 { 60 }
fn default_status_every() -> u32 { 20 }
fn default_limit_timeout_ticks() -> u32 { 5 }

impl TradingConfig {
    pub fn trade_pair(&self) -> String {
        format!("{}{}", self.coin, self.currency)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub enabled: bool,
    pub token: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String { "info".to_string() }

impl Config {
    /// Layers `.env`, the JSON config file, `TREND_*` variables and the
    /// secret overrides, in that order.
    pub fn load() -> Result<Arc<Self>> {
        dotenv::dotenv().ok();

        let path = std::env::var("TREND_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(&path))
            .add_source(
                config::Environment::with_prefix("TREND")
                    .prefix_separator("_")
                    .separator("__"),
            );

        if let Ok(api_key) = std::env::var("BINANCE_API_KEY") {
            builder = builder.set_override("binance.api_key", api_key)?;
        }

        if let Ok(api_secret) = std::env::var("BINANCE_API_SECRET") {
            builder = builder.set_override("binance.api_secret", api_secret)?;
        }

        if let Ok(token) = std::env::var("SLACK_TOKEN") {
            builder = builder.set_override("slack.token", token)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(Arc::new(config))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(json, config::FileFormat::Json))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.trading;

        if t.coin.is_empty() || t.currency.is_empty() {
            bail!("trading.coin and trading.currency must be set");
        }
        if t.up_percent <= 0.0 {
            bail!("trading.up_percent must be positive, got {}", t.up_percent);
        }
        if t.down_percent <= 0.0 || t.down_percent >= 100.0 {
            bail!("trading.down_percent must be in (0, 100), got {}", t.down_percent);
        }
        if t.invest_percent <= 0.0 || t.invest_percent > 100.0 {
            bail!("trading.invest_percent must be in (0, 100], got {}", t.invest_percent);
        }
        if t.check_interval_secs == 0 {
            bail!("trading.check_interval_secs must be at least 1");
        }
        if t.status_every == 0 {
            bail!("trading.status_every must be at least 1");
        }
        if t.order_mode == OrderMode::Limit && t.limit_timeout_ticks == 0 {
            bail!("trading.limit_timeout_ticks must be at least 1 for limit orders");
        }

        if self.slack.enabled {
            let missing = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);
            if missing(&self.slack.token) || missing(&self.slack.channel) {
                bail!("slack.token and slack.channel are required when slack.enabled is true");
            }
        }

        Ok(())
    }
}
