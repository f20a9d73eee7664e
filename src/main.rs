use anyhow::Result;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use binance_trend_bot::config::{Config, LoggingConfig};
use binance_trend_bot::execution::BinanceClient;
use binance_trend_bot::binance::BinanceAuth;
use binance_trend_bot::slack::{Notifier, SlackNotifier};
use binance_trend_bot::trader::Trader;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_logging(&config.logging)?;

    info!("Initializing....");
    info!("   Pair: {}", config.trading.trade_pair());
    info!("   REST URL: {}", config.binance.rest_url);
    info!("   Order mode: {:?}", config.trading.order_mode);

    let notifier: Option<Box<dyn Notifier>> = match (&config.slack.token, &config.slack.channel) {
        (Some(token), Some(channel)) if config.slack.enabled => {
            let slack = SlackNotifier::new(token.clone(), channel.clone())?;
            info!("Slack notifications enabled ({})", slack.channel());
            Some(Box::new(slack) as Box<dyn Notifier>)
        }
        _ => {
            info!("Slack notifications disabled");
            None
        }
    };

    let auth = match config.binance.credentials() {
        Some((api_key, api_secret)) => Some(BinanceAuth::new(api_key.to_string(), api_secret.to_string())),
        _ => {
            warn!("No Binance API credentials configured; balance and order calls will fail");
            None
        }
    };

    let client = BinanceClient::new(
        config.binance.rest_url.clone(),
        auth,
        config.binance.recv_window_ms,
    )?;

    let mut trader = Trader::start(client, notifier, &config.trading).await?;
    trader.announce_startup().await?;

    let interval = Duration::from_secs(config.trading.check_interval_secs);

    let result = tokio::select! {
        result = trader.run(interval) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("Trading loop stopped: {:#}", e);
    }

    trader.announce_shutdown().await;
    info!("Bot stopped");
    result
}
