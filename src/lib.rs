pub mod config;
pub mod binance;
pub mod execution;
pub mod sizing;
pub mod strategy;
pub mod slack;
pub mod trader;

pub use config::Config;
pub use binance::{BinanceAuth, BinanceError};
pub use execution::{BinanceClient, Exchange};
pub use slack::{Notifier, SlackNotifier};
pub use strategy::{PositionState, TrendTracker};
pub use trader::Trader;
