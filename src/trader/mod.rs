//! The trading session: one pair, one position, one polling loop.
//!
//! Each [`Trader::tick`] fetches the last price, feeds it to the
//! [`TrendTracker`] and, on a trigger, sizes and places an order. Exchange
//! rejections end up in the status line; anything else is returned as an
//! error and stops the bot.

use anyhow::Result;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

use crate::binance::{BinanceError, OrderResponse, OrderSide, OrderStatus, OrderType};
use crate::config::{OrderMode, TradingConfig};
use crate::execution::{Exchange, OrderRequest};
use crate::sizing::MarketRules;
use crate::slack::{self, Notifier};
use crate::strategy::{PositionState, TradeSignal, TrendTracker};

/// A limit order that has not resolved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrder {
    pub order_id: u64,
    pub side: OrderSide,
    pub ticks_waited: u32,
}

impl PendingOrder {
    /// State to return to if the order never fills.
    fn origin(&self) -> PositionState {
        match self.side {
            OrderSide::Buy => PositionState::Out,
            OrderSide::Sell => PositionState::In,
        }
    }

    /// State once the order has filled.
    fn target(&self) -> PositionState {
        match self.side {
            OrderSide::Buy => PositionState::In,
            OrderSide::Sell => PositionState::Out,
        }
    }

    fn verb(&self) -> &'static str {
        match self.side {
            OrderSide::Buy => "Bought",
            OrderSide::Sell => "Sold",
        }
    }
}

/// What happened during one polling iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub price: Decimal,
    pub state: PositionState,
    pub message: String,
    /// A position change was attempted or resolved this tick
    pub traded: bool,
    /// The message went to the chat channel
    pub posted: bool,
}

pub struct Trader<E: Exchange> {
    exchange: E,
    notifier: Option<Box<dyn Notifier>>,
    coin: String,
    currency: String,
    trade_pair: String,
    rules: MarketRules,
    tracker: TrendTracker,
    invest_fraction: Decimal,
    order_mode: OrderMode,
    status_every: u32,
    limit_timeout_ticks: u32,
    status_count: u32,
    current_price: Decimal,
    pending: Option<PendingOrder>,
}

fn fraction(percent: f64, name: &str) -> Result<Decimal> {
    Decimal::from_f64(percent)
        .map(|p| p / Decimal::ONE_HUNDRED)
        .ok_or_else(|| anyhow::anyhow!("{} is not a finite number: {}", name, percent))
}

impl<E: Exchange> Trader<E> {
    /// Queries the current price and market rules, and starts out of the
    /// market with floor = ceiling = current price.
    pub async fn start(
        exchange: E,
        notifier: Option<Box<dyn Notifier>>,
        settings: &TradingConfig,
    ) -> Result<Self> {
        let trade_pair = settings.trade_pair();

        let current_price = exchange.last_price(&trade_pair).await?;
        let rules = exchange.market_rules(&trade_pair).await?;

        let up_fraction = fraction(settings.up_percent, "up_percent")?.round_dp(3);
        let down_fraction = fraction(settings.down_percent, "down_percent")?.round_dp(3);
        let invest_fraction = fraction(settings.invest_percent, "invest_percent")?;

        info!(
            "Market rules for {} | min qty {} | max qty {} | step {} | precision {}",
            trade_pair,
            rules.min_qty.normalize(),
            rules.max_qty.normalize(),
            rules.step_size.normalize(),
            rules.precision
        );

        Ok(Self {
            exchange,
            notifier,
            coin: settings.coin.clone(),
            currency: settings.currency.clone(),
            trade_pair,
            rules,
            tracker: TrendTracker::new(current_price, up_fraction, down_fraction),
            invest_fraction,
            order_mode: settings.order_mode,
            status_every: settings.status_every.max(1),
            limit_timeout_ticks: settings.limit_timeout_ticks.max(1),
            status_count: 0,
            current_price,
            pending: None,
        })
    }

    pub fn trade_pair(&self) -> &str {
        &self.trade_pair
    }

    pub fn state(&self) -> PositionState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &TrendTracker {
        &self.tracker
    }

    pub fn rules(&self) -> &MarketRules {
        &self.rules
    }

    pub fn current_price(&self) -> Decimal {
        self.current_price
    }

    pub fn pending_order(&self) -> Option<&PendingOrder> {
        self.pending.as_ref()
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Price rounded and padded to the pair's display precision.
    pub fn fmt_price(&self, price: Decimal) -> String {
        format!("{:.*}", self.rules.precision as usize, self.rules.round_price(price))
    }

    /// Logs balances and settings and announces the bot on chat.
    pub async fn announce_startup(&self) -> Result<()> {
        let coin_balance = self.exchange.free_balance(&self.coin).await?;
        let currency_balance = self.exchange.free_balance(&self.currency).await?;

        info!("Coin ({}) Balance: {}", self.coin, coin_balance);
        info!("Currency ({}) Balance: {}", self.currency, currency_balance);
        info!("Trade Pair Current Price: {}", self.current_price);
        let up = (self.tracker.up_fraction() * Decimal::ONE_HUNDRED).normalize();
        let down = (self.tracker.down_fraction() * Decimal::ONE_HUNDRED).normalize();
        info!("Up Momentum: {} Down Momentum: {}", up, down);
        info!("Looking for entry....");

        let message = slack::startup_message(
            &self.trade_pair,
            &self.fmt_price(self.current_price),
            &up.to_string(),
            &down.to_string(),
        );
        self.notify(&message).await;
        Ok(())
    }

    pub async fn announce_shutdown(&self) {
        let message = slack::shutdown_message(&self.trade_pair, self.state().as_str());
        self.notify(&message).await;
    }

    /// Posts to chat if a notifier is configured. Failures are only logged.
    pub async fn notify(&self, message: &str) -> bool {
        match &self.notifier {
            Some(notifier) => match notifier.post(message).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to post chat message: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Sleeps `interval` between ticks, forever.
    pub async fn run(&mut self, interval: Duration) -> Result<()> {
        loop {
            tokio::time::sleep(interval).await;
            self.tick().await?;
        }
    }

    /// One polling iteration.
    pub async fn tick(&mut self) -> Result<TickReport> {
        self.current_price = self.exchange.last_price(&self.trade_pair).await?;
        let price = self.current_price;

        let (message, traded) = if self.tracker.state() == PositionState::Wait {
            self.tracker.observe(price);
            self.advance_pending(price).await?
        } else {
            match self.tracker.observe(price) {
                Some(signal) => (self.execute(signal, price).await?, true),
                None => (self.status_line(price), false),
            }
        };

        if traded {
            self.tracker.reset(price);
            self.status_count = 0;
        }

        info!("{}", message);

        let posted = if self.status_count % self.status_every == 0 {
            self.notify(&message).await
        } else {
            false
        };
        self.status_count += 1;

        Ok(TickReport {
            price,
            state: self.tracker.state(),
            message,
            traded,
            posted,
        })
    }

    fn status_line(&self, price: Decimal) -> String {
        match self.tracker.state() {
            PositionState::Out => format!(
                "{}: {} | Floor: {} | Buy: {}",
                self.trade_pair,
                self.fmt_price(price),
                self.fmt_price(self.tracker.floor()),
                self.fmt_price(self.tracker.buy_target())
            ),
            PositionState::In => format!(
                "{}: {} | Ceiling: {} | Sell: {}",
                self.trade_pair,
                self.fmt_price(price),
                self.fmt_price(self.tracker.ceiling()),
                self.fmt_price(self.tracker.sell_target())
            ),
            PositionState::Wait => match &self.pending {
                Some(p) => format!(
                    "{}: {} | Waiting on {} order #{} ({}/{})",
                    self.trade_pair,
                    self.fmt_price(price),
                    p.side.as_str(),
                    p.order_id,
                    p.ticks_waited,
                    self.limit_timeout_ticks
                ),
                None => format!("{}: {} | Waiting", self.trade_pair, self.fmt_price(price)),
            },
        }
    }

    async fn execute(&mut self, signal: TradeSignal, price: Decimal) -> Result<String> {
        let (side, sized, verb) = match signal {
            TradeSignal::Buy => {
                let balance = self.exchange.free_balance(&self.currency).await?;
                let qty = self.rules.buy_quantity(balance, self.invest_fraction, price);
                (OrderSide::Buy, qty, "Bought")
            }
            TradeSignal::Sell => {
                let balance = self.exchange.free_balance(&self.coin).await?;
                (OrderSide::Sell, self.rules.sell_quantity(balance), "Sold")
            }
        };

        let result = match sized {
            Ok(qty) => self.submit(side, qty, price).await?,
            Err(e) => e.to_string(),
        };

        Ok(format!("{} @ {} | {}", verb, self.fmt_price(price), result))
    }

    async fn submit(&mut self, side: OrderSide, qty: Decimal, price: Decimal) -> Result<String> {
        let request = match self.order_mode {
            OrderMode::Market => OrderRequest::market(&self.trade_pair, side, qty),
            OrderMode::Limit => {
                OrderRequest::limit(&self.trade_pair, side, qty, self.rules.round_price(price))
            }
        };

        let order = match self.exchange.place_order(&request).await {
            Ok(order) => order,
            Err(e) => return rejection("Order rejected", e),
        };

        let pending = PendingOrder {
            order_id: order.order_id,
            side,
            ticks_waited: 0,
        };

        if order.status == OrderStatus::Filled || request.order_type == OrderType::Market {
            self.tracker.set_state(pending.target());
        } else if order.status.is_open() {
            self.tracker.set_state(PositionState::Wait);
            self.pending = Some(pending);
        } else {
            return Ok(format!("Order not accepted: {}", order));
        }

        Ok(order.to_string())
    }

    /// Polls the resting limit order. Returns the status line and whether
    /// the position changed.
    async fn advance_pending(&mut self, price: Decimal) -> Result<(String, bool)> {
        let Some(mut pending) = self.pending.take() else {
            // Nothing to wait on; fall back to the last confirmed side
            self.tracker.set_state(PositionState::Out);
            return Ok((self.status_line(price), false));
        };

        let order = match self.exchange.order_status(&self.trade_pair, pending.order_id).await {
            Ok(order) => order,
            Err(e) if e.is_rejection() => {
                self.tracker.set_state(pending.origin());
                let reason = format!("Order #{} lookup failed: {}", pending.order_id, e.reason());
                return Ok((reason, true));
            }
            Err(e) => return Err(e.into()),
        };

        if order.status == OrderStatus::Filled {
            return Ok(self.resolve(&pending, price, &order, true));
        }
        if !order.status.is_open() {
            return Ok(self.resolve(&pending, price, &order, false));
        }

        pending.ticks_waited += 1;
        if pending.ticks_waited < self.limit_timeout_ticks {
            self.pending = Some(pending);
            return Ok((self.status_line(price), false));
        }

        match self.exchange.cancel_order(&self.trade_pair, pending.order_id).await {
            Ok(cancelled) => {
                let filled = cancelled.executed_qty > Decimal::ZERO;
                Ok(self.resolve(&pending, price, &cancelled, filled))
            }
            Err(e) if e.is_rejection() => {
                let message = format!(
                    "{}: {} | Cancel failed: {}",
                    self.trade_pair,
                    self.fmt_price(price),
                    e.reason()
                );
                self.pending = Some(pending);
                Ok((message, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(
        &mut self,
        pending: &PendingOrder,
        price: Decimal,
        order: &OrderResponse,
        filled: bool,
    ) -> (String, bool) {
        let state = if filled { pending.target() } else { pending.origin() };
        self.tracker.set_state(state);

        let message = if filled {
            // Report the limit price, not the poll price that observed the fill
            let fill_price = if order.price > Decimal::ZERO { order.price } else { price };
            format!("{} @ {} | {}", pending.verb(), self.fmt_price(fill_price), order)
        } else {
            format!(
                "{}: {} | Limit order #{} {} | {}",
                self.trade_pair,
                self.fmt_price(price),
                order.order_id,
                order.status,
                state.as_str()
            )
        };

        (message, true)
    }
}

fn rejection(context: &str, err: BinanceError) -> Result<String> {
    if err.is_rejection() {
        Ok(format!("{}: {}", context, err.reason()))
    } else {
        Err(err.into())
    }
}
