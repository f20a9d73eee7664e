use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    /// Holding currency, looking for an entry
    Out,
    /// Holding coin, looking for an exit
    In,
    /// A limit order is resting on the book
    Wait,
}

impl PositionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionState::Out => "OUT",
            PositionState::In => "IN",
            PositionState::Wait => "WAIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSignal {
    Buy,
    Sell,
}

/// Tracks the running floor/ceiling since the last position change and
/// decides when price has moved far enough off them to trade.
#[derive(Debug, Clone)]
pub struct TrendTracker {
    state: PositionState,
    floor: Decimal,
    ceiling: Decimal,
    up_fraction: Decimal,
    down_fraction: Decimal,
}

impl TrendTracker {
    /// Starts in `Out` with floor = ceiling = `price`.
    pub fn new(price: Decimal, up_fraction: Decimal, down_fraction: Decimal) -> Self {
        Self {
            state: PositionState::Out,
            floor: price,
            ceiling: price,
            up_fraction,
            down_fraction,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn set_state(&mut self, state: PositionState) {
        self.state = state;
    }

    pub fn floor(&self) -> Decimal {
        self.floor
    }

    pub fn ceiling(&self) -> Decimal {
        self.ceiling
    }

    pub fn up_fraction(&self) -> Decimal {
        self.up_fraction
    }

    pub fn down_fraction(&self) -> Decimal {
        self.down_fraction
    }

    pub fn buy_target(&self) -> Decimal {
        self.floor * (Decimal::ONE + self.up_fraction)
    }

    pub fn sell_target(&self) -> Decimal {
        self.ceiling * (Decimal::ONE - self.down_fraction)
    }

    /// Folds `price` into floor/ceiling and reports a trigger, if any.
    ///
    /// The trigger compares against targets computed after the update, so a
    /// new low can never fire a buy on the same tick.
    pub fn observe(&mut self, price: Decimal) -> Option<TradeSignal> {
        if price < self.floor {
            self.floor = price;
        } else if price > self.ceiling {
            self.ceiling = price;
        }

        match self.state {
            PositionState::Out if price >= self.buy_target() => Some(TradeSignal::Buy),
            PositionState::In if price <= self.sell_target() => Some(TradeSignal::Sell),
            _ => None,
        }
    }

    pub fn reset(&mut self, price: Decimal) {
        self.floor = price;
        self.ceiling = price;
    }
}
