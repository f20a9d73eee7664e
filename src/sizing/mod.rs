use rust_decimal::Decimal;
use thiserror::Error;

use crate::binance::{BinanceError, SymbolFilter, SymbolInfo};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("Trade quantity does not meet MIN/MAX allowed by exchange. (qty {qty}, min {min}, max {max})")]
    OutOfRange { qty: Decimal, min: Decimal, max: Decimal },

    #[error("Cannot size an order at non-positive price {0}")]
    InvalidPrice(Decimal),
}

/// Exchange quantity and price constraints for one trading pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRules {
    pub min_qty: Decimal,
    pub max_qty: Decimal,
    pub step_size: Decimal,
    pub tick_size: Decimal,
    /// Decimal places of the tick size, used for display and limit prices
    pub precision: u32,
}

impl MarketRules {
    pub fn new(min_qty: Decimal, max_qty: Decimal, step_size: Decimal, tick_size: Decimal) -> Self {
        Self {
            min_qty,
            max_qty,
            step_size,
            tick_size,
            precision: tick_size.normalize().scale(),
        }
    }

    /// Reads PRICE_FILTER and LOT_SIZE from the symbol's filter list.
    pub fn from_symbol(info: &SymbolInfo) -> Result<Self, BinanceError> {
        let mut tick_size = None;
        let mut lot = None;

        for filter in &info.filters {
            match filter {
                SymbolFilter::PriceFilter { tick_size: tick, .. } => tick_size = Some(*tick),
                SymbolFilter::LotSize { min_qty, max_qty, step_size } => {
                    lot = Some((*min_qty, *max_qty, *step_size))
                }
                SymbolFilter::Other => {}
            }
        }

        let tick_size = tick_size.ok_or_else(|| BinanceError::MissingFilter {
            symbol: info.symbol.clone(),
            filter: "PRICE_FILTER",
        })?;
        let (min_qty, max_qty, step_size) = lot.ok_or_else(|| BinanceError::MissingFilter {
            symbol: info.symbol.clone(),
            filter: "LOT_SIZE",
        })?;

        Ok(Self::new(min_qty, max_qty, step_size, tick_size))
    }

    pub fn floor_to_step(&self, qty: Decimal) -> Decimal {
        if self.step_size.is_zero() {
            return qty;
        }
        (qty / self.step_size).floor() * self.step_size
    }

    /// Inclusive range check against the lot size limits.
    pub fn check_quantity(&self, qty: Decimal) -> Result<Decimal, SizingError> {
        if qty < self.min_qty || qty > self.max_qty {
            return Err(SizingError::OutOfRange {
                qty: qty.normalize(),
                min: self.min_qty.normalize(),
                max: self.max_qty.normalize(),
            });
        }
        Ok(qty)
    }

    /// Quantity of coin bought by spending `invest_fraction` of the free
    /// quote balance at `price`.
    pub fn buy_quantity(
        &self,
        quote_balance: Decimal,
        invest_fraction: Decimal,
        price: Decimal,
    ) -> Result<Decimal, SizingError> {
        if price <= Decimal::ZERO {
            return Err(SizingError::InvalidPrice(price));
        }
        let amount = quote_balance * invest_fraction;
        self.check_quantity(self.floor_to_step(amount / price))
    }

    /// The whole free coin balance, floored to the step.
    pub fn sell_quantity(&self, base_balance: Decimal) -> Result<Decimal, SizingError> {
        self.check_quantity(self.floor_to_step(base_balance))
    }

    pub fn round_price(&self, price: Decimal) -> Decimal {
        price.round_dp(self.precision)
    }
}
