//! Position — the single open trade the engine is tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
}

/// A `{date, value}` sample in a per-bar recorded series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedValue {
    pub date: NaiveDate,
    pub value: f64,
}

impl TimedValue {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// An open position.
///
/// Created at the open of the entry bar, marked to each subsequent bar's
/// close, and consumed when converted into a `Trade`. Entry fields are set
/// once; the running metrics and risk state evolve bar by bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub direction: TradeDirection,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    /// Running profit in price units, refreshed from each bar close.
    pub profit: f64,
    pub profit_pct: f64,
    pub growth: f64,
    /// Bars held after the entry bar.
    pub holding_period: usize,
    /// Stop level armed on the entry bar, if any.
    pub initial_stop_price: Option<f64>,
    /// Current stop level (only tightens, never loosens).
    pub cur_stop_price: Option<f64>,
    pub profit_target: Option<f64>,
    pub initial_unit_risk: Option<f64>,
    pub initial_risk_pct: Option<f64>,
    pub cur_risk_pct: Option<f64>,
    pub cur_rmultiple: Option<f64>,
    pub stop_price_series: Option<Vec<TimedValue>>,
    pub risk_series: Option<Vec<TimedValue>>,
}

impl Position {
    /// Open a position at the given entry fill.
    pub fn open(direction: TradeDirection, entry_date: NaiveDate, entry_price: f64) -> Self {
        Self {
            direction,
            entry_date,
            entry_price,
            profit: 0.0,
            profit_pct: 0.0,
            growth: 1.0,
            holding_period: 0,
            initial_stop_price: None,
            cur_stop_price: None,
            profit_target: None,
            initial_unit_risk: None,
            initial_risk_pct: None,
            cur_risk_pct: None,
            cur_rmultiple: None,
            stop_price_series: None,
            risk_series: None,
        }
    }

    /// Distance between price and the current stop, signed so that a stop on
    /// the protective side of the price is positive.
    pub fn unit_risk(&self, price: f64) -> Option<f64> {
        self.cur_stop_price.map(|stop| match self.direction {
            TradeDirection::Long => price - stop,
            TradeDirection::Short => stop - price,
        })
    }

    /// Move the stop toward the proposed level. Stops may only rise for longs
    /// and fall for shorts; a loosening proposal leaves the stop alone.
    pub fn ratchet_stop(&mut self, proposed: f64) {
        let next = match self.cur_stop_price {
            None => proposed,
            Some(current) => match self.direction {
                TradeDirection::Long => current.max(proposed),
                TradeDirection::Short => current.min(proposed),
            },
        };
        self.cur_stop_price = Some(next);
    }

    /// Refresh the running metrics from a bar close and count the bar as held.
    pub fn update(&mut self, close: f64) {
        self.profit = match self.direction {
            TradeDirection::Long => close - self.entry_price,
            TradeDirection::Short => self.entry_price - close,
        };
        self.profit_pct = self.profit / self.entry_price * 100.0;
        self.growth = match self.direction {
            TradeDirection::Long => close / self.entry_price,
            TradeDirection::Short => self.entry_price / close,
        };
        if let Some(initial_risk) = self.initial_unit_risk {
            if let Some(unit_risk) = self.unit_risk(close) {
                self.cur_risk_pct = Some(unit_risk / close * 100.0);
                self.cur_rmultiple = Some(self.profit / initial_risk);
            }
        }
        self.holding_period += 1;
    }
}
