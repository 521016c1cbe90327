//! Trade — a finalized round-trip with exit-reason attribution.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::{Position, TimedValue, TradeDirection};

/// What closed a trade.
///
/// Serialized as the kebab-case names downstream reductions key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitReason {
    StopLoss,
    ProfitTarget,
    ExitRule,
    Finalize,
}

/// A completed round-trip trade.
///
/// `growth` is direction-adjusted and always positive, so multiplying it
/// across a trade list compounds into the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: TradeDirection,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub growth: f64,
    /// Risk at entry as a percentage of the entry price, if a stop was armed.
    pub risk_pct: Option<f64>,
    /// Profit normalized by the unit risk at entry, if a stop was armed.
    pub rmultiple: Option<f64>,
    pub holding_period: usize,
    pub exit_reason: ExitReason,
    /// Stop level armed at entry, if any.
    pub stop_price: Option<f64>,
    pub profit_target: Option<f64>,
    pub stop_price_series: Option<Vec<TimedValue>>,
    pub risk_series: Option<Vec<TimedValue>>,
}

impl Trade {
    /// Finalize a position into its trade at the given exit fill.
    pub fn close(
        position: Position,
        exit_date: NaiveDate,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let profit = match position.direction {
            TradeDirection::Long => exit_price - position.entry_price,
            TradeDirection::Short => position.entry_price - exit_price,
        };
        let growth = match position.direction {
            TradeDirection::Long => exit_price / position.entry_price,
            TradeDirection::Short => position.entry_price / exit_price,
        };
        Self {
            direction: position.direction,
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_date,
            exit_price,
            profit,
            profit_pct: profit / position.entry_price * 100.0,
            growth,
            risk_pct: position.initial_risk_pct,
            rmultiple: position.initial_unit_risk.map(|risk| profit / risk),
            holding_period: position.holding_period,
            exit_reason,
            stop_price: position.initial_stop_price,
            profit_target: position.profit_target,
            stop_price_series: position.stop_price_series,
            risk_series: position.risk_series,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }
}
