//! Analysis reductions — pure functions over the trade list.
//!
//! Every reduction is a pure function: trades in, numbers out. No
//! dependencies on the engine or the optimizers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rulelab_core::Trade;

/// Errors from the analysis reductions.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("starting capital must be positive, got {0}")]
    InvalidStartingCapital(f64),
}

/// Equity after each trade, compounding `growth`.
///
/// `equity[0]` is the starting capital and
/// `equity[i + 1] = equity[i] * trades[i].growth`.
pub fn compute_equity_curve(
    starting_capital: f64,
    trades: &[Trade],
) -> Result<Vec<f64>, AnalysisError> {
    if !(starting_capital > 0.0) {
        return Err(AnalysisError::InvalidStartingCapital(starting_capital));
    }
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut equity = starting_capital;
    curve.push(equity);
    for trade in trades {
        equity *= trade.growth;
        curve.push(equity);
    }
    Ok(curve)
}

/// Distance below the running equity peak after each trade. Always ≤ 0,
/// aligned with the equity curve.
pub fn compute_drawdown(
    starting_capital: f64,
    trades: &[Trade],
) -> Result<Vec<f64>, AnalysisError> {
    let curve = compute_equity_curve(starting_capital, trades)?;
    let mut peak = starting_capital;
    Ok(curve
        .into_iter()
        .map(|equity| {
            if equity > peak {
                peak = equity;
            }
            equity - peak
        })
        .collect())
}

/// Aggregate statistics over a trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub trade_count: usize,
    pub winners: usize,
    pub losers: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_profit: f64,
    /// Product of per-trade growth; multiplies starting capital into final
    /// equity.
    pub final_growth: f64,
}

impl TradeStats {
    pub fn compute(trades: &[Trade]) -> Self {
        let winners = trades.iter().filter(|t| t.is_winner()).count();
        Self {
            trade_count: trades.len(),
            winners,
            losers: trades.len() - winners,
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            total_profit: trades.iter().map(|t| t.profit).sum(),
            final_growth: trades.iter().map(|t| t.growth).product(),
        }
    }
}

/// Fraction of trades with positive profit. 0.0 for an empty list.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profit over gross loss. 0.0 when there are no losses to divide by.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.profit > 0.0).map(|t| t.profit).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit < 0.0)
        .map(|t| -t.profit)
        .sum();
    if gross_loss < 1e-15 {
        return 0.0;
    }
    gross_profit / gross_loss
}
