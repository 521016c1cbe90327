//! Walk-forward optimization — alternate in-sample search and out-of-sample
//! evaluation across sliding windows.
//!
//! Each window optimizes on `in_sample_size` bars, applies the chosen
//! parameters to a fresh bucket, and backtests the next `out_sample_size`
//! bars. Windows advance by the out-of-sample size and the harness stops
//! when a full out-of-sample window no longer fits. Out-of-sample trades
//! are concatenated in window order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use rulelab_core::{
    backtest_with, BacktestOptions, Bar, BarData, ParameterSet, SeedSequence, Strategy, Trade,
};

use crate::objective::Objective;
use crate::optimize::{optimize, OptimizeError, OptimizeOptions};
use crate::sweep::ParameterDef;

/// Options for the walk-forward harness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardOptions {
    /// Optimizer settings reused for every in-sample window. The seed given
    /// here acts as the master seed; each window's optimizer runs with a
    /// sub-seed derived from it, so a window's result does not depend on how
    /// many windows ran before it.
    pub optimize: OptimizeOptions,
}

/// One in/out window, with the parameters the optimizer chose on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub window_index: usize,
    /// In-sample start bar index (inclusive).
    pub in_start: usize,
    /// In-sample end bar index (exclusive).
    pub in_end: usize,
    /// Out-of-sample start bar index (inclusive).
    pub out_start: usize,
    /// Out-of-sample end bar index (exclusive).
    pub out_end: usize,
    pub best_parameter_values: BTreeMap<String, f64>,
    /// In-sample objective at the chosen parameters.
    pub best_result: f64,
    pub out_trade_count: usize,
}

/// Concatenated out-of-sample trades plus per-window diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub trades: Vec<Trade>,
    pub windows: Vec<WindowRecord>,
}

/// Errors from walk-forward optimization.
#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("in-sample size must be positive")]
    InvalidInSampleSize,
    #[error("out-of-sample size must be positive")]
    InvalidOutSampleSize,
    #[error("input series is empty")]
    EmptySeries,
    #[error("optimization failed on window {window}: {source}")]
    Optimize {
        window: usize,
        #[source]
        source: OptimizeError,
    },
    #[error("out-of-sample backtest failed on window {window}: {source}")]
    Backtest {
        window: usize,
        #[source]
        source: rulelab_core::EngineError,
    },
}

/// Run the walk-forward protocol over the bar series.
pub fn walk_forward_optimize<P, I>(
    strategy: &Strategy<P, I>,
    parameter_defs: &[ParameterDef],
    objective: &Objective,
    bars: &[Bar],
    in_sample_size: usize,
    out_sample_size: usize,
    options: &WalkForwardOptions,
) -> Result<WalkForwardResult, WalkForwardError>
where
    P: ParameterSet + Send + Sync,
    I: BarData,
{
    if in_sample_size == 0 {
        return Err(WalkForwardError::InvalidInSampleSize);
    }
    if out_sample_size == 0 {
        return Err(WalkForwardError::InvalidOutSampleSize);
    }
    if bars.is_empty() {
        return Err(WalkForwardError::EmptySeries);
    }

    let seeds = SeedSequence::new(options.optimize.random_seed);
    let mut trades = Vec::new();
    let mut windows = Vec::new();
    let mut offset = 0;

    loop {
        let window_index = windows.len();
        let out_start = offset + in_sample_size;
        let out_end = out_start + out_sample_size;
        if out_end > bars.len() {
            break;
        }
        let in_bars = &bars[offset..out_start];
        let out_bars = &bars[out_start..out_end];

        let mut window_options = options.optimize.clone();
        window_options.random_seed = seeds.derive("walk-forward", window_index as u64);

        tracing::info!(
            window = window_index,
            in_start = offset,
            out_start,
            "optimizing walk-forward window"
        );

        let optimized = optimize(strategy, parameter_defs, objective, in_bars, &window_options)
            .map_err(|source| WalkForwardError::Optimize {
                window: window_index,
                source,
            })?;

        let mut parameters = strategy.parameters.clone();
        for (name, &value) in &optimized.best_parameter_values {
            parameters.set(name, value);
        }

        let out_trades = backtest_with(strategy, &parameters, out_bars, &BacktestOptions::default())
            .map_err(|source| WalkForwardError::Backtest {
                window: window_index,
                source,
            })?;

        windows.push(WindowRecord {
            window_index,
            in_start: offset,
            in_end: out_start,
            out_start,
            out_end,
            best_parameter_values: optimized.best_parameter_values,
            best_result: optimized.best_result,
            out_trade_count: out_trades.len(),
        });
        trades.extend(out_trades);
        offset += out_sample_size;
    }

    tracing::info!(
        windows = windows.len(),
        trades = trades.len(),
        "walk-forward complete"
    );
    Ok(WalkForwardResult { trades, windows })
}
