//! The backtest state machine.
//!
//! A single pass over the indicator series. Entries signaled on one bar fill
//! at a later bar's open, exits by rule fill at the open after the rule
//! fires, and stop/target exits fill intrabar at their configured levels.
//! While a position is open, each bar runs a fixed ladder: stop-loss check,
//! trailing ratchet, profit-target check, mark-to-close, risk recording,
//! exit rule. The first exit to fire wins the bar and the rest of the ladder
//! is skipped.

use thiserror::Error;

use crate::domain::{Bar, BarData, ExitReason, Position, TimedValue, Trade, TradeDirection};
use crate::engine::lookback;
use crate::engine::state::{BacktestOptions, EngineState};
use crate::strategy::{
    DistanceFn, EntryContext, EntrySignal, ExitContext, ExitSignal, RiskContext, Strategy,
};

/// Errors that abort a backtest before any trade is produced.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("input series is empty")]
    EmptySeries,
    #[error("input series has {bars} bars but the lookback period is {lookback}")]
    InsufficientBars { bars: usize, lookback: usize },
    #[error("lookback period must be at least 1")]
    ZeroLookback,
    #[error("prep_indicators returned {indicators} bars for {bars} input bars")]
    IndicatorLengthMismatch { bars: usize, indicators: usize },
}

/// Run the strategy over the bar series and return the completed trades.
pub fn backtest<P, I: BarData>(
    strategy: &Strategy<P, I>,
    bars: &[Bar],
    options: &BacktestOptions,
) -> Result<Vec<Trade>, EngineError> {
    backtest_with(strategy, &strategy.parameters, bars, options)
}

/// Run with an explicit parameter bucket instead of the strategy's own.
///
/// The optimizers overlay one bucket per candidate while sharing the
/// strategy read-only across evaluations.
pub fn backtest_with<P, I: BarData>(
    strategy: &Strategy<P, I>,
    parameters: &P,
    bars: &[Bar],
    options: &BacktestOptions,
) -> Result<Vec<Trade>, EngineError> {
    if bars.is_empty() {
        return Err(EngineError::EmptySeries);
    }
    let period = strategy.lookback_period();
    if period == 0 {
        return Err(EngineError::ZeroLookback);
    }
    if bars.len() < period {
        return Err(EngineError::InsufficientBars {
            bars: bars.len(),
            lookback: period,
        });
    }

    let indicators = strategy.indicator_series(parameters, bars);
    if indicators.len() != bars.len() {
        return Err(EngineError::IndicatorLengthMismatch {
            bars: bars.len(),
            indicators: indicators.len(),
        });
    }

    let mut trades = Vec::new();
    let mut state = EngineState::Idle;

    for index in 0..indicators.len() {
        let Some(window) = lookback::window(&indicators, index, period) else {
            continue;
        };
        let bar = &indicators[index];
        state = step(strategy, parameters, options, state, bar, window, &mut trades);
    }

    // A position still on the book is closed at the final close.
    if let EngineState::Open(position) | EngineState::PendingExit(position) = state {
        if let Some(last) = indicators.last() {
            trades.push(Trade::close(
                position,
                last.date(),
                last.close(),
                ExitReason::Finalize,
            ));
        }
    }

    tracing::trace!(bars = bars.len(), trades = trades.len(), "backtest complete");
    Ok(trades)
}

/// Advance the book by one bar.
fn step<P, I: BarData>(
    strategy: &Strategy<P, I>,
    parameters: &P,
    options: &BacktestOptions,
    state: EngineState,
    bar: &I,
    window: &[I],
    trades: &mut Vec<Trade>,
) -> EngineState {
    match state {
        EngineState::Idle => evaluate_entry(strategy, parameters, bar, window),
        EngineState::AwaitingEntry {
            direction,
            conditional_entry_price,
        } => {
            if let Some(level) = conditional_entry_price {
                let traded_through = match direction {
                    TradeDirection::Long => bar.high() >= level,
                    TradeDirection::Short => bar.low() <= level,
                };
                if !traded_through {
                    return EngineState::AwaitingEntry {
                        direction,
                        conditional_entry_price,
                    };
                }
            }
            EngineState::Open(open_position(
                strategy, parameters, options, direction, bar, window,
            ))
        }
        EngineState::Open(position) => {
            manage_position(strategy, parameters, options, position, bar, window, trades)
        }
        EngineState::PendingExit(position) => {
            trades.push(Trade::close(
                position,
                bar.date(),
                bar.open(),
                ExitReason::ExitRule,
            ));
            EngineState::Idle
        }
    }
}

fn evaluate_entry<P, I: BarData>(
    strategy: &Strategy<P, I>,
    parameters: &P,
    bar: &I,
    window: &[I],
) -> EngineState {
    let mut signal = EntrySignal::new();
    (strategy.entry_rule)(
        &mut signal,
        &EntryContext {
            bar,
            lookback: window,
            parameters,
        },
    );
    match signal.take() {
        Some(intent) => EngineState::AwaitingEntry {
            direction: intent.direction,
            conditional_entry_price: intent.entry_price,
        },
        None => EngineState::Idle,
    }
}

/// Fill the entry at this bar's open and arm the risk management.
///
/// Arming order: fixed stop, then the trailing stop (which may only tighten
/// the initial level), then unit risk, then the profit target. No exit check
/// runs on the entry bar.
fn open_position<P, I: BarData>(
    strategy: &Strategy<P, I>,
    parameters: &P,
    options: &BacktestOptions,
    direction: TradeDirection,
    bar: &I,
    window: &[I],
) -> Position {
    let entry_price = bar.open();
    let mut position = Position::open(direction, bar.date(), entry_price);

    if let Some(stop_fn) = &strategy.stop_loss {
        let distance = risk_distance(stop_fn, parameters, &position, bar, window);
        position.initial_stop_price = Some(protective_level(direction, entry_price, distance));
    }
    if let Some(trail_fn) = &strategy.trailing_stop_loss {
        let distance = risk_distance(trail_fn, parameters, &position, bar, window);
        let candidate = protective_level(direction, entry_price, distance);
        position.initial_stop_price = Some(match position.initial_stop_price {
            None => candidate,
            Some(existing) => match direction {
                TradeDirection::Long => existing.max(candidate),
                TradeDirection::Short => existing.min(candidate),
            },
        });
    }
    position.cur_stop_price = position.initial_stop_price;

    if strategy.trailing_stop_loss.is_some() && options.record_stop_price {
        if let Some(stop) = position.cur_stop_price {
            position.stop_price_series = Some(vec![TimedValue::new(bar.date(), stop)]);
        }
    }

    if let Some(stop) = position.cur_stop_price {
        let unit_risk = match direction {
            TradeDirection::Long => entry_price - stop,
            TradeDirection::Short => stop - entry_price,
        };
        let risk_pct = unit_risk / entry_price * 100.0;
        position.initial_unit_risk = Some(unit_risk);
        position.initial_risk_pct = Some(risk_pct);
        position.cur_risk_pct = Some(risk_pct);
        position.cur_rmultiple = Some(0.0);
        if options.record_risk {
            position.risk_series = Some(vec![TimedValue::new(bar.date(), risk_pct)]);
        }
    }

    if let Some(target_fn) = &strategy.profit_target {
        let distance = risk_distance(target_fn, parameters, &position, bar, window);
        position.profit_target = Some(match direction {
            TradeDirection::Long => entry_price + distance,
            TradeDirection::Short => entry_price - distance,
        });
    }

    position
}

/// Run the per-bar exit ladder on an open position.
fn manage_position<P, I: BarData>(
    strategy: &Strategy<P, I>,
    parameters: &P,
    options: &BacktestOptions,
    mut position: Position,
    bar: &I,
    window: &[I],
    trades: &mut Vec<Trade>,
) -> EngineState {
    // The stop level in effect at the start of the bar governs the bar, so
    // the hit check runs before the ratchet. When both the stop and the
    // target are reachable within one bar's range, the stop fills.
    if let Some(stop) = position.cur_stop_price {
        let hit = match position.direction {
            TradeDirection::Long => bar.low() <= stop,
            TradeDirection::Short => bar.high() >= stop,
        };
        if hit {
            trades.push(Trade::close(
                position,
                bar.date(),
                stop,
                ExitReason::StopLoss,
            ));
            return EngineState::Idle;
        }
    }

    if let Some(trail_fn) = &strategy.trailing_stop_loss {
        let distance = risk_distance(trail_fn, parameters, &position, bar, window);
        let candidate = protective_level(position.direction, bar.close(), distance);
        position.ratchet_stop(candidate);
        if options.record_stop_price {
            let stop = position.cur_stop_price;
            if let (Some(series), Some(stop)) = (position.stop_price_series.as_mut(), stop) {
                series.push(TimedValue::new(bar.date(), stop));
            }
        }
    }

    if let Some(target) = position.profit_target {
        let hit = match position.direction {
            TradeDirection::Long => bar.high() >= target,
            TradeDirection::Short => bar.low() <= target,
        };
        if hit {
            trades.push(Trade::close(
                position,
                bar.date(),
                target,
                ExitReason::ProfitTarget,
            ));
            return EngineState::Idle;
        }
    }

    position.update(bar.close());

    if options.record_risk {
        let risk = position.cur_risk_pct;
        if let (Some(series), Some(risk)) = (position.risk_series.as_mut(), risk) {
            series.push(TimedValue::new(bar.date(), risk));
        }
    }

    if let Some(exit_rule) = &strategy.exit_rule {
        let mut signal = ExitSignal::new();
        exit_rule(
            &mut signal,
            &ExitContext {
                bar,
                lookback: window,
                entry_price: position.entry_price,
                position: &position,
                parameters,
            },
        );
        if signal.requested() {
            return EngineState::PendingExit(position);
        }
    }

    EngineState::Open(position)
}

fn risk_distance<P, I: BarData>(
    distance_fn: &DistanceFn<P, I>,
    parameters: &P,
    position: &Position,
    bar: &I,
    window: &[I],
) -> f64 {
    let distance = distance_fn(&RiskContext {
        entry_price: position.entry_price,
        position,
        bar,
        lookback: window,
        parameters,
    });
    debug_assert!(
        distance >= 0.0,
        "distance functions must return a non-negative offset, got {distance}"
    );
    distance
}

/// Stop side of the reference price: below for longs, above for shorts.
fn protective_level(direction: TradeDirection, reference: f64, distance: f64) -> f64 {
    match direction {
        TradeDirection::Long => reference - distance,
        TradeDirection::Short => reference + distance,
    }
}
