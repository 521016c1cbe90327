//! End-to-end tests for the optimization layers.
//!
//! Covers grid enumeration order and tie-breaking, hill-climb convergence
//! and caching, walk-forward composition, Monte Carlo resampling, and the
//! equity reductions over real backtest output.

use chrono::NaiveDate;

use rulelab_core::{
    backtest, BacktestOptions, Bar, EntrySignal, ParameterSet, Params, Strategy, Trade,
};
use rulelab_runner::{
    compute_drawdown, compute_equity_curve, monte_carlo, optimize, walk_forward_optimize,
    MonteCarloOptions, OptimizationType, OptimizeError, OptimizeOptions, ParameterDef,
    SearchDirection, TradeStats, WalkForwardOptions,
};

/// Flat series: every bar opens and closes at 100 with a low of 97, so a
/// stop distance of 3 or less is hit on every held bar and a wider stop
/// never is.
fn flat_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    (0..n)
        .map(|i| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: 100.0,
            high: 101.0,
            low: 97.0,
            close: 100.0,
            volume: 1_000.0,
        })
        .collect()
}

/// Always enter long; stop distance comes from the "stop" parameter.
fn stop_strategy() -> Strategy<Params> {
    Strategy::new(
        Params::new().with("stop", 4.0),
        |signal: &mut EntrySignal, _| signal.enter_long(),
    )
    .with_stop_loss(|ctx| ctx.parameters.get("stop").unwrap_or(4.0))
}

fn trade_count(trades: &[Trade]) -> f64 {
    trades.len() as f64
}

/// Strictly monotone landscape: recover the armed stop distance from the
/// first trade and prefer it small.
fn neg_stop_distance(trades: &[Trade]) -> f64 {
    let trade = &trades[0];
    -(trade.entry_price - trade.stop_price.unwrap())
}

// ─── Grid search ─────────────────────────────────────────────────────

#[test]
fn grid_finds_the_monotone_optimum() {
    let bars = flat_bars(12);
    let strategy = stop_strategy();
    let defs = vec![ParameterDef::new("stop", 2.0, 6.0, 2.0)];

    let result = optimize(
        &strategy,
        &defs,
        &trade_count,
        &bars,
        &OptimizeOptions::default(),
    )
    .unwrap();

    // A 2-point stop is hit every cycle (4 trades in 12 bars); wider stops
    // survive to finalization with a single trade.
    assert_eq!(result.best_parameter_values["stop"], 2.0);
    assert_eq!(result.best_result, 4.0);
}

#[test]
fn grid_enumerates_outer_axis_major_and_first_wins_ties() {
    let bars = flat_bars(8);
    let strategy = stop_strategy();
    // Neither parameter affects the constant objective.
    let defs = vec![
        ParameterDef::new("a", 1.0, 2.0, 1.0),
        ParameterDef::new("b", 10.0, 30.0, 10.0),
    ];
    let constant = |_: &[Trade]| 1.0;

    let options = OptimizeOptions {
        record_all_results: true,
        ..Default::default()
    };
    let result = optimize(&strategy, &defs, &constant, &bars, &options).unwrap();

    // With a constant objective the first coordinate visited wins.
    assert_eq!(result.best_parameter_values["a"], 1.0);
    assert_eq!(result.best_parameter_values["b"], 10.0);

    let all = result.all_results.unwrap();
    let visited: Vec<(f64, f64)> = all
        .iter()
        .map(|r| (r.parameter_values["a"], r.parameter_values["b"]))
        .collect();
    assert_eq!(
        visited,
        vec![
            (1.0, 10.0),
            (1.0, 20.0),
            (1.0, 30.0),
            (2.0, 10.0),
            (2.0, 20.0),
            (2.0, 30.0),
        ]
    );
}

#[test]
fn grid_min_direction_takes_first_of_equal_minima() {
    let bars = flat_bars(12);
    let strategy = stop_strategy();
    let defs = vec![ParameterDef::new("stop", 2.0, 6.0, 2.0)];

    let options = OptimizeOptions {
        search_direction: SearchDirection::Min,
        ..Default::default()
    };
    let result = optimize(&strategy, &defs, &trade_count, &bars, &options).unwrap();

    // Stops of 4 and 6 both produce a single trade; the earlier coordinate
    // keeps the title.
    assert_eq!(result.best_result, 1.0);
    assert_eq!(result.best_parameter_values["stop"], 4.0);
}

#[test]
fn grid_runs_are_deterministic() -> anyhow::Result<()> {
    let bars = flat_bars(12);
    let strategy = stop_strategy();
    let defs = vec![ParameterDef::new("stop", 2.0, 6.0, 1.0)];
    let options = OptimizeOptions {
        record_all_results: true,
        ..Default::default()
    };

    let a = optimize(&strategy, &defs, &trade_count, &bars, &options)?;
    let b = optimize(&strategy, &defs, &trade_count, &bars, &options)?;
    assert_eq!(a.best_result, b.best_result);
    assert_eq!(a.best_parameter_values, b.best_parameter_values);
    assert_eq!(a.all_results, b.all_results);
    Ok(())
}

#[test]
fn record_duration_stamps_the_result() {
    let bars = flat_bars(8);
    let strategy = stop_strategy();
    let defs = vec![ParameterDef::new("stop", 2.0, 4.0, 2.0)];
    let options = OptimizeOptions {
        record_duration: true,
        ..Default::default()
    };
    let result = optimize(&strategy, &defs, &trade_count, &bars, &options).unwrap();
    assert!(result.duration_ms.is_some());
}

#[test]
fn unknown_parameter_name_is_rejected() {
    #[derive(Debug, Clone)]
    struct StopOnly {
        stop: f64,
    }
    impl rulelab_core::ParameterSet for StopOnly {
        fn set(&mut self, name: &str, value: f64) -> bool {
            if name == "stop" {
                self.stop = value;
                true
            } else {
                false
            }
        }
        fn get(&self, name: &str) -> Option<f64> {
            (name == "stop").then_some(self.stop)
        }
    }

    let bars = flat_bars(8);
    let strategy = Strategy::new(StopOnly { stop: 4.0 }, |signal: &mut EntrySignal, _| {
        signal.enter_long()
    });
    let defs = vec![ParameterDef::new("wobble", 1.0, 2.0, 1.0)];
    let result = optimize(
        &strategy,
        &defs,
        &trade_count,
        &bars,
        &OptimizeOptions::default(),
    );
    assert!(matches!(
        result,
        Err(OptimizeError::UnknownParameter { .. })
    ));
}

// ─── Hill climb ──────────────────────────────────────────────────────

fn hill_climb_options(seed: u64) -> OptimizeOptions {
    OptimizeOptions {
        optimization_type: OptimizationType::HillClimb,
        random_seed: seed,
        record_all_results: true,
        ..Default::default()
    }
}

#[test]
fn hill_climb_walks_to_the_optimum() {
    let bars = flat_bars(12);
    let strategy = stop_strategy();
    let defs = vec![ParameterDef::new("stop", 2.0, 10.0, 2.0)];

    // The landscape strictly improves toward the smallest stop, so every
    // restart slides there.
    let result = optimize(
        &strategy,
        &defs,
        &neg_stop_distance,
        &bars,
        &hill_climb_options(7),
    )
    .unwrap();
    assert_eq!(result.best_parameter_values["stop"], 2.0);
    assert_eq!(result.best_result, -2.0);
}

#[test]
fn hill_climb_is_seed_deterministic_and_caches() {
    let bars = flat_bars(12);
    let strategy = stop_strategy();
    let defs = vec![
        ParameterDef::new("stop", 2.0, 10.0, 2.0),
        ParameterDef::new("unused", 1.0, 3.0, 1.0),
    ];

    let a = optimize(
        &strategy,
        &defs,
        &neg_stop_distance,
        &bars,
        &hill_climb_options(42),
    )
    .unwrap();
    let b = optimize(
        &strategy,
        &defs,
        &neg_stop_distance,
        &bars,
        &hill_climb_options(42),
    )
    .unwrap();
    assert_eq!(a.best_parameter_values, b.best_parameter_values);
    assert_eq!(a.all_results, b.all_results);

    // The evaluation cache keeps coordinates unique in the history.
    let all = a.all_results.unwrap();
    let mut seen = std::collections::BTreeSet::new();
    for record in &all {
        let key = format!("{:?}", record.parameter_values);
        assert!(seen.insert(key), "coordinate evaluated twice");
    }
}

#[test]
fn hill_climb_requires_starting_points() {
    let bars = flat_bars(12);
    let strategy = stop_strategy();
    let defs = vec![ParameterDef::new("stop", 2.0, 6.0, 2.0)];
    let options = OptimizeOptions {
        optimization_type: OptimizationType::HillClimb,
        num_starting_points: 0,
        ..Default::default()
    };
    let result = optimize(&strategy, &defs, &trade_count, &bars, &options);
    assert!(matches!(result, Err(OptimizeError::NoStartingPoints)));
}

// ─── Walk-forward ────────────────────────────────────────────────────

#[test]
fn walk_forward_concatenates_out_of_sample_trades() -> anyhow::Result<()> {
    let bars = flat_bars(40);
    let strategy = stop_strategy();
    let defs = vec![ParameterDef::new("stop", 2.0, 4.0, 2.0)];

    let result = walk_forward_optimize(
        &strategy,
        &defs,
        &trade_count,
        &bars,
        10,
        5,
        &WalkForwardOptions::default(),
    )?;

    assert_eq!(result.windows.len(), 6);
    for window in &result.windows {
        // In-sample always prefers the tight stop.
        assert_eq!(window.best_parameter_values["stop"], 2.0);
    }
    let total: usize = result.windows.iter().map(|w| w.out_trade_count).sum();
    assert_eq!(total, result.trades.len());
    assert!(!result.trades.is_empty());

    // Trades arrive in window order.
    for pair in result.trades.windows(2) {
        assert!(pair[1].entry_date >= pair[0].entry_date);
    }
    Ok(())
}

#[test]
fn walk_forward_is_deterministic() {
    let bars = flat_bars(40);
    let strategy = stop_strategy();
    let defs = vec![ParameterDef::new("stop", 2.0, 6.0, 2.0)];
    let options = WalkForwardOptions {
        optimize: OptimizeOptions {
            optimization_type: OptimizationType::HillClimb,
            random_seed: 9,
            ..Default::default()
        },
    };

    let a = walk_forward_optimize(&strategy, &defs, &trade_count, &bars, 10, 5, &options).unwrap();
    let b = walk_forward_optimize(&strategy, &defs, &trade_count, &bars, 10, 5, &options).unwrap();
    assert_eq!(a, b);
}

// ─── Monte Carlo + reductions over real output ───────────────────────

#[test]
fn monte_carlo_over_backtest_output() {
    let bars = flat_bars(24);
    let strategy = stop_strategy(); // stop 4 never hit: one finalize trade
    let trades = backtest(&strategy, &bars, &BacktestOptions::default()).unwrap();
    assert!(!trades.is_empty());

    let samples = monte_carlo(&trades, 20, 10, &MonteCarloOptions { random_seed: 3 });
    assert_eq!(samples.len(), 20);
    for sample in &samples {
        assert_eq!(sample.len(), 10);
        for draw in sample {
            assert!(trades.iter().any(|t| t == draw));
        }
    }
}

#[test]
fn equity_reductions_over_backtest_output() {
    let bars = flat_bars(12);
    let strategy = Strategy::new(Params::new().with("stop", 2.0), |signal: &mut EntrySignal, _| {
        signal.enter_long()
    })
    .with_stop_loss(|ctx| ctx.parameters.get("stop").unwrap_or(2.0));

    let trades = backtest(&strategy, &bars, &BacktestOptions::default()).unwrap();
    assert!(trades.len() > 1);

    let curve = compute_equity_curve(10_000.0, &trades).unwrap();
    assert_eq!(curve.len(), trades.len() + 1);
    for (i, trade) in trades.iter().enumerate() {
        assert!((curve[i + 1] - curve[i] * trade.growth).abs() < 1e-9);
    }

    let drawdown = compute_drawdown(10_000.0, &trades).unwrap();
    assert_eq!(drawdown.len(), curve.len());
    assert!(drawdown.iter().all(|&d| d <= 0.0));

    let stats = TradeStats::compute(&trades);
    assert_eq!(stats.trade_count, trades.len());
    assert_eq!(stats.winners + stats.losers, stats.trade_count);
}
