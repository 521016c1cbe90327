//! # rulelab runner
//!
//! Optimization layers over the rulelab-core backtest:
//!
//! - `optimize`: grid or hill-climb parameter search against an objective
//! - `walk_forward_optimize`: sliding in/out-of-sample evaluation
//! - `monte_carlo`: with-replacement trade resampling
//! - `metrics`: equity curve, drawdown, and trade statistics

pub mod hill_climb;
pub mod metrics;
pub mod monte_carlo;
pub mod objective;
pub mod optimize;
pub mod sweep;
pub mod walk_forward;

pub use hill_climb::hill_climb_search;
pub use metrics::{
    compute_drawdown, compute_equity_curve, profit_factor, win_rate, AnalysisError, TradeStats,
};
pub use monte_carlo::{monte_carlo, MonteCarloOptions};
pub use objective::{Objective, SearchDirection};
pub use optimize::{
    optimize, IterationRecord, OptimizationType, OptimizeError, OptimizeOptions, OptimizeResult,
};
pub use sweep::{grid_search, ParameterDef};
pub use walk_forward::{
    walk_forward_optimize, WalkForwardError, WalkForwardOptions, WalkForwardResult, WindowRecord,
};
