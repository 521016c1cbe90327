//! rulelab core — domain types, strategy contract, and the backtest engine.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, positions, trades)
//! - Strategy contract: rule closures over a parameter bucket, one-shot
//!   entry/exit intents, distance-based stops and targets
//! - Lookback window handed to rules
//! - Single-pass backtest state machine with exit-reason attribution
//! - Deterministic seed derivation for the optimization layers

pub mod domain;
pub mod engine;
pub mod rng;
pub mod strategy;

pub use domain::{Bar, BarData, ExitReason, Position, TimedValue, Trade, TradeDirection};
pub use engine::{backtest, backtest_with, BacktestOptions, EngineError};
pub use rng::SeedSequence;
pub use strategy::{
    EntryContext, EntrySignal, ExitContext, ExitSignal, ParameterSet, Params, RiskContext,
    Strategy,
};
