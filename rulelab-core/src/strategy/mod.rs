//! Strategy contract — rule closures over a parameter bucket.
//!
//! A strategy owns its parameters and up to six callbacks: an indicator
//! precompute, an entry rule, an optional exit rule, and optional stop-loss /
//! trailing-stop / profit-target distance functions. The engine monomorphizes
//! over the parameter type `P` and indicator bar type `I`, so rule dispatch
//! costs a boxed call, not a downcast.

pub mod context;
pub mod params;
pub mod signal;

pub use context::{EntryContext, ExitContext, RiskContext};
pub use params::{ParameterSet, Params};
pub use signal::{EntrySignal, ExitSignal};

use crate::domain::Bar;

/// Produces one indicator bar per input bar, preserving order and index.
pub type PrepIndicatorsFn<P, I> = Box<dyn Fn(&P, &[Bar]) -> Vec<I> + Send + Sync>;
/// Entry rule, invoked only while no position is open.
pub type EntryRuleFn<P, I> = Box<dyn Fn(&mut EntrySignal, &EntryContext<'_, P, I>) + Send + Sync>;
/// Exit rule, invoked while a position is open.
pub type ExitRuleFn<P, I> = Box<dyn Fn(&mut ExitSignal, &ExitContext<'_, P, I>) + Send + Sync>;
/// Distance function for stops and profit targets.
pub type DistanceFn<P, I> = Box<dyn Fn(&RiskContext<'_, P, I>) -> f64 + Send + Sync>;

/// A rule-based trading strategy.
pub struct Strategy<P, I = Bar> {
    pub parameters: P,
    lookback_period: usize,
    pub(crate) prep_indicators: PrepIndicatorsFn<P, I>,
    pub(crate) entry_rule: EntryRuleFn<P, I>,
    pub(crate) exit_rule: Option<ExitRuleFn<P, I>>,
    pub(crate) stop_loss: Option<DistanceFn<P, I>>,
    pub(crate) trailing_stop_loss: Option<DistanceFn<P, I>>,
    pub(crate) profit_target: Option<DistanceFn<P, I>>,
}

impl<P> Strategy<P, Bar> {
    /// Strategy whose rules read raw bars, with no indicator precompute.
    pub fn new<F>(parameters: P, entry_rule: F) -> Self
    where
        F: Fn(&mut EntrySignal, &EntryContext<'_, P, Bar>) + Send + Sync + 'static,
    {
        Self {
            parameters,
            lookback_period: 1,
            prep_indicators: Box::new(|_, bars| bars.to_vec()),
            entry_rule: Box::new(entry_rule),
            exit_rule: None,
            stop_loss: None,
            trailing_stop_loss: None,
            profit_target: None,
        }
    }
}

impl<P, I> Strategy<P, I> {
    /// Strategy whose rules read precomputed indicator bars.
    ///
    /// `prep_indicators` must return exactly one indicator bar per input bar,
    /// in the same order; the engine rejects a length mismatch.
    pub fn with_indicators<Prep, F>(parameters: P, prep_indicators: Prep, entry_rule: F) -> Self
    where
        Prep: Fn(&P, &[Bar]) -> Vec<I> + Send + Sync + 'static,
        F: Fn(&mut EntrySignal, &EntryContext<'_, P, I>) + Send + Sync + 'static,
    {
        Self {
            parameters,
            lookback_period: 1,
            prep_indicators: Box::new(prep_indicators),
            entry_rule: Box::new(entry_rule),
            exit_rule: None,
            stop_loss: None,
            trailing_stop_loss: None,
            profit_target: None,
        }
    }

    /// Minimum number of bars that must be available before rules run.
    pub fn with_lookback(mut self, period: usize) -> Self {
        self.lookback_period = period;
        self
    }

    pub fn with_exit_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&mut ExitSignal, &ExitContext<'_, P, I>) + Send + Sync + 'static,
    {
        self.exit_rule = Some(Box::new(rule));
        self
    }

    /// Fixed stop: distance from the entry price, armed on the entry bar.
    pub fn with_stop_loss<F>(mut self, distance: F) -> Self
    where
        F: Fn(&RiskContext<'_, P, I>) -> f64 + Send + Sync + 'static,
    {
        self.stop_loss = Some(Box::new(distance));
        self
    }

    /// Trailing stop: distance from each bar close, ratcheted tighter only.
    pub fn with_trailing_stop<F>(mut self, distance: F) -> Self
    where
        F: Fn(&RiskContext<'_, P, I>) -> f64 + Send + Sync + 'static,
    {
        self.trailing_stop_loss = Some(Box::new(distance));
        self
    }

    /// Profit target: distance from the entry price, armed on the entry bar.
    pub fn with_profit_target<F>(mut self, distance: F) -> Self
    where
        F: Fn(&RiskContext<'_, P, I>) -> f64 + Send + Sync + 'static,
    {
        self.profit_target = Some(Box::new(distance));
        self
    }

    pub fn lookback_period(&self) -> usize {
        self.lookback_period
    }

    pub(crate) fn indicator_series(&self, parameters: &P, bars: &[Bar]) -> Vec<I> {
        (self.prep_indicators)(parameters, bars)
    }
}
