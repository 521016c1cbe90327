//! Borrowed views handed to rule callbacks each bar.

use crate::domain::Position;

/// Context for the entry rule. No position is open when it runs.
pub struct EntryContext<'a, P, I> {
    /// The bar being evaluated.
    pub bar: &'a I,
    /// The most recent `lookback_period` bars, oldest first, current bar last.
    pub lookback: &'a [I],
    pub parameters: &'a P,
}

/// Context for the exit rule. A position is open when it runs.
pub struct ExitContext<'a, P, I> {
    pub bar: &'a I,
    pub lookback: &'a [I],
    pub entry_price: f64,
    pub position: &'a Position,
    pub parameters: &'a P,
}

/// Context for the stop-loss, trailing-stop, and profit-target functions.
///
/// Each returns a non-negative distance from the relevant reference price;
/// the engine converts distance to a level using the trade direction.
pub struct RiskContext<'a, P, I> {
    pub entry_price: f64,
    pub position: &'a Position,
    pub bar: &'a I,
    pub lookback: &'a [I],
    pub parameters: &'a P,
}
