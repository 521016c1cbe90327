//! Engine options and the per-bar state of the trading book.

use serde::{Deserialize, Serialize};

use crate::domain::{Position, TradeDirection};

/// Recording switches for a single backtest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestOptions {
    /// Record the stop level on each bar. Only a trailing stop produces a
    /// series; a fixed stop never changes, so nothing is recorded for it.
    pub record_stop_price: bool,
    /// Record the risk percentage on each bar a stop is armed.
    pub record_risk: bool,
}

/// Book state carried across bars.
///
/// A position exists exactly in `Open` and `PendingExit`, so "update a
/// position that does not exist" is unrepresentable.
#[derive(Debug)]
pub(crate) enum EngineState {
    /// No position and no pending intent.
    Idle,
    /// Entry signaled; fills at a later bar's open, optionally gated on a
    /// price level trading first.
    AwaitingEntry {
        direction: TradeDirection,
        conditional_entry_price: Option<f64>,
    },
    /// Position held and managed bar by bar.
    Open(Position),
    /// Exit rule fired; fills at the next bar's open.
    PendingExit(Position),
}
