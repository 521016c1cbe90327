//! Domain types for rulelab.

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::{Bar, BarData};
pub use position::{Position, TimedValue, TradeDirection};
pub use trade::{ExitReason, Trade};
