//! Objective functions and search direction.

use serde::{Deserialize, Serialize};

use rulelab_core::Trade;

/// Reduction from a trade list to the scalar being optimized.
pub type Objective = dyn Fn(&[Trade]) -> f64 + Sync;

/// Whether the optimizer maximizes or minimizes the objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchDirection {
    #[default]
    Max,
    Min,
}

impl SearchDirection {
    /// Strict improvement test. Ties never displace the incumbent, so the
    /// first coordinate to reach the optimum wins.
    pub fn accepts(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            SearchDirection::Max => candidate > incumbent,
            SearchDirection::Min => candidate < incumbent,
        }
    }
}
