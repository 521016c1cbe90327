//! Grid search — exhaustive sweep over parameter definitions.
//!
//! Coordinates are enumerated in nested order with the first definition as
//! the outermost axis. Evaluation fans out across rayon workers, but results
//! are collected back into enumeration order before the best-scan runs, so
//! the first coordinate to reach the optimum wins regardless of scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use rulelab_core::{backtest_with, BacktestOptions, Bar, BarData, ParameterSet, Strategy};

use crate::objective::Objective;
use crate::optimize::{
    named_values, overlay_parameters, validate_parameters, IterationRecord, OptimizeError,
    OptimizeOptions, OptimizeResult,
};

/// One axis of the search grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    pub starting_value: f64,
    pub ending_value: f64,
    pub step_size: f64,
}

impl ParameterDef {
    pub fn new(name: &str, starting_value: f64, ending_value: f64, step_size: f64) -> Self {
        Self {
            name: name.to_string(),
            starting_value,
            ending_value,
            step_size,
        }
    }

    /// Axis values: `start, start + step, …` while the value stays ≤ end.
    pub fn values(&self) -> Vec<f64> {
        let mut values = Vec::new();
        let mut value = self.starting_value;
        while value <= self.ending_value {
            values.push(value);
            value += self.step_size;
        }
        values
    }
}

struct Evaluation {
    values: Vec<f64>,
    metric: f64,
}

/// Exhaustively evaluate the grid and return the best coordinate.
pub fn grid_search<P, I>(
    strategy: &Strategy<P, I>,
    parameter_defs: &[ParameterDef],
    objective: &Objective,
    bars: &[Bar],
    options: &OptimizeOptions,
) -> Result<OptimizeResult, OptimizeError>
where
    P: ParameterSet + Send + Sync,
    I: BarData,
{
    validate_parameters(parameter_defs)?;
    let axes: Vec<Vec<f64>> = parameter_defs.iter().map(ParameterDef::values).collect();
    let total: usize = axes.iter().map(Vec::len).product();
    tracing::info!(coordinates = total, axes = axes.len(), "starting grid search");

    let evaluations = (0..total)
        .into_par_iter()
        .map(|rank| {
            let values = coordinate_values(&axes, rank);
            let parameters = overlay_parameters(&strategy.parameters, parameter_defs, &values)?;
            let trades = backtest_with(strategy, &parameters, bars, &BacktestOptions::default())?;
            let metric = objective(&trades);
            tracing::trace!(rank, metric, "evaluated coordinate");
            Ok(Evaluation { values, metric })
        })
        .collect::<Result<Vec<_>, OptimizeError>>()?;

    // Sequential scan in enumeration order; strict acceptance keeps the
    // earliest optimum on ties.
    let mut best = &evaluations[0];
    for evaluation in &evaluations[1..] {
        if options.search_direction.accepts(evaluation.metric, best.metric) {
            best = evaluation;
        }
    }

    tracing::info!(best = best.metric, "grid search complete");

    Ok(OptimizeResult {
        best_result: best.metric,
        best_parameter_values: named_values(parameter_defs, &best.values),
        all_results: options.record_all_results.then(|| {
            evaluations
                .iter()
                .map(|evaluation| IterationRecord {
                    parameter_values: named_values(parameter_defs, &evaluation.values),
                    result: evaluation.metric,
                })
                .collect()
        }),
        duration_ms: None,
    })
}

/// Decode a rank into axis values, first axis outermost.
fn coordinate_values(axes: &[Vec<f64>], rank: usize) -> Vec<f64> {
    let mut remaining = rank;
    let mut values = vec![0.0; axes.len()];
    for (i, axis) in axes.iter().enumerate().rev() {
        values[i] = axis[remaining % axis.len()];
        remaining /= axis.len();
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_walk_the_range_inclusive() {
        let def = ParameterDef::new("stop", 1.0, 3.0, 1.0);
        assert_eq!(def.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn values_stop_before_overshooting() {
        let def = ParameterDef::new("stop", 1.0, 2.5, 1.0);
        assert_eq!(def.values(), vec![1.0, 2.0]);
    }

    #[test]
    fn single_point_axis() {
        let def = ParameterDef::new("stop", 5.0, 5.0, 1.0);
        assert_eq!(def.values(), vec![5.0]);
    }

    #[test]
    fn enumeration_is_outer_axis_major() {
        let axes = vec![vec![1.0, 2.0], vec![10.0, 20.0, 30.0]];
        let coords: Vec<Vec<f64>> = (0..6).map(|rank| coordinate_values(&axes, rank)).collect();
        assert_eq!(
            coords,
            vec![
                vec![1.0, 10.0],
                vec![1.0, 20.0],
                vec![1.0, 30.0],
                vec![2.0, 10.0],
                vec![2.0, 20.0],
                vec![2.0, 30.0],
            ]
        );
    }
}
