//! Hill climbing — random restarts with first-improvement local steps.
//!
//! Each restart draws a coordinate uniformly from the grid, then walks to
//! the first neighbor that strictly improves on the working result,
//! restarting the neighbor scan from the new point until no neighbor
//! improves. Neighbors are one step along each axis: all positive
//! perturbations first, axes in definition order, then all negative ones.
//! A per-run cache keyed by grid indices avoids re-running the backtest,
//! and the global best is updated on every fresh evaluation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};

use rulelab_core::{backtest_with, BacktestOptions, Bar, BarData, ParameterSet, Strategy};

use crate::objective::Objective;
use crate::optimize::{
    named_values, overlay_parameters, validate_parameters, IterationRecord, OptimizeError,
    OptimizeOptions, OptimizeResult,
};
use crate::sweep::ParameterDef;

/// Run the hill climb and return the best coordinate seen.
pub fn hill_climb_search<P, I>(
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
    if options.num_starting_points == 0 {
        return Err(OptimizeError::NoStartingPoints);
    }

    let axes: Vec<Vec<f64>> = parameter_defs.iter().map(ParameterDef::values).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(options.random_seed);

    let mut cache: HashMap<Vec<usize>, f64> = HashMap::new();
    let mut history: Vec<(Vec<usize>, f64)> = Vec::new();
    let mut best: Option<(Vec<usize>, f64)> = None;
    let mut visited_starts: HashSet<Vec<usize>> = HashSet::new();

    let mut evaluate = |coordinate: &Vec<usize>| -> Result<f64, OptimizeError> {
        if let Some(&metric) = cache.get(coordinate) {
            return Ok(metric);
        }
        let values: Vec<f64> = coordinate
            .iter()
            .zip(&axes)
            .map(|(&index, axis)| axis[index])
            .collect();
        let parameters = overlay_parameters(&strategy.parameters, parameter_defs, &values)?;
        let trades = backtest_with(strategy, &parameters, bars, &BacktestOptions::default())?;
        let metric = objective(&trades);
        cache.insert(coordinate.clone(), metric);
        history.push((coordinate.clone(), metric));
        let improves_best = match &best {
            None => true,
            Some((_, incumbent)) => options.search_direction.accepts(metric, *incumbent),
        };
        if improves_best {
            best = Some((coordinate.clone(), metric));
        }
        Ok(metric)
    };

    for restart in 0..options.num_starting_points {
        let start: Vec<usize> = axes
            .iter()
            .map(|axis| rng.gen_range(0..axis.len()))
            .collect();
        // A repeated draw consumes the restart rather than re-walking it.
        if !visited_starts.insert(start.clone()) {
            continue;
        }
        tracing::trace!(restart, "hill climb restart");

        let mut coordinate = start;
        let mut working = evaluate(&coordinate)?;
        loop {
            let mut improved = false;
            for neighbor in neighbors(&coordinate, &axes) {
                let metric = evaluate(&neighbor)?;
                if options.search_direction.accepts(metric, working) {
                    coordinate = neighbor;
                    working = metric;
                    improved = true;
                    break;
                }
            }
            if !improved {
                break;
            }
        }
    }

    let (best_coordinate, best_metric) = best.expect("at least one restart evaluates");
    let best_values: Vec<f64> = best_coordinate
        .iter()
        .zip(&axes)
        .map(|(&index, axis)| axis[index])
        .collect();

    tracing::info!(
        best = best_metric,
        evaluations = history.len(),
        "hill climb complete"
    );

    Ok(OptimizeResult {
        best_result: best_metric,
        best_parameter_values: named_values(parameter_defs, &best_values),
        all_results: options.record_all_results.then(|| {
            history
                .iter()
                .map(|(coordinate, metric)| IterationRecord {
                    parameter_values: named_values(
                        parameter_defs,
                        &coordinate
                            .iter()
                            .zip(&axes)
                            .map(|(&index, axis)| axis[index])
                            .collect::<Vec<f64>>(),
                    ),
                    result: *metric,
                })
                .collect()
        }),
        duration_ms: None,
    })
}

/// One step along each axis: positive perturbations first, then negative,
/// axes in definition order, bounds respected.
fn neighbors(coordinate: &[usize], axes: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    for axis in 0..coordinate.len() {
        if coordinate[axis] + 1 < axes[axis].len() {
            let mut next = coordinate.to_vec();
            next[axis] += 1;
            out.push(next);
        }
    }
    for axis in 0..coordinate.len() {
        if coordinate[axis] > 0 {
            let mut next = coordinate.to_vec();
            next[axis] -= 1;
            out.push(next);
        }
    }
    out
}
