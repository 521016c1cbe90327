//! Optimizer entry point — parameter search against the backtest oracle.
//!
//! `optimize` validates the parameter definitions, dispatches to grid search
//! or hill climbing, and stamps the wall-clock duration when asked. Both
//! searches share the coordinate→bucket overlay and the strict-improvement
//! acceptance rule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;

use rulelab_core::{Bar, BarData, ParameterSet, Strategy};

use crate::hill_climb::hill_climb_search;
use crate::objective::{Objective, SearchDirection};
use crate::sweep::{grid_search, ParameterDef};

/// Which search walks the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationType {
    #[default]
    Grid,
    HillClimb,
}

/// Options for [`optimize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeOptions {
    pub search_direction: SearchDirection,
    pub optimization_type: OptimizationType,
    /// Keep every evaluated coordinate in the result.
    pub record_all_results: bool,
    /// Measure the wall-clock duration of the search.
    pub record_duration: bool,
    /// Seed for the hill climb's starting-point draws.
    pub random_seed: u64,
    /// Random restarts for the hill climb.
    pub num_starting_points: usize,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            search_direction: SearchDirection::Max,
            optimization_type: OptimizationType::Grid,
            record_all_results: false,
            record_duration: false,
            random_seed: 0,
            num_starting_points: 4,
        }
    }
}

/// One evaluated coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub parameter_values: BTreeMap<String, f64>,
    pub result: f64,
}

/// Outcome of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub best_result: f64,
    pub best_parameter_values: BTreeMap<String, f64>,
    /// Every evaluated coordinate, in evaluation order. `None` unless
    /// `record_all_results` was set.
    pub all_results: Option<Vec<IterationRecord>>,
    pub duration_ms: Option<u64>,
}

/// Errors raised while validating or running an optimization.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("at least one parameter definition is required")]
    NoParameters,
    #[error("parameter {name:?}: step size must be positive, got {step_size}")]
    InvalidStepSize { name: String, step_size: f64 },
    #[error("parameter {name:?}: range bounds must be finite")]
    NonFiniteRange { name: String },
    #[error(
        "parameter {name:?}: ending value {ending_value} is below starting value {starting_value}"
    )]
    InvertedRange {
        name: String,
        starting_value: f64,
        ending_value: f64,
    },
    #[error("parameter {name:?} is not recognized by the strategy's parameter bucket")]
    UnknownParameter { name: String },
    #[error("hill climb requires at least one starting point")]
    NoStartingPoints,
    #[error(transparent)]
    Backtest(#[from] rulelab_core::EngineError),
}

/// Search the parameter grid for the best objective value.
pub fn optimize<P, I>(
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
    let started = Instant::now();

    let mut result = match options.optimization_type {
        OptimizationType::Grid => grid_search(strategy, parameter_defs, objective, bars, options)?,
        OptimizationType::HillClimb => {
            hill_climb_search(strategy, parameter_defs, objective, bars, options)?
        }
    };

    if options.record_duration {
        result.duration_ms = Some(started.elapsed().as_millis() as u64);
    }
    Ok(result)
}

pub(crate) fn validate_parameters(defs: &[ParameterDef]) -> Result<(), OptimizeError> {
    if defs.is_empty() {
        return Err(OptimizeError::NoParameters);
    }
    for def in defs {
        if !def.starting_value.is_finite() || !def.ending_value.is_finite() {
            return Err(OptimizeError::NonFiniteRange {
                name: def.name.clone(),
            });
        }
        if !(def.step_size > 0.0) {
            return Err(OptimizeError::InvalidStepSize {
                name: def.name.clone(),
                step_size: def.step_size,
            });
        }
        if def.ending_value < def.starting_value {
            return Err(OptimizeError::InvertedRange {
                name: def.name.clone(),
                starting_value: def.starting_value,
                ending_value: def.ending_value,
            });
        }
    }
    Ok(())
}

/// Clone the bucket and overlay one value per axis.
pub(crate) fn overlay_parameters<P: ParameterSet>(
    base: &P,
    defs: &[ParameterDef],
    values: &[f64],
) -> Result<P, OptimizeError> {
    let mut parameters = base.clone();
    for (def, &value) in defs.iter().zip(values) {
        if !parameters.set(&def.name, value) {
            return Err(OptimizeError::UnknownParameter {
                name: def.name.clone(),
            });
        }
    }
    Ok(parameters)
}

pub(crate) fn named_values(defs: &[ParameterDef], values: &[f64]) -> BTreeMap<String, f64> {
    defs.iter()
        .zip(values)
        .map(|(def, &value)| (def.name.clone(), value))
        .collect()
}
