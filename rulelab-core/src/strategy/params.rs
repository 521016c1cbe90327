//! Parameter buckets — named real-valued knobs the optimizers overlay.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named-value access to a strategy's parameters.
///
/// The optimizers clone the bucket and overlay one value per search axis.
/// `set` returns `false` for a name the bucket does not recognize, which the
/// optimizers surface as a validation error. A typed parameter record can
/// implement this directly by matching names to fields; [`Params`] is the
/// map-backed default.
pub trait ParameterSet: Clone {
    fn set(&mut self, name: &str, value: f64) -> bool;
    fn get(&self, name: &str) -> Option<f64>;
}

/// Map-backed parameter bucket.
///
/// Backed by a `BTreeMap` so iteration and serialization order never depend
/// on hash state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params(BTreeMap<String, f64>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, &value)| (name.as_str(), value))
    }
}

impl ParameterSet for Params {
    fn set(&mut self, name: &str, value: f64) -> bool {
        self.0.insert(name.to_string(), value);
        true
    }

    fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }
}

impl FromIterator<(String, f64)> for Params {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
