//! Job model: identifiers, parameter sets, and the dispatch record that
//! travels through a pool's input queue.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Opaque, totally ordered job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A single named scalar in a parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Numeric value (temperatures, intensities, voltages, overrides).
    Number(f64),
    /// Text value (definition file names).
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Mapping of named simulation parameters.
///
/// Backed by a `BTreeMap` so iteration and serialization order is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParamValue>);

impl ParameterSet {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Look up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Required numeric parameter.
    pub fn number(&self, key: &str) -> Result<f64, SimError> {
        match self.get(key) {
            Some(ParamValue::Number(v)) => Ok(*v),
            Some(ParamValue::Text(_)) => Err(SimError::InvalidParameter {
                key: key.to_string(),
                expected: "a number",
            }),
            None => Err(SimError::MissingParameter(key.to_string())),
        }
    }

    /// Optional numeric parameter with a default. A present value of the
    /// wrong kind is still an error.
    pub fn number_or(&self, key: &str, default: f64) -> Result<f64, SimError> {
        if self.get(key).is_none() {
            return Ok(default);
        }
        self.number(key)
    }

    /// Required text parameter.
    pub fn text(&self, key: &str) -> Result<&str, SimError> {
        match self.get(key) {
            Some(ParamValue::Text(v)) => Ok(v),
            Some(ParamValue::Number(_)) => Err(SimError::InvalidParameter {
                key: key.to_string(),
                expected: "text",
            }),
            None => Err(SimError::MissingParameter(key.to_string())),
        }
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One unit of work: an identifier plus the parameters to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub parameters: ParameterSet,
}

impl Job {
    #[must_use]
    pub fn new(id: impl Into<JobId>, parameters: ParameterSet) -> Self {
        Self {
            id: id.into(),
            parameters,
        }
    }
}

/// Item pulled from a pool's input queue.
///
/// `Done` is the sentinel: a worker that receives it terminates. It is never
/// a computation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Run(Job),
    Done,
}

impl Dispatch {
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_lookup() {
        let params = ParameterSet::new()
            .with("def", "CdTe-base.def")
            .with("T_l", 300.0);
        assert_eq!(params.text("def").unwrap(), "CdTe-base.def");
        assert!((params.number("T_l").unwrap() - 300.0).abs() < f64::EPSILON);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let params = ParameterSet::new();
        assert!(matches!(
            params.number("T_l"),
            Err(SimError::MissingParameter(k)) if k == "T_l"
        ));
        assert!(matches!(params.text("def"), Err(SimError::MissingParameter(_))));
    }

    #[test]
    fn wrong_kind_is_an_error() {
        let params = ParameterSet::new().with("T_l", "hot").with("def", 1.0);
        assert!(matches!(
            params.number("T_l"),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(matches!(
            params.text("def"),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(params.number_or("T_l", 1.0).is_err());
    }

    #[test]
    fn number_or_defaults_when_absent() {
        let params = ParameterSet::new();
        assert!((params.number_or("V_step", 0.02).unwrap() - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn parameters_deserialize_from_json() {
        let params: ParameterSet =
            serde_json::from_str(r#"{"def": "SnS_base.scaps", "T_l": 280, "ill_l": 108.5}"#)
                .unwrap();
        assert_eq!(params.text("def").unwrap(), "SnS_base.scaps");
        assert!((params.number("T_l").unwrap() - 280.0).abs() < f64::EPSILON);
        assert!((params.number("ill_l").unwrap() - 108.5).abs() < f64::EPSILON);
    }

    #[test]
    fn job_id_ordering_and_display() {
        assert!(JobId(1) < JobId(2));
        assert_eq!(JobId(42).to_string(), "42");
    }

    #[test]
    fn sentinel() {
        assert!(Dispatch::Done.is_sentinel());
        assert!(!Dispatch::Run(Job::new(0, ParameterSet::new())).is_sentinel());
    }
}
