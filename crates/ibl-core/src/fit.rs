//! Grid-search maximum-likelihood estimation.
//!
//! Evaluates a log-likelihood at every point of a cartesian parameter grid
//! and keeps the best one. Deterministic and embarrassingly simple; good
//! enough for the two or three parameters these models have.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::{ensure_finite, ErrorCode, IblError, IblResult};

/// Named parameter values, as passed to the objective.
pub type Parameters = BTreeMap<String, f64>;

/// Values to try for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl ParameterAxis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> IblResult<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(IblError::empty(format!("values of parameter '{}'", name)));
        }
        for &v in &values {
            ensure_finite(&name, v)?;
        }
        Ok(Self { name, values })
    }

    /// `n` evenly spaced values from `lo` to `hi` inclusive.
    pub fn linspace(name: impl Into<String>, lo: f64, hi: f64, n: usize) -> IblResult<Self> {
        let values = match n {
            0 => Vec::new(),
            1 => vec![lo],
            _ => {
                let step = (hi - lo) / (n - 1) as f64;
                (0..n).map(|i| lo + step * i as f64).collect()
            }
        };
        Self::new(name, values)
    }

    /// Parse `lo:hi:n` (or a single value) into an axis.
    pub fn parse(name: impl Into<String>, range: &str) -> IblResult<Self> {
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|e| IblError::parse(format!("'{}' in range '{}': {}", s, range, e)))
        };
        let parts: Vec<&str> = range.split(':').collect();
        match parts.as_slice() {
            [single] => Self::new(name, vec![parse(*single)?]),
            [lo, hi, n] => {
                let n = n
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| IblError::parse(format!("count in range '{}': {}", range, e)))?;
                Self::linspace(name, parse(*lo)?, parse(*hi)?, n)
            }
            _ => Err(IblError::parse(format!(
                "range '{}' must be 'value' or 'lo:hi:n'",
                range
            ))),
        }
    }
}

/// Objective value at one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub params: Parameters,
    pub log_likelihood: f64,
}

/// Outcome of a grid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Maximum-likelihood parameter values.
    pub best: Parameters,
    /// Log-likelihood at `best`.
    pub log_likelihood: f64,
    /// Every successfully evaluated point, in grid order.
    pub points: Vec<GridPoint>,
    /// Points whose objective returned an error.
    pub failed: usize,
}

/// Exhaustive search over the cartesian product of parameter axes.
#[derive(Debug, Clone)]
pub struct GridSearch {
    axes: Vec<ParameterAxis>,
}

impl GridSearch {
    pub fn new(axes: Vec<ParameterAxis>) -> IblResult<Self> {
        if axes.is_empty() {
            return Err(IblError::empty("parameter axes"));
        }
        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].iter().any(|a| a.name == axis.name) {
                return Err(IblError::validation(format!(
                    "parameter '{}' appears twice",
                    axis.name
                )));
            }
        }
        Ok(Self { axes })
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn point(&self, mut index: usize) -> Parameters {
        // mixed radix, last axis varies fastest
        let mut params = Parameters::new();
        for axis in self.axes.iter().rev() {
            let n = axis.values.len();
            params.insert(axis.name.clone(), axis.values[index % n]);
            index /= n;
        }
        params
    }

    /// Evaluate `objective` everywhere and return the maximum.
    ///
    /// Points where the objective errors are skipped and counted; NaN
    /// results are skipped likewise. Fails when no point yields a value
    /// above negative infinity.
    pub fn run<F>(&self, mut objective: F) -> IblResult<FitResult>
    where
        F: FnMut(&Parameters) -> IblResult<f64>,
    {
        let mut points: Vec<GridPoint> = Vec::with_capacity(self.len());
        let mut failed = 0;
        let mut best: Option<usize> = None;

        for index in 0..self.len() {
            let params = self.point(index);
            let log_likelihood = match objective(&params) {
                Ok(ll) if !ll.is_nan() => ll,
                Ok(_) => {
                    warn!(?params, "objective returned NaN");
                    failed += 1;
                    continue;
                }
                Err(e) => {
                    warn!(?params, error = %e, "objective failed");
                    failed += 1;
                    continue;
                }
            };
            debug!(?params, log_likelihood, "grid point");

            let is_better = match best {
                Some(b) => log_likelihood > points[b].log_likelihood,
                None => log_likelihood > f64::NEG_INFINITY,
            };
            if is_better {
                best = Some(points.len());
            }
            points.push(GridPoint {
                params,
                log_likelihood,
            });
        }

        let Some(best) = best else {
            return Err(IblError::Numerical {
                message: format!(
                    "no grid point produced a finite log-likelihood ({} evaluated, {} failed)",
                    points.len(),
                    failed
                ),
                code: ErrorCode::NumNoFiniteValue,
            });
        };

        let result = FitResult {
            best: points[best].params.clone(),
            log_likelihood: points[best].log_likelihood,
            points,
            failed,
        };
        info!(best = ?result.best, log_likelihood = result.log_likelihood, "grid search complete");
        Ok(result)
    }
}
