//! Per-feature rescaling.
//!
//! Dense inputs are shifted and scaled. Sparse inputs are only scaled so that
//! implicit zeros stay zero: `min/max` divides by the largest absolute value,
//! `standard` by the standard deviation.

use super::{Capability, Component, ComponentProperties, Transformer, check_n_features};
use crate::error::{HyperkitError, Result};
use crate::matrix::FeatureMatrix;
use crate::space::{Configuration, ConfigurationSpace, Hyperparameter};
use ndarray::Array1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescalingStrategy {
    MinMax,
    Standard,
}

impl RescalingStrategy {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "min/max" => Ok(Self::MinMax),
            "standard" => Ok(Self::Standard),
            other => Err(HyperkitError::invalid_hyperparameter(format!(
                "unknown rescaling strategy '{other}'"
            ))),
        }
    }
}

/// `value -> (value - offset[col]) / scale[col]`
#[derive(Debug, Clone)]
struct Affine {
    offset: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Rescaling {
    strategy: RescalingStrategy,
    fitted: Option<Affine>,
}

impl Rescaling {
    pub fn new(strategy: RescalingStrategy) -> Self {
        Self {
            strategy,
            fitted: None,
        }
    }
}

impl Component for Rescaling {
    fn properties() -> ComponentProperties {
        ComponentProperties {
            name: "rescaling",
            full_name: "Rescaling",
            capabilities: &[Capability::Transformer],
            handles_sparse: true,
            handles_missing_values: true,
        }
    }

    fn search_space() -> Result<ConfigurationSpace> {
        ConfigurationSpace::new().with(Hyperparameter::categorical(
            "strategy",
            &["min/max", "standard"],
            "min/max",
        ))
    }

    fn from_configuration(config: &Configuration, _random_state: u64) -> Result<Self> {
        Ok(Self::new(RescalingStrategy::parse(config.get_str("strategy")?)?))
    }
}

impl Transformer for Rescaling {
    fn fit(&mut self, x: &FeatureMatrix, _y: Option<&Array1<f64>>) -> Result<()> {
        let sparse = x.is_sparse();
        let dense = x.to_dense_f64();
        let mut offset = Vec::with_capacity(dense.ncols());
        let mut scale = Vec::with_capacity(dense.ncols());

        for column in dense.columns() {
            let values: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
            let (o, s) = match (self.strategy, sparse) {
                (RescalingStrategy::MinMax, false) => {
                    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    if values.is_empty() {
                        (0.0, 1.0)
                    } else {
                        (min, max - min)
                    }
                }
                (RescalingStrategy::MinMax, true) => {
                    let max_abs = values.iter().map(|v| v.abs()).fold(0.0, f64::max);
                    (0.0, max_abs)
                }
                (RescalingStrategy::Standard, scale_only) => {
                    let (mean, std) = mean_std(&values);
                    (if scale_only { 0.0 } else { mean }, std)
                }
            };
            offset.push(o);
            // Constant features are left unscaled.
            scale.push(if s == 0.0 || !s.is_finite() { 1.0 } else { s });
        }

        self.fitted = Some(Affine { offset, scale });
        Ok(())
    }

    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix> {
        let affine = self
            .fitted
            .as_ref()
            .ok_or_else(|| HyperkitError::not_fitted(Self::properties().name))?;
        check_n_features(affine.scale.len(), x)?;
        x.map_entries(|col, v| (v - affine.offset[col]) / affine.scale[col])
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
