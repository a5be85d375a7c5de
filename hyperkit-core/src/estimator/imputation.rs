//! Missing-value imputation. NaN entries are replaced per feature.

use super::{Capability, Component, ComponentProperties, Transformer, check_n_features};
use crate::error::{HyperkitError, Result};
use crate::matrix::FeatureMatrix;
use crate::space::{Configuration, ConfigurationSpace, Hyperparameter};
use ndarray::Array1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputationStrategy {
    Mean,
    Median,
    MostFrequent,
}

impl ImputationStrategy {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "most_frequent" => Ok(Self::MostFrequent),
            other => Err(HyperkitError::invalid_hyperparameter(format!(
                "unknown imputation strategy '{other}'"
            ))),
        }
    }

    /// Statistic over the observed values of one feature; 0 when none were
    /// observed.
    fn statistic(self, mut observed: Vec<f64>) -> f64 {
        if observed.is_empty() {
            return 0.0;
        }
        observed.sort_by(f64::total_cmp);
        match self {
            Self::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
            Self::Median => {
                let mid = observed.len() / 2;
                if observed.len() % 2 == 0 {
                    (observed[mid - 1] + observed[mid]) / 2.0
                } else {
                    observed[mid]
                }
            }
            Self::MostFrequent => {
                // Sorted, so equal values are adjacent; ties keep the smallest.
                let mut best = observed[0];
                let mut best_run = 0;
                let mut start = 0;
                while start < observed.len() {
                    let end = observed[start..]
                        .iter()
                        .position(|&v| v != observed[start])
                        .map_or(observed.len(), |off| start + off);
                    if end - start > best_run {
                        best_run = end - start;
                        best = observed[start];
                    }
                    start = end;
                }
                best
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Imputation {
    strategy: ImputationStrategy,
    statistics: Option<Vec<f64>>,
}

impl Imputation {
    pub fn new(strategy: ImputationStrategy) -> Self {
        Self {
            strategy,
            statistics: None,
        }
    }

    pub fn statistics(&self) -> Option<&[f64]> {
        self.statistics.as_deref()
    }
}

impl Component for Imputation {
    fn properties() -> ComponentProperties {
        ComponentProperties {
            name: "imputation",
            full_name: "Imputation",
            capabilities: &[Capability::Transformer],
            handles_sparse: true,
            handles_missing_values: true,
        }
    }

    fn search_space() -> Result<ConfigurationSpace> {
        ConfigurationSpace::new().with(Hyperparameter::categorical(
            "strategy",
            &["mean", "median", "most_frequent"],
            "mean",
        ))
    }

    fn from_configuration(config: &Configuration, _random_state: u64) -> Result<Self> {
        Ok(Self::new(ImputationStrategy::parse(config.get_str("strategy")?)?))
    }
}

impl Transformer for Imputation {
    /// Implicit zeros of sparse inputs count as observed values.
    fn fit(&mut self, x: &FeatureMatrix, _y: Option<&Array1<f64>>) -> Result<()> {
        let dense = x.to_dense_f64();
        let statistics = dense
            .columns()
            .into_iter()
            .map(|col| {
                self.strategy
                    .statistic(col.iter().copied().filter(|v| !v.is_nan()).collect())
            })
            .collect();
        self.statistics = Some(statistics);
        Ok(())
    }

    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix> {
        let statistics = self
            .statistics
            .as_ref()
            .ok_or_else(|| HyperkitError::not_fitted(Self::properties().name))?;
        check_n_features(statistics.len(), x)?;
        x.map_entries(|col, v| if v.is_nan() { statistics[col] } else { v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Dtype;
    use ndarray::array;

    #[test]
    fn test_strategies() {
        let values = vec![1.0, 2.0, 2.0, 7.0];
        assert_eq!(ImputationStrategy::Mean.statistic(values.clone()), 3.0);
        assert_eq!(ImputationStrategy::Median.statistic(values.clone()), 2.0);
        assert_eq!(ImputationStrategy::MostFrequent.statistic(values), 2.0);
        assert_eq!(ImputationStrategy::MostFrequent.statistic(vec![3.0, 1.0]), 1.0);
        assert_eq!(ImputationStrategy::Median.statistic(vec![]), 0.0);
    }

    #[test]
    fn test_fills_nan_dense() {
        let x = FeatureMatrix::Dense32(array![[1.0, f32::NAN], [f32::NAN, 4.0], [3.0, 6.0]]);
        let mut imp = Imputation::with_defaults(1).unwrap();
        let out = imp.fit_transform(&x, None).unwrap();
        assert_eq!(out.dtype(), Dtype::Float32);
        assert_eq!(out.to_dense_f64(), array![[1.0, 5.0], [2.0, 4.0], [3.0, 6.0]]);
        assert_eq!(imp.statistics().unwrap(), &[2.0, 5.0]);
    }

    #[test]
    fn test_fills_nan_sparse() {
        let x = FeatureMatrix::Dense64(array![[0.0, f64::NAN], [4.0, 2.0]])
            .to_sparse()
            .unwrap();
        let mut imp = Imputation::with_defaults(1).unwrap();
        let out = imp.fit_transform(&x, None).unwrap();
        assert!(out.is_sparse());
        assert_eq!(out.to_dense_f64(), array![[0.0, 2.0], [4.0, 2.0]]);
    }

    #[test]
    fn test_all_missing_column_filled_with_zero() {
        let x = FeatureMatrix::Dense64(array![[f64::NAN], [f64::NAN]]);
        let mut imp = Imputation::new(ImputationStrategy::Median);
        let out = imp.fit_transform(&x, None).unwrap();
        assert_eq!(out.to_dense_f64(), array![[0.0], [0.0]]);
    }
}
