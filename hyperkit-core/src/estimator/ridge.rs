//! Ridge regression solved through the regularised normal equations.

use super::{Capability, Component, ComponentProperties, Regressor, check_fit_input, check_n_features};
use crate::error::{HyperkitError, Result};
use crate::matrix::FeatureMatrix;
use crate::space::{Configuration, ConfigurationSpace, Hyperparameter, HyperparameterValue};
use ndarray::{Array1, Array2, Axis};

#[derive(Debug, Clone)]
pub struct RidgeRegression {
    alpha: f64,
    fit_intercept: bool,
    coef: Option<Array1<f64>>,
    intercept: f64,
}

impl RidgeRegression {
    pub fn new(alpha: f64, fit_intercept: bool) -> Self {
        Self {
            alpha,
            fit_intercept,
            coef: None,
            intercept: 0.0,
        }
    }

    pub fn coef(&self) -> Option<&Array1<f64>> {
        self.coef.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Component for RidgeRegression {
    fn properties() -> ComponentProperties {
        ComponentProperties {
            name: "ridge_regression",
            full_name: "Ridge Regression",
            capabilities: &[Capability::Regressor],
            handles_sparse: true,
            handles_missing_values: false,
        }
    }

    fn search_space() -> Result<ConfigurationSpace> {
        ConfigurationSpace::new()
            .with(Hyperparameter::log_uniform_float("alpha", 1e-5, 10.0, 1.0))?
            .with(Hyperparameter::constant(
                "fit_intercept",
                HyperparameterValue::Bool(true),
            ))
    }

    fn from_configuration(config: &Configuration, _random_state: u64) -> Result<Self> {
        let alpha = config.get_float("alpha")?;
        if alpha.is_nan() || alpha <= 0.0 {
            return Err(HyperkitError::invalid_hyperparameter(format!(
                "alpha must be positive, got {alpha}"
            )));
        }
        Ok(Self::new(alpha, config.get_bool("fit_intercept")?))
    }
}

impl Regressor for RidgeRegression {
    fn fit(&mut self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let mut x = x.to_dense_f64();
        let mut y = y.clone();

        let (x_mean, y_mean) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| HyperkitError::estimator("empty design matrix"))?;
            let y_mean = y.mean().unwrap_or(0.0);
            x -= &x_mean;
            y -= y_mean;
            (x_mean, y_mean)
        } else {
            (Array1::zeros(x.ncols()), 0.0)
        };

        let mut gram = x.t().dot(&x);
        for i in 0..gram.nrows() {
            gram[[i, i]] += self.alpha;
        }
        let rhs = x.t().dot(&y);
        let coef = solve(gram, rhs)?;

        self.intercept = y_mean - x_mean.dot(&coef);
        tracing::debug!(alpha = self.alpha, intercept = self.intercept, "Fitted ridge_regression");
        self.coef = Some(coef);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>> {
        let coef = self
            .coef
            .as_ref()
            .ok_or_else(|| HyperkitError::not_fitted(Self::properties().name))?;
        check_n_features(coef.len(), x)?;
        Ok(x.to_dense_f64().dot(coef) + self.intercept)
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < 1e-12 {
            return Err(HyperkitError::estimator("singular system in ridge solve"));
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let delta = factor * a[[col, k]];
                a[[row, k]] -= delta;
            }
            let delta = factor * b[col];
            b[row] -= delta;
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_linear_relation() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 1.0], [3.0, 3.0], [4.0, 2.0]];
        let y = x.column(0).mapv(|v| 2.0 * v) - x.column(1).mapv(|v| 3.0 * v) + 5.0;
        let mut ridge = RidgeRegression::new(1e-8, true);
        ridge.fit(&FeatureMatrix::Dense64(x.clone()), &y).unwrap();

        let coef = ridge.coef().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-5);
        assert!((coef[1] + 3.0).abs() < 1e-5);
        assert!((ridge.intercept() - 5.0).abs() < 1e-5);

        let pred = ridge.predict(&FeatureMatrix::Dense64(x)).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-5);
        }
    }

    #[test]
    fn test_alpha_shrinks_coefficients() {
        let x = FeatureMatrix::Dense64(array![[1.0], [2.0], [3.0], [4.0]]);
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut weak = RidgeRegression::new(1e-6, true);
        let mut strong = RidgeRegression::new(10.0, true);
        weak.fit(&x, &y).unwrap();
        strong.fit(&x, &y).unwrap();
        assert!(strong.coef().unwrap()[0].abs() < weak.coef().unwrap()[0].abs());
    }

    #[test]
    fn test_default_configuration() {
        let ridge = RidgeRegression::with_defaults(1).unwrap();
        assert_eq!(ridge.alpha, 1.0);
        assert!(ridge.fit_intercept);
        assert!(matches!(
            ridge.predict(&FeatureMatrix::Dense64(array![[1.0]])),
            Err(HyperkitError::NotFitted(_))
        ));
    }

    #[test]
    fn test_solve_rejects_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(solve(a, array![1.0, 2.0]).is_err());
    }
}
