//! Gaussian naive Bayes classifier.

use super::{
    Capability, Classifier, Component, ComponentProperties, argmax, check_fit_input,
    check_n_features, class_labels,
};
use crate::error::{HyperkitError, Result};
use crate::matrix::FeatureMatrix;
use crate::space::{Configuration, ConfigurationSpace, Hyperparameter};
use ndarray::{Array1, Array2, Axis};
use std::f64::consts::PI;

#[derive(Debug, Clone)]
struct FittedModel {
    classes: Vec<f64>,
    log_priors: Vec<f64>,
    /// `[n_classes, n_features]`
    means: Array2<f64>,
    /// `[n_classes, n_features]`
    variances: Array2<f64>,
}

#[derive(Debug, Clone)]
pub struct GaussianNaiveBayes {
    var_smoothing: f64,
    model: Option<FittedModel>,
}

impl GaussianNaiveBayes {
    pub fn new(var_smoothing: f64) -> Self {
        Self {
            var_smoothing,
            model: None,
        }
    }

    fn fitted(&self) -> Result<&FittedModel> {
        self.model
            .as_ref()
            .ok_or_else(|| HyperkitError::not_fitted(Self::properties().name))
    }

    /// Unnormalised joint log-likelihood, `[n_samples, n_classes]`.
    fn joint_log_likelihood(&self, x: &FeatureMatrix) -> Result<Array2<f64>> {
        let model = self.fitted()?;
        check_n_features(model.means.ncols(), x)?;
        let x = x.to_dense_f64();
        let n_classes = model.classes.len();
        let mut jll = Array2::zeros((x.nrows(), n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            for c in 0..n_classes {
                let mut ll = model.log_priors[c];
                for (j, &v) in row.iter().enumerate() {
                    let var = model.variances[[c, j]];
                    let diff = v - model.means[[c, j]];
                    ll -= 0.5 * (2.0 * PI * var).ln() + diff * diff / (2.0 * var);
                }
                jll[[i, c]] = ll;
            }
        }
        Ok(jll)
    }
}

impl Component for GaussianNaiveBayes {
    fn properties() -> ComponentProperties {
        ComponentProperties {
            name: "gaussian_nb",
            full_name: "Gaussian Naive Bayes classifier",
            capabilities: &[Capability::Classifier],
            handles_sparse: false,
            handles_missing_values: false,
        }
    }

    fn search_space() -> Result<ConfigurationSpace> {
        ConfigurationSpace::new().with(Hyperparameter::log_uniform_float(
            "var_smoothing",
            1e-12,
            1e-2,
            1e-9,
        ))
    }

    fn from_configuration(config: &Configuration, _random_state: u64) -> Result<Self> {
        Ok(Self::new(config.get_float("var_smoothing")?))
    }
}

impl Classifier for GaussianNaiveBayes {
    fn fit(&mut self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let classes = class_labels(y)?;
        let x = x.to_dense_f64();
        let n_features = x.ncols();

        // Smoothing is relative to the widest feature.
        let max_var = x
            .var_axis(Axis(0), 0.0)
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);
        let epsilon = self.var_smoothing * max_var.max(f64::MIN_POSITIVE);

        let mut means = Array2::zeros((classes.len(), n_features));
        let mut variances = Array2::zeros((classes.len(), n_features));
        let mut log_priors = Vec::with_capacity(classes.len());
        for (c, &label) in classes.iter().enumerate() {
            let rows: Vec<usize> = (0..y.len()).filter(|&i| y[i] == label).collect();
            let members = x.select(Axis(0), &rows);
            let mean = members
                .mean_axis(Axis(0))
                .ok_or_else(|| HyperkitError::estimator("empty class"))?;
            let var = members.var_axis(Axis(0), 0.0) + epsilon;
            means.row_mut(c).assign(&mean);
            variances.row_mut(c).assign(&var);
            log_priors.push((rows.len() as f64 / y.len() as f64).ln());
        }

        tracing::debug!(classes = classes.len(), features = n_features, "Fitted gaussian_nb");
        self.model = Some(FittedModel {
            classes,
            log_priors,
            means,
            variances,
        });
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>> {
        let jll = self.joint_log_likelihood(x)?;
        let classes = &self.fitted()?.classes;
        Ok(jll
            .rows()
            .into_iter()
            .map(|row| classes[argmax(row.iter().copied())])
            .collect())
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Array2<f64>> {
        let mut jll = self.joint_log_likelihood(x)?;
        for mut row in jll.rows_mut() {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let total = row.sum();
            row.mapv_inplace(|v| v / total);
        }
        Ok(jll)
    }
}
