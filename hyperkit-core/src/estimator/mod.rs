//! Estimator traits and the native components implementing them.
//!
//! Every component declares a [`ConfigurationSpace`] and is constructed from a
//! [`Configuration`] drawn from it, plus a `random_state`.

pub mod imputation;
pub mod naive_bayes;
pub mod neighbors;
pub mod no_preprocessing;
pub mod rescaling;
pub mod ridge;

pub use imputation::Imputation;
pub use naive_bayes::GaussianNaiveBayes;
pub use neighbors::{KNearestNeighborsClassifier, KNearestNeighborsRegressor};
pub use no_preprocessing::NoPreprocessing;
pub use rescaling::Rescaling;
pub use ridge::RidgeRegression;

use crate::error::{HyperkitError, Result};
use crate::matrix::FeatureMatrix;
use crate::space::{Configuration, ConfigurationSpace};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a component can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Classifier,
    Regressor,
    Transformer,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Self::Classifier, Self::Regressor, Self::Transformer];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classifier => write!(f, "classifier"),
            Self::Regressor => write!(f, "regressor"),
            Self::Transformer => write!(f, "transformer"),
        }
    }
}

impl FromStr for Capability {
    type Err = HyperkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "classifier" | "classification" => Ok(Self::Classifier),
            "regressor" | "regression" => Ok(Self::Regressor),
            "transformer" | "preprocessor" | "preprocessing" => Ok(Self::Transformer),
            other => Err(HyperkitError::invalid_hyperparameter(format!(
                "unknown capability '{other}'"
            ))),
        }
    }
}

/// Static description of a component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentProperties {
    pub name: &'static str,
    pub full_name: &'static str,
    pub capabilities: &'static [Capability],
    pub handles_sparse: bool,
    pub handles_missing_values: bool,
}

impl ComponentProperties {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// A configurable component.
pub trait Component: Sized {
    fn properties() -> ComponentProperties;

    fn search_space() -> Result<ConfigurationSpace>;

    /// Build from `config`, which must belong to [`search_space`](Self::search_space).
    fn from_configuration(config: &Configuration, random_state: u64) -> Result<Self>;

    /// Build from the search space's default configuration.
    fn with_defaults(random_state: u64) -> Result<Self> {
        let config = Self::search_space()?.default_configuration();
        Self::from_configuration(&config, random_state)
    }
}

pub trait Classifier: fmt::Debug + Send {
    fn fit(&mut self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>>;

    /// One row per sample, one column per class in ascending label order.
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Array2<f64>>;
}

pub trait Regressor: fmt::Debug + Send {
    fn fit(&mut self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>>;
}

/// A preprocessing step. `transform` returns the input's dtype and layout.
pub trait Transformer: fmt::Debug + Send {
    fn fit(&mut self, x: &FeatureMatrix, y: Option<&Array1<f64>>) -> Result<()>;

    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix>;

    fn fit_transform(&mut self, x: &FeatureMatrix, y: Option<&Array1<f64>>) -> Result<FeatureMatrix> {
        self.fit(x, y)?;
        self.transform(x)
    }
}

pub(crate) fn check_fit_input(x: &FeatureMatrix, y: &Array1<f64>) -> Result<()> {
    if x.n_samples() == 0 {
        return Err(HyperkitError::estimator("cannot fit on zero samples"));
    }
    if x.n_samples() != y.len() {
        return Err(HyperkitError::estimator(format!(
            "{} samples but {} labels",
            x.n_samples(),
            y.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_n_features(expected: usize, x: &FeatureMatrix) -> Result<()> {
    if x.n_features() != expected {
        return Err(HyperkitError::ShapeMismatch {
            expected,
            actual: x.n_features(),
        });
    }
    Ok(())
}

/// Sorted distinct labels.
pub(crate) fn class_labels(y: &Array1<f64>) -> Result<Vec<f64>> {
    if y.iter().any(|v| v.is_nan()) {
        return Err(HyperkitError::estimator("labels contain NaN"));
    }
    let mut classes: Vec<f64> = y.to_vec();
    classes.sort_by(f64::total_cmp);
    classes.dedup();
    Ok(classes)
}

/// Index of the largest value; ties go to the first.
pub(crate) fn argmax(values: impl IntoIterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.into_iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}
