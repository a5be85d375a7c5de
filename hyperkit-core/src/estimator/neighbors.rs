//! k-nearest-neighbours classification and regression.

use super::{
    Capability, Classifier, Component, ComponentProperties, Regressor, argmax, check_fit_input,
    check_n_features, class_labels,
};
use crate::error::{HyperkitError, Result};
use crate::matrix::FeatureMatrix;
use crate::space::{Configuration, ConfigurationSpace, Hyperparameter};
use ndarray::{Array1, Array2, ArrayView1};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    Uniform,
    Distance,
}

impl Weighting {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "uniform" => Ok(Self::Uniform),
            "distance" => Ok(Self::Distance),
            other => Err(HyperkitError::invalid_hyperparameter(format!(
                "weights must be 'uniform' or 'distance', got '{other}'"
            ))),
        }
    }
}

/// Neighbour settings shared by both estimators.
#[derive(Debug, Clone)]
struct NeighborSearch {
    n_neighbors: usize,
    weights: Weighting,
    p: i32,
}

/// Stored training data.
#[derive(Debug, Clone)]
struct Memory {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl NeighborSearch {
    fn from_configuration(config: &Configuration) -> Result<Self> {
        let n_neighbors = usize::try_from(config.get_int("n_neighbors")?)
            .ok()
            .filter(|&k| k > 0)
            .ok_or_else(|| HyperkitError::invalid_hyperparameter("n_neighbors must be positive"))?;
        let p = match config.get_int("p")? {
            1 => 1,
            2 => 2,
            other => {
                return Err(HyperkitError::invalid_hyperparameter(format!(
                    "p must be 1 or 2, got {other}"
                )));
            }
        };
        Ok(Self {
            n_neighbors,
            weights: Weighting::parse(config.get_str("weights")?)?,
            p,
        })
    }

    fn space() -> Result<ConfigurationSpace> {
        ConfigurationSpace::new()
            .with(Hyperparameter::log_uniform_integer("n_neighbors", 1, 100, 1))?
            .with(Hyperparameter::categorical(
                "weights",
                &["uniform", "distance"],
                "uniform",
            ))?
            .with(Hyperparameter::uniform_integer("p", 1, 2, 2))
    }

    fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let diffs = a.iter().zip(b.iter()).map(|(u, v)| (u - v).abs());
        if self.p == 1 {
            diffs.sum()
        } else {
            diffs.map(|d| d * d).sum::<f64>().sqrt()
        }
    }

    /// `(training row, weight)` for the neighbours of `query`.
    ///
    /// With distance weighting, exact matches take all of the weight.
    fn neighbors(&self, memory: &Memory, query: ArrayView1<f64>) -> Vec<(usize, f64)> {
        let mut dists: Vec<(usize, f64)> = memory
            .x
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i, self.distance(row, query)))
            .collect();
        dists.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        dists.truncate(self.n_neighbors.min(memory.x.nrows()));

        match self.weights {
            Weighting::Uniform => dists.into_iter().map(|(i, _)| (i, 1.0)).collect(),
            Weighting::Distance => {
                if dists.iter().any(|&(_, d)| d == 0.0) {
                    dists
                        .into_iter()
                        .map(|(i, d)| (i, if d == 0.0 { 1.0 } else { 0.0 }))
                        .collect()
                } else {
                    dists.into_iter().map(|(i, d)| (i, 1.0 / d)).collect()
                }
            }
        }
    }

    fn memorize(x: &FeatureMatrix, y: &Array1<f64>) -> Result<Memory> {
        check_fit_input(x, y)?;
        Ok(Memory {
            x: x.to_dense_f64(),
            y: y.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct KNearestNeighborsClassifier {
    search: NeighborSearch,
    memory: Option<Memory>,
    classes: Vec<f64>,
}

impl KNearestNeighborsClassifier {
    fn fitted(&self) -> Result<&Memory> {
        self.memory
            .as_ref()
            .ok_or_else(|| HyperkitError::not_fitted(Self::properties().name))
    }
}

impl Component for KNearestNeighborsClassifier {
    fn properties() -> ComponentProperties {
        ComponentProperties {
            name: "k_nearest_neighbors",
            full_name: "K-Nearest Neighbor Classification",
            capabilities: &[Capability::Classifier],
            handles_sparse: true,
            handles_missing_values: false,
        }
    }

    fn search_space() -> Result<ConfigurationSpace> {
        NeighborSearch::space()
    }

    fn from_configuration(config: &Configuration, _random_state: u64) -> Result<Self> {
        Ok(Self {
            search: NeighborSearch::from_configuration(config)?,
            memory: None,
            classes: Vec::new(),
        })
    }
}

impl Classifier for KNearestNeighborsClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<()> {
        let memory = NeighborSearch::memorize(x, y)?;
        self.classes = class_labels(y)?;
        self.memory = Some(memory);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row.iter().copied())])
            .collect())
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Array2<f64>> {
        let memory = self.fitted()?;
        check_n_features(memory.x.ncols(), x)?;
        let queries = x.to_dense_f64();
        let mut proba = Array2::zeros((queries.nrows(), self.classes.len()));
        for (i, query) in queries.rows().into_iter().enumerate() {
            let neighbors = self.search.neighbors(memory, query);
            let total: f64 = neighbors.iter().map(|(_, w)| w).sum();
            for (j, w) in neighbors {
                // Labels come from fit, so the lookup always succeeds.
                if let Some(c) = self.classes.iter().position(|&l| l == memory.y[j]) {
                    proba[[i, c]] += w / total;
                }
            }
        }
        Ok(proba)
    }
}

#[derive(Debug, Clone)]
pub struct KNearestNeighborsRegressor {
    search: NeighborSearch,
    memory: Option<Memory>,
}

impl Component for KNearestNeighborsRegressor {
    fn properties() -> ComponentProperties {
        ComponentProperties {
            name: "k_nearest_neighbors_regressor",
            full_name: "K-Nearest Neighbor Regression",
            capabilities: &[Capability::Regressor],
            handles_sparse: true,
            handles_missing_values: false,
        }
    }

    fn search_space() -> Result<ConfigurationSpace> {
        NeighborSearch::space()
    }

    fn from_configuration(config: &Configuration, _random_state: u64) -> Result<Self> {
        Ok(Self {
            search: NeighborSearch::from_configuration(config)?,
            memory: None,
        })
    }
}

impl Regressor for KNearestNeighborsRegressor {
    fn fit(&mut self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<()> {
        self.memory = Some(NeighborSearch::memorize(x, y)?);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>> {
        let memory = self
            .memory
            .as_ref()
            .ok_or_else(|| HyperkitError::not_fitted(Self::properties().name))?;
        check_n_features(memory.x.ncols(), x)?;
        let queries = x.to_dense_f64();
        Ok(queries
            .rows()
            .into_iter()
            .map(|query| {
                let neighbors = self.search.neighbors(memory, query);
                let total: f64 = neighbors.iter().map(|(_, w)| w).sum();
                neighbors.iter().map(|&(j, w)| memory.y[j] * w).sum::<f64>() / total
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::HyperparameterValue;
    use ndarray::array;

    fn config(k: i64, weights: &str, p: i64) -> Configuration {
        let mut c = Configuration::new();
        c.set("n_neighbors", HyperparameterValue::Int(k));
        c.set("weights", HyperparameterValue::Str(weights.into()));
        c.set("p", HyperparameterValue::Int(p));
        c
    }

    #[test]
    fn test_default_is_one_nearest_neighbor() {
        let space = KNearestNeighborsClassifier::search_space().unwrap();
        let default = space.default_configuration();
        assert_eq!(default.get_int("n_neighbors").unwrap(), 1);
        assert_eq!(default.get_str("weights").unwrap(), "uniform");
        assert_eq!(default.get_int("p").unwrap(), 2);
    }

    #[test]
    fn test_classifier_votes() {
        let x = FeatureMatrix::Dense64(array![[0.0], [1.0], [10.0], [11.0], [12.0]]);
        let y = array![0.0, 0.0, 1.0, 1.0, 1.0];
        let mut knn =
            KNearestNeighborsClassifier::from_configuration(&config(3, "uniform", 2), 1).unwrap();
        knn.fit(&x, &y).unwrap();
        let probe = FeatureMatrix::Dense64(array![[0.5], [11.0]]);
        assert_eq!(knn.predict(&probe).unwrap(), array![0.0, 1.0]);
        let proba = knn.predict_proba(&probe).unwrap();
        assert!((proba[[0, 0]] - 2.0 / 3.0).abs() < 1e-12);
        assert!((proba[[1, 1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_weighting_exact_match() {
        let x = FeatureMatrix::Dense64(array![[0.0], [1.0], [2.0]]);
        let y = array![1.0, 2.0, 3.0];
        let mut knn =
            KNearestNeighborsRegressor::from_configuration(&config(3, "distance", 1), 1).unwrap();
        knn.fit(&x, &y).unwrap();
        let pred = knn
            .predict(&FeatureMatrix::Dense64(array![[1.0], [0.5]]))
            .unwrap();
        assert_eq!(pred[0], 2.0);
        // 1/0.5 weights on 1.0 and 2.0, 1/1.5 on 3.0
        let expected = (1.0 * 2.0 + 2.0 * 2.0 + 3.0 / 1.5) / (2.0 + 2.0 + 1.0 / 1.5);
        assert!((pred[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(KNearestNeighborsClassifier::from_configuration(&config(0, "uniform", 2), 1).is_err());
        assert!(KNearestNeighborsClassifier::from_configuration(&config(1, "median", 2), 1).is_err());
        assert!(KNearestNeighborsClassifier::from_configuration(&config(1, "uniform", 3), 1).is_err());
    }

    #[test]
    fn test_sparse_input_accepted() {
        let x = FeatureMatrix::Dense32(array![[0.0, 1.0], [3.0, 0.0]])
            .to_sparse()
            .unwrap();
        let y = array![0.0, 1.0];
        let mut knn = KNearestNeighborsClassifier::with_defaults(1).unwrap();
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&x).unwrap(), y);
    }
}
