//! Identity preprocessing step.

use super::{Capability, Component, ComponentProperties, Transformer, check_n_features};
use crate::error::{HyperkitError, Result};
use crate::matrix::FeatureMatrix;
use crate::space::{Configuration, ConfigurationSpace};
use ndarray::Array1;

#[derive(Debug, Clone, Default)]
pub struct NoPreprocessing {
    n_features: Option<usize>,
}

impl Component for NoPreprocessing {
    fn properties() -> ComponentProperties {
        ComponentProperties {
            name: "no_preprocessing",
            full_name: "No Preprocessing",
            capabilities: &[Capability::Transformer],
            handles_sparse: true,
            handles_missing_values: true,
        }
    }

    fn search_space() -> Result<ConfigurationSpace> {
        Ok(ConfigurationSpace::new())
    }

    fn from_configuration(_config: &Configuration, _random_state: u64) -> Result<Self> {
        Ok(Self::default())
    }
}

impl Transformer for NoPreprocessing {
    fn fit(&mut self, x: &FeatureMatrix, _y: Option<&Array1<f64>>) -> Result<()> {
        self.n_features = Some(x.n_features());
        Ok(())
    }

    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix> {
        let n = self
            .n_features
            .ok_or_else(|| HyperkitError::not_fitted(Self::properties().name))?;
        check_n_features(n, x)?;
        Ok(x.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity() {
        let x = FeatureMatrix::Dense32(array![[1.0, f32::NAN]]);
        let mut t = NoPreprocessing::with_defaults(1).unwrap();
        let out = t.fit_transform(&x, None).unwrap();
        assert_eq!(out.fingerprint(), x.fingerprint());
        assert!(NoPreprocessing::search_space().unwrap().is_empty());
    }
}
