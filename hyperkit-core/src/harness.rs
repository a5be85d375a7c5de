//! Smoke-test helpers: build a component from its default configuration, fit
//! it on a prepared split and hand back what the caller should compare.

use crate::config::HarnessConfig;
use crate::data::{DatasetSplit, get_dataset};
use crate::error::{HyperkitError, Result};
use crate::estimator::{Classifier, Component, Regressor, Transformer};
use crate::matrix::{Dtype, FeatureMatrix, label_fingerprint};
use crate::registry::ComponentRegistry;
use ndarray::{Array1, Array2};
use tracing::{debug, warn};

/// Fit on the dense training split and predict the test split.
///
/// Returns `(predictions, y_test)`.
pub fn run_classifier<C: Component + Classifier>(
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let mut classifier = C::with_defaults(config.random_state)?;
    classify(&mut classifier, dataset, config)
}

/// Like [`run_classifier`] but returns class-probability estimates.
pub fn run_classifier_predict_proba<C: Component + Classifier>(
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let mut classifier = C::with_defaults(config.random_state)?;
    classify_proba(&mut classifier, dataset, config)
}

/// Fit on the training split, then transform it.
///
/// Returns `(transformed x_train, copy of x_train taken before fitting)`.
pub fn run_preprocessing<T: Component + Transformer>(
    dataset: &str,
    make_sparse: bool,
    config: &HarnessConfig,
) -> Result<(FeatureMatrix, FeatureMatrix)> {
    let mut transformer = T::with_defaults(config.random_state)?;
    preprocess(&mut transformer, dataset, make_sparse, config)
}

/// Fit on the dense training split and predict the test split, failing if
/// fitting or predicting changed any input.
///
/// Returns `(predictions, y_test)`.
pub fn run_regressor<R: Component + Regressor>(
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let mut regressor = R::with_defaults(config.random_state)?;
    regress(&mut regressor, dataset, config)
}

/// Check that `T` keeps the input dtype for dense and sparse single- and
/// double-precision training data of `iris`.
pub fn check_preprocessing_dtype<T: Component + Transformer>(
    add_nans: bool,
    config: &HarnessConfig,
) -> Result<()> {
    for make_sparse in [false, true] {
        for dtype in [Dtype::Float32, Dtype::Float64] {
            let mut transformer = T::with_defaults(config.random_state)?;
            // The sparse double-precision case fits without labels.
            let with_labels = !(make_sparse && dtype == Dtype::Float64);
            check_dtype_case(&mut transformer, make_sparse, dtype, add_nans, with_labels, config)?;
        }
    }
    Ok(())
}

/// [`run_classifier`] for a component looked up by name.
pub fn run_classifier_by_name(
    registry: &ComponentRegistry,
    name: &str,
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let defaults = registry.default_configuration(name)?;
    let mut classifier = registry.build_classifier(name, &defaults, config.random_state)?;
    classify(classifier.as_mut(), dataset, config)
}

/// [`run_classifier_predict_proba`] for a component looked up by name.
pub fn run_classifier_predict_proba_by_name(
    registry: &ComponentRegistry,
    name: &str,
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let defaults = registry.default_configuration(name)?;
    let mut classifier = registry.build_classifier(name, &defaults, config.random_state)?;
    classify_proba(classifier.as_mut(), dataset, config)
}

/// [`run_preprocessing`] for a component looked up by name.
pub fn run_preprocessing_by_name(
    registry: &ComponentRegistry,
    name: &str,
    dataset: &str,
    make_sparse: bool,
    config: &HarnessConfig,
) -> Result<(FeatureMatrix, FeatureMatrix)> {
    let defaults = registry.default_configuration(name)?;
    let mut transformer = registry.build_transformer(name, &defaults, config.random_state)?;
    preprocess(transformer.as_mut(), dataset, make_sparse, config)
}

/// [`run_regressor`] for a component looked up by name.
pub fn run_regressor_by_name(
    registry: &ComponentRegistry,
    name: &str,
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let defaults = registry.default_configuration(name)?;
    let mut regressor = registry.build_regressor(name, &defaults, config.random_state)?;
    regress(regressor.as_mut(), dataset, config)
}

/// [`check_preprocessing_dtype`] for a component looked up by name.
pub fn check_preprocessing_dtype_by_name(
    registry: &ComponentRegistry,
    name: &str,
    add_nans: bool,
    config: &HarnessConfig,
) -> Result<()> {
    let defaults = registry.default_configuration(name)?;
    for make_sparse in [false, true] {
        for dtype in [Dtype::Float32, Dtype::Float64] {
            let mut transformer =
                registry.build_transformer(name, &defaults, config.random_state)?;
            let with_labels = !(make_sparse && dtype == Dtype::Float64);
            check_dtype_case(
                transformer.as_mut(),
                make_sparse,
                dtype,
                add_nans,
                with_labels,
                config,
            )?;
        }
    }
    Ok(())
}

fn dense_split(dataset: &str, config: &HarnessConfig) -> Result<DatasetSplit> {
    get_dataset(dataset, false, false, config)
}

fn classify(
    classifier: &mut dyn Classifier,
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let split = dense_split(dataset, config)?;
    classifier.fit(&split.x_train, &split.y_train)?;
    let predictions = classifier.predict(&split.x_test)?;
    debug!(dataset, test = split.y_test.len(), "Classifier predicted test split");
    Ok((predictions, split.y_test))
}

fn classify_proba(
    classifier: &mut dyn Classifier,
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let split = dense_split(dataset, config)?;
    classifier.fit(&split.x_train, &split.y_train)?;
    let probabilities = classifier.predict_proba(&split.x_test)?;
    Ok((probabilities, split.y_test))
}

fn preprocess(
    transformer: &mut dyn Transformer,
    dataset: &str,
    make_sparse: bool,
    config: &HarnessConfig,
) -> Result<(FeatureMatrix, FeatureMatrix)> {
    let split = get_dataset(dataset, make_sparse, false, config)?;
    let original = split.x_train.clone();
    transformer.fit(&split.x_train, Some(&split.y_train))?;
    let transformed = transformer.transform(&split.x_train)?;
    Ok((transformed, original))
}

fn regress(
    regressor: &mut dyn Regressor,
    dataset: &str,
    config: &HarnessConfig,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let split = dense_split(dataset, config)?;
    let before = InputFingerprints::take(&split);
    regressor.fit(&split.x_train, &split.y_train)?;
    let predictions = regressor.predict(&split.x_test)?;
    if InputFingerprints::take(&split) != before {
        warn!(dataset, "Regressor changed its inputs");
        return Err(HyperkitError::DataModified("Model modified data".to_string()));
    }
    Ok((predictions, split.y_test))
}

/// Approximate identity of the inputs a regressor sees.
#[derive(Debug, PartialEq, Eq)]
struct InputFingerprints {
    x_train: String,
    x_test: String,
    y_train: String,
}

impl InputFingerprints {
    fn take(split: &DatasetSplit) -> Self {
        Self {
            x_train: split.x_train.fingerprint(),
            x_test: split.x_test.fingerprint(),
            y_train: label_fingerprint(&split.y_train),
        }
    }
}

fn check_dtype_case(
    transformer: &mut dyn Transformer,
    make_sparse: bool,
    dtype: Dtype,
    add_nans: bool,
    with_labels: bool,
    config: &HarnessConfig,
) -> Result<()> {
    let split = get_dataset("iris", make_sparse, add_nans, config)?;
    expect_dtype(Dtype::Float32, &split.x_train)?;
    let x_train = split.x_train.astype(dtype)?;

    let labels = with_labels.then_some(&split.y_train);
    transformer.fit(&x_train, labels)?;
    let transformed = transformer.transform(&x_train)?;
    expect_dtype(dtype, &transformed)?;
    debug!(sparse = make_sparse, %dtype, "Transform kept dtype");
    Ok(())
}

fn expect_dtype(expected: Dtype, matrix: &FeatureMatrix) -> Result<()> {
    let actual = matrix.dtype();
    if actual != expected {
        return Err(HyperkitError::DtypeMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{GaussianNaiveBayes, NoPreprocessing, RidgeRegression};
    /// Transformer that always emits double precision.
    #[derive(Debug, Default)]
    struct Widening;

    impl Transformer for Widening {
        fn fit(&mut self, _x: &FeatureMatrix, _y: Option<&Array1<f64>>) -> Result<()> {
            Ok(())
        }

        fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix> {
            x.astype(Dtype::Float64)
        }
    }

    #[test]
    fn test_widening_transformer_is_caught() {
        let err = check_dtype_case(
            &mut Widening,
            false,
            Dtype::Float32,
            false,
            true,
            &HarnessConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HyperkitError::DtypeMismatch {
                expected: Dtype::Float32,
                actual: Dtype::Float64
            }
        ));
    }

    /// Predicts the training mean.
    #[derive(Debug, Default)]
    struct Mean(f64);

    impl Regressor for Mean {
        fn fit(&mut self, _x: &FeatureMatrix, y: &Array1<f64>) -> Result<()> {
            self.0 = y.mean().unwrap_or(0.0);
            Ok(())
        }

        fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>> {
            Ok(Array1::from_elem(x.n_samples(), self.0))
        }
    }

    #[test]
    fn test_regress_with_trait_object() {
        let (pred, y_test) = regress(&mut Mean::default(), "friedman1", &HarnessConfig::default())
            .unwrap();
        assert_eq!(pred.len(), y_test.len());
        assert_eq!(y_test.len(), 442 - 150);
    }

    #[test]
    fn test_generic_helpers_run() {
        let config = HarnessConfig::default();
        let (pred, y) = run_classifier::<GaussianNaiveBayes>("iris", &config).unwrap();
        assert_eq!(pred.len(), y.len());

        let (pred, y) = run_regressor::<RidgeRegression>("friedman1", &config).unwrap();
        assert_eq!(pred.len(), y.len());

        let (out, original) = run_preprocessing::<NoPreprocessing>("iris", true, &config).unwrap();
        assert_eq!(out.fingerprint(), original.fingerprint());
    }

    #[test]
    fn test_fingerprints_differ_when_labels_change() {
        let split = get_dataset("iris", false, false, &HarnessConfig::default()).unwrap();
        let before = InputFingerprints::take(&split);
        let mut changed = split.clone();
        changed.y_train[0] += 1.0;
        assert_ne!(InputFingerprints::take(&changed), before);
    }
}
