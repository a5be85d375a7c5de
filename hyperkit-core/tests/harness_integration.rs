//! End-to-end runs of every native component through the smoke-test helpers.

use hyperkit_core::data::{Task, load_dataset};
use hyperkit_core::estimator::{
    GaussianNaiveBayes, Imputation, KNearestNeighborsClassifier, KNearestNeighborsRegressor,
    NoPreprocessing, Rescaling, RidgeRegression,
};
use hyperkit_core::harness::{
    check_preprocessing_dtype, check_preprocessing_dtype_by_name, run_classifier,
    run_classifier_by_name, run_classifier_predict_proba, run_preprocessing,
    run_preprocessing_by_name, run_regressor, run_regressor_by_name,
};
use hyperkit_core::metrics::{accuracy, r2_score};
use hyperkit_core::{Capability, ComponentRegistry, Dtype, HarnessConfig, HyperkitError, Layout};

#[test]
fn gaussian_nb_classifies_iris() {
    let config = HarnessConfig::default();
    let (predictions, y_test) = run_classifier::<GaussianNaiveBayes>("iris", &config).unwrap();
    assert_eq!(predictions.len(), 50);
    assert!(accuracy(&y_test, &predictions).unwrap() >= 0.85);
}

#[test]
fn knn_classifies_iris() {
    let config = HarnessConfig::default();
    let (predictions, y_test) =
        run_classifier::<KNearestNeighborsClassifier>("iris", &config).unwrap();
    assert!(accuracy(&y_test, &predictions).unwrap() >= 0.85);
}

#[test]
fn predict_proba_rows_are_distributions() {
    let config = HarnessConfig::default();
    for (proba, y_test) in [
        run_classifier_predict_proba::<GaussianNaiveBayes>("iris", &config).unwrap(),
        run_classifier_predict_proba::<KNearestNeighborsClassifier>("iris", &config).unwrap(),
    ] {
        assert_eq!(proba.dim(), (y_test.len(), 3));
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }
}

#[test]
fn ridge_fits_friedman1() {
    let config = HarnessConfig::default();
    let (predictions, y_test) = run_regressor::<RidgeRegression>("friedman1", &config).unwrap();
    assert_eq!(predictions.len(), 442 - 150);
    assert!(r2_score(&y_test, &predictions).unwrap() > 0.5);
}

#[test]
fn knn_regressor_runs_without_touching_inputs() {
    let config = HarnessConfig::default();
    let (predictions, y_test) =
        run_regressor::<KNearestNeighborsRegressor>("friedman1", &config).unwrap();
    assert_eq!(predictions.len(), y_test.len());
    assert!(predictions.iter().all(|p| p.is_finite()));
}

#[test]
fn preprocessing_leaves_original_alone() {
    let config = HarnessConfig::default();
    for make_sparse in [false, true] {
        let (transformed, original) =
            run_preprocessing::<Rescaling>("iris", make_sparse, &config).unwrap();
        let fresh = hyperkit_core::get_dataset("iris", make_sparse, false, &config).unwrap();
        assert_eq!(original.fingerprint(), fresh.x_train.fingerprint());
        assert_eq!(transformed.shape(), original.shape());
        assert_eq!(transformed.layout(), original.layout());
    }
}

#[test]
fn rescaling_maps_dense_iris_into_unit_range() {
    let config = HarnessConfig::default();
    let (transformed, _) = run_preprocessing::<Rescaling>("iris", false, &config).unwrap();
    let x = transformed.to_dense_f64();
    assert!(x.iter().all(|&v| (-1e-6..=1.0 + 1e-6).contains(&v)));
}

#[test]
fn transformers_preserve_dtype() {
    let config = HarnessConfig::default();
    for add_nans in [false, true] {
        check_preprocessing_dtype::<Rescaling>(add_nans, &config).unwrap();
        check_preprocessing_dtype::<Imputation>(add_nans, &config).unwrap();
        check_preprocessing_dtype::<NoPreprocessing>(add_nans, &config).unwrap();
    }
}

#[test]
fn imputation_removes_every_nan() {
    let config = HarnessConfig::default();
    let split = hyperkit_core::get_dataset("iris", false, true, &config).unwrap();
    let mut imputation = <Imputation as hyperkit_core::Component>::with_defaults(1).unwrap();
    let out = hyperkit_core::Transformer::fit_transform(&mut imputation, &split.x_train, None)
        .unwrap();
    assert_eq!(out.dtype(), Dtype::Float32);
    assert_eq!(out.layout(), Layout::Dense);
    assert!(out.to_dense_f64().iter().all(|v| !v.is_nan()));
}

#[test]
fn every_registered_component_passes_its_smoke_run() {
    let config = HarnessConfig::default();
    let registry = ComponentRegistry::builtin();

    for name in registry.find_components(Capability::Classifier, &[]) {
        let (pred, y) = run_classifier_by_name(&registry, &name, "iris", &config).unwrap();
        assert_eq!(pred.len(), y.len(), "{name}");
    }
    for name in registry.find_components(Capability::Regressor, &[]) {
        let (pred, y) = run_regressor_by_name(&registry, &name, "friedman1", &config).unwrap();
        assert_eq!(pred.len(), y.len(), "{name}");
    }
    for name in registry.find_components(Capability::Transformer, &[]) {
        check_preprocessing_dtype_by_name(&registry, &name, true, &config).unwrap();
        let (out, _) = run_preprocessing_by_name(&registry, &name, "iris", true, &config).unwrap();
        assert!(out.is_sparse(), "{name}");
    }
}

#[test]
fn unknown_dataset_surfaces_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = HarnessConfig {
        dataset_dir: Some(dir.path().to_path_buf()),
        ..HarnessConfig::default()
    };
    let err = run_classifier::<GaussianNaiveBayes>("mnist_784", &config).unwrap_err();
    assert!(matches!(err, HyperkitError::NotFound(_)));
}

#[test]
fn csv_dataset_runs_through_the_harness() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("a,b,label\n");
    for i in 0..30 {
        let class = i % 2;
        csv.push_str(&format!("{},{},{class}\n", class * 10 + i % 3, i % 5));
    }
    std::fs::write(dir.path().join("blobs.csv"), csv).unwrap();
    let config = HarnessConfig {
        dataset_dir: Some(dir.path().to_path_buf()),
        ..HarnessConfig::default()
    };
    assert_eq!(load_dataset("blobs", &config).unwrap().task, Task::Classification);
    let (pred, y) = run_classifier::<KNearestNeighborsClassifier>("blobs", &config).unwrap();
    assert_eq!(accuracy(&y, &pred).unwrap(), 1.0);
}
