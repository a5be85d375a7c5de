use criterion::{Criterion, black_box, criterion_group, criterion_main};
use hyperkit_core::estimator::{
    GaussianNaiveBayes, Imputation, KNearestNeighborsClassifier, RidgeRegression,
};
use hyperkit_core::{
    Capability, Classifier, Component, ComponentRegistry, HarnessConfig, Regressor, Transformer,
    get_dataset,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn bench_dataset_preparation(c: &mut Criterion) {
    let config = HarnessConfig::default();

    c.bench_function("split_iris_dense", |b| {
        b.iter(|| get_dataset(black_box("iris"), false, false, &config))
    });

    c.bench_function("split_iris_sparse_with_nans", |b| {
        b.iter(|| get_dataset(black_box("iris"), true, true, &config))
    });

    c.bench_function("split_friedman1_dense", |b| {
        b.iter(|| get_dataset(black_box("friedman1"), false, false, &config))
    });
}

fn bench_estimators(c: &mut Criterion) {
    let config = HarnessConfig::default();
    let iris = get_dataset("iris", false, false, &config).unwrap();
    let friedman = get_dataset("friedman1", false, false, &config).unwrap();

    c.bench_function("gaussian_nb_fit_predict", |b| {
        b.iter(|| {
            let mut nb = GaussianNaiveBayes::with_defaults(1).unwrap();
            nb.fit(&iris.x_train, &iris.y_train).unwrap();
            nb.predict(black_box(&iris.x_test)).unwrap()
        })
    });

    let mut knn = KNearestNeighborsClassifier::with_defaults(1).unwrap();
    knn.fit(&iris.x_train, &iris.y_train).unwrap();
    c.bench_function("knn_predict_proba", |b| {
        b.iter(|| knn.predict_proba(black_box(&iris.x_test)).unwrap())
    });

    c.bench_function("ridge_fit", |b| {
        b.iter(|| {
            let mut ridge = RidgeRegression::with_defaults(1).unwrap();
            ridge.fit(black_box(&friedman.x_train), &friedman.y_train).unwrap();
        })
    });

    let sparse = get_dataset("iris", true, true, &config).unwrap();
    c.bench_function("imputation_sparse_fit_transform", |b| {
        b.iter(|| {
            let mut imputation = Imputation::with_defaults(1).unwrap();
            imputation.fit_transform(black_box(&sparse.x_train), None).unwrap()
        })
    });
}

fn bench_registry(c: &mut Criterion) {
    let registry = ComponentRegistry::builtin();
    let skip = vec!["neighbors".to_string()];

    c.bench_function("registry_scan_classifiers", |b| {
        b.iter(|| registry.find_components(black_box(Capability::Classifier), &skip))
    });

    let space = KNearestNeighborsClassifier::search_space().unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    c.bench_function("space_sample_and_validate", |b| {
        b.iter(|| {
            let config = space.sample_configuration(&mut rng);
            space.validate(black_box(&config)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_dataset_preparation,
    bench_estimators,
    bench_registry
);
criterion_main!(benches);
