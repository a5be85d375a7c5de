//! Deterministic train/test preparation of reference datasets.

use crate::config::HarnessConfig;
use crate::data::loader::{RawDataset, load_dataset};
use crate::error::{HyperkitError, Result};
use crate::matrix::FeatureMatrix;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Train/test split of one dataset.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub x_train: FeatureMatrix,
    pub y_train: Array1<f64>,
    pub x_test: FeatureMatrix,
    pub y_test: Array1<f64>,
    /// Source row of each training sample.
    pub train_indices: Vec<usize>,
    /// Source row of each test sample.
    pub test_indices: Vec<usize>,
}

/// Options for [`prepare_split`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOptions {
    /// Zero column 0 and a random share of entries, then store sparse.
    pub make_sparse: bool,
    /// Replace a random share of training entries with NaN.
    pub add_nans: bool,
}

/// Load `dataset` and split it. See [`prepare_split`].
pub fn get_dataset(
    dataset: &str,
    make_sparse: bool,
    add_nans: bool,
    config: &HarnessConfig,
) -> Result<DatasetSplit> {
    let raw = load_dataset(dataset, config)?;
    prepare_split(
        &raw,
        SplitOptions {
            make_sparse,
            add_nans,
        },
        config,
    )
}

/// Number of training samples for a dataset of `n_samples`.
pub fn train_size(n_samples: usize, config: &HarnessConfig) -> usize {
    let by_fraction = (n_samples as f64 * config.train_fraction + 1e-9).floor() as usize;
    by_fraction.min(config.max_train_size).min(n_samples)
}

/// Shuffle, split and optionally corrupt a dataset.
///
/// Features are cast to single precision. Every random draw comes from one
/// RNG seeded with `config.seed`, so equal inputs give equal splits.
pub fn prepare_split(
    raw: &RawDataset,
    options: SplitOptions,
    config: &HarnessConfig,
) -> Result<DatasetSplit> {
    let n = raw.n_samples();
    if n < 2 {
        return Err(HyperkitError::dataset(format!(
            "{}: need at least two samples to split, got {n}",
            raw.name
        )));
    }
    for (what, p) in [
        ("nan_probability", config.nan_probability),
        ("sparse_zero_probability", config.sparse_zero_probability),
    ] {
        if !(0.0..=1.0).contains(&p) {
            return Err(HyperkitError::config(format!("{what} must be in [0, 1], got {p}")));
        }
    }
    let fraction = config.train_fraction;
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(HyperkitError::config(format!(
            "train_fraction must be in (0, 1), got {fraction}"
        )));
    }
    let n_train = train_size(n, config);
    if n_train == 0 {
        return Err(HyperkitError::dataset(format!(
            "{}: train_fraction {fraction} with max_train_size {} leaves no training rows out of {n}",
            raw.name, config.max_train_size
        )));
    }
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);
    let (train_idx, test_idx) = indices.split_at(n_train);

    let features = raw.data.mapv(|v| v as f32);
    let mut x_train = features.select(Axis(0), train_idx);
    let mut x_test = features.select(Axis(0), test_idx);
    let y_train = raw.target.select(Axis(0), train_idx);
    let y_test = raw.target.select(Axis(0), test_idx);

    if options.add_nans {
        let p = config.nan_probability;
        x_train.mapv_inplace(|v| if rng.gen_bool(p) { f32::NAN } else { v });
    }

    let (x_train, x_test) = if options.make_sparse {
        sparsify(&mut x_train, config.sparse_zero_probability, &mut rng);
        sparsify(&mut x_test, config.sparse_zero_probability, &mut rng);
        (
            FeatureMatrix::Dense32(x_train).to_sparse()?,
            FeatureMatrix::Dense32(x_test).to_sparse()?,
        )
    } else {
        (FeatureMatrix::Dense32(x_train), FeatureMatrix::Dense32(x_test))
    };

    debug!(
        dataset = %raw.name,
        train = n_train,
        test = n - n_train,
        sparse = options.make_sparse,
        nans = options.add_nans,
        "Prepared split"
    );

    Ok(DatasetSplit {
        x_train,
        y_train,
        x_test,
        y_test,
        train_indices: train_idx.to_vec(),
        test_indices: test_idx.to_vec(),
    })
}

fn sparsify(x: &mut Array2<f32>, zero_probability: f64, rng: &mut StdRng) {
    if x.ncols() > 0 {
        x.column_mut(0).fill(0.0);
    }
    x.mapv_inplace(|v| if rng.gen_bool(zero_probability) { 0.0 } else { v });
}
