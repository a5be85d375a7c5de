//! Feature matrices in dense or compressed-sparse-column layout.

use crate::error::{HyperkitError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sprs::CsMat;
use std::fmt;

/// Floating-point precision of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Float32,
    Float64,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
        }
    }
}

/// Storage layout of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Dense,
    Sparse,
}

/// Scalar types a [`FeatureMatrix`] can hold.
pub trait Element: Copy + PartialOrd + fmt::Debug + Default + Send + Sync + 'static {
    const DTYPE: Dtype;

    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;

    fn is_nan(self) -> bool {
        self.to_f64().is_nan()
    }

    fn is_zero(self) -> bool {
        self.to_f64() == 0.0
    }
}

impl Element for f32 {
    const DTYPE: Dtype = Dtype::Float32;

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Element for f64 {
    const DTYPE: Dtype = Dtype::Float64;

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// A samples x features matrix.
#[derive(Debug, Clone)]
pub enum FeatureMatrix {
    Dense32(Array2<f32>),
    Dense64(Array2<f64>),
    Sparse32(CsMat<f32>),
    Sparse64(CsMat<f64>),
}

/// Apply the same generic expression to whichever dense or sparse payload
/// the matrix holds.
macro_rules! dispatch {
    ($m:expr, dense $d:ident => $dense:expr, sparse $s:ident => $sparse:expr) => {
        match $m {
            FeatureMatrix::Dense32($d) => $dense,
            FeatureMatrix::Dense64($d) => $dense,
            FeatureMatrix::Sparse32($s) => $sparse,
            FeatureMatrix::Sparse64($s) => $sparse,
        }
    };
}

impl FeatureMatrix {
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::Dense32(_) | Self::Sparse32(_) => Dtype::Float32,
            Self::Dense64(_) | Self::Sparse64(_) => Dtype::Float64,
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            Self::Dense32(_) | Self::Dense64(_) => Layout::Dense,
            Self::Sparse32(_) | Self::Sparse64(_) => Layout::Sparse,
        }
    }

    pub fn is_sparse(&self) -> bool {
        self.layout() == Layout::Sparse
    }

    /// `(n_samples, n_features)`.
    pub fn shape(&self) -> (usize, usize) {
        dispatch!(self, dense d => d.dim(), sparse s => (s.rows(), s.cols()))
    }

    pub fn n_samples(&self) -> usize {
        self.shape().0
    }

    pub fn n_features(&self) -> usize {
        self.shape().1
    }

    /// Number of stored entries (all entries for dense matrices).
    pub fn nnz(&self) -> usize {
        dispatch!(self, dense d => d.len(), sparse s => s.nnz())
    }

    /// Cast to `dtype`, keeping the layout.
    pub fn astype(&self, dtype: Dtype) -> Result<Self> {
        Ok(match (self, dtype) {
            (Self::Dense32(d), Dtype::Float32) => Self::Dense32(d.clone()),
            (Self::Dense64(d), Dtype::Float64) => Self::Dense64(d.clone()),
            (Self::Dense32(d), Dtype::Float64) => Self::Dense64(d.mapv(|v| v as f64)),
            (Self::Dense64(d), Dtype::Float32) => Self::Dense32(d.mapv(|v| v as f32)),
            (Self::Sparse32(s), Dtype::Float32) => Self::Sparse32(s.clone()),
            (Self::Sparse64(s), Dtype::Float64) => Self::Sparse64(s.clone()),
            (Self::Sparse32(s), Dtype::Float64) => Self::Sparse64(cast_csc(s)?),
            (Self::Sparse64(s), Dtype::Float32) => Self::Sparse32(cast_csc(s)?),
        })
    }

    /// Repackage in sparse layout, dropping explicit zeros. NaN entries are
    /// stored.
    pub fn to_sparse(&self) -> Result<Self> {
        Ok(match self {
            Self::Dense32(d) => Self::Sparse32(dense_to_csc(d.view())?),
            Self::Dense64(d) => Self::Sparse64(dense_to_csc(d.view())?),
            Self::Sparse32(s) => Self::Sparse32(eliminate_zeros(s)?),
            Self::Sparse64(s) => Self::Sparse64(eliminate_zeros(s)?),
        })
    }

    /// Dense copy with the same dtype.
    pub fn to_dense(&self) -> Self {
        match self {
            Self::Dense32(_) | Self::Dense64(_) => self.clone(),
            Self::Sparse32(s) => Self::Dense32(csc_to_dense(s)),
            Self::Sparse64(s) => Self::Dense64(csc_to_dense(s)),
        }
    }

    /// Dense double-precision copy, the working form of the native estimators.
    pub fn to_dense_f64(&self) -> Array2<f64> {
        match self {
            Self::Dense32(d) => d.mapv(|v| v as f64),
            Self::Dense64(d) => d.clone(),
            Self::Sparse32(s) => csc_to_dense(s).mapv(|v| v as f64),
            Self::Sparse64(s) => csc_to_dense(s),
        }
    }

    /// Rows at `indices`, in that order, with the same dtype and layout.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        let n = self.n_samples();
        if let Some(bad) = indices.iter().find(|&&i| i >= n) {
            return Err(HyperkitError::dataset(format!(
                "row index {bad} out of bounds for {n} samples"
            )));
        }
        Ok(match self {
            Self::Dense32(d) => Self::Dense32(d.select(Axis(0), indices)),
            Self::Dense64(d) => Self::Dense64(d.select(Axis(0), indices)),
            Self::Sparse32(s) => Self::Sparse32(dense_to_csc(
                csc_to_dense(s).select(Axis(0), indices).view(),
            )?),
            Self::Sparse64(s) => Self::Sparse64(dense_to_csc(
                csc_to_dense(s).select(Axis(0), indices).view(),
            )?),
        })
    }

    /// Apply `f(column, value)` to every dense entry, or every stored sparse
    /// entry, computing in double precision and keeping dtype and layout.
    pub fn map_entries(&self, f: impl Fn(usize, f64) -> f64) -> Result<Self> {
        Ok(match self {
            Self::Dense32(d) => Self::Dense32(map_dense(d, &f)),
            Self::Dense64(d) => Self::Dense64(map_dense(d, &f)),
            Self::Sparse32(s) => {
                Self::Sparse32(map_csc(s, |_, col, v| f32::from_f64(f(col, v.to_f64())))?)
            }
            Self::Sparse64(s) => Self::Sparse64(map_csc(s, |_, col, v| f(col, v))?),
        })
    }

    /// SHA-256 of the matrix's debug representation.
    ///
    /// Large dense arrays print elided, so this only approximates identity.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(self)
    }
}

impl From<Array2<f32>> for FeatureMatrix {
    fn from(a: Array2<f32>) -> Self {
        Self::Dense32(a)
    }
}

impl From<Array2<f64>> for FeatureMatrix {
    fn from(a: Array2<f64>) -> Self {
        Self::Dense64(a)
    }
}

/// SHA-256 over the debug string of a label vector.
pub fn label_fingerprint(labels: &Array1<f64>) -> String {
    fingerprint_of(labels)
}

fn fingerprint_of(value: &impl fmt::Debug) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{value:?}").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build a CSC matrix from a dense view, storing every non-zero entry.
pub(crate) fn dense_to_csc<T: Element>(dense: ArrayView2<T>) -> Result<CsMat<T>> {
    let (rows, cols) = dense.dim();
    let mut indptr = Vec::with_capacity(cols + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0);
    for col in dense.axis_iter(Axis(1)) {
        for (row, &v) in col.iter().enumerate() {
            if !v.is_zero() {
                indices.push(row);
                data.push(v);
            }
        }
        indptr.push(indices.len());
    }
    build_csc((rows, cols), indptr, indices, data)
}

fn map_dense<T: Element>(dense: &Array2<T>, f: &impl Fn(usize, f64) -> f64) -> Array2<T> {
    Array2::from_shape_fn(dense.dim(), |(row, col)| {
        T::from_f64(f(col, dense[[row, col]].to_f64()))
    })
}

pub(crate) fn csc_to_dense<T: Element>(sparse: &CsMat<T>) -> Array2<T> {
    let mut dense = Array2::from_elem((sparse.rows(), sparse.cols()), T::default());
    for_each_stored(sparse, |row, col, v| dense[[row, col]] = v);
    dense
}

/// Visit every stored `(row, col, value)` of a CSC or CSR matrix.
pub(crate) fn for_each_stored<T: Element>(sparse: &CsMat<T>, mut f: impl FnMut(usize, usize, T)) {
    let csc = sparse.is_csc();
    for (outer, lane) in sparse.outer_iterator().enumerate() {
        for (inner, &v) in lane.iter() {
            if csc {
                f(inner, outer, v);
            } else {
                f(outer, inner, v);
            }
        }
    }
}

/// Rebuild a CSC matrix with a per-entry mapping, keeping the sparsity
/// structure.
pub(crate) fn map_csc<S: Element, T: Element>(
    sparse: &CsMat<S>,
    mut f: impl FnMut(usize, usize, S) -> T,
) -> Result<CsMat<T>> {
    let csc = if sparse.is_csc() {
        sparse.clone()
    } else {
        sparse.to_csc()
    };
    let mut indptr = Vec::with_capacity(csc.cols() + 1);
    let mut indices = Vec::with_capacity(csc.nnz());
    let mut data = Vec::with_capacity(csc.nnz());
    indptr.push(0);
    for (col, lane) in csc.outer_iterator().enumerate() {
        for (row, &v) in lane.iter() {
            indices.push(row);
            data.push(f(row, col, v));
        }
        indptr.push(indices.len());
    }
    build_csc((csc.rows(), csc.cols()), indptr, indices, data)
}

fn cast_csc<S: Element, T: Element>(sparse: &CsMat<S>) -> Result<CsMat<T>> {
    map_csc(sparse, |_, _, v| T::from_f64(v.to_f64()))
}

fn eliminate_zeros<T: Element>(sparse: &CsMat<T>) -> Result<CsMat<T>> {
    dense_to_csc(csc_to_dense(sparse).view())
}

fn build_csc<T: Element>(
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<T>,
) -> Result<CsMat<T>> {
    CsMat::try_new_csc(shape, indptr, indices, data)
        .map_err(|(_, _, _, e)| HyperkitError::dataset(format!("invalid sparse structure: {e}")))
}
