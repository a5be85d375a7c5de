//! Error types for the hyperkit-core crate.

use crate::matrix::Dtype;
use thiserror::Error;

/// Top-level error type for hyperkit operations.
#[derive(Debug, Error)]
pub enum HyperkitError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    #[error("Estimator error: {0}")]
    Estimator(String),

    #[error("Estimator not fitted: {0}")]
    NotFitted(String),

    #[error("Shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Dtype mismatch: expected {expected}, got {actual}")]
    DtypeMismatch { expected: Dtype, actual: Dtype },

    #[error("{0}")]
    DataModified(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl HyperkitError {
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_hyperparameter(msg: impl Into<String>) -> Self {
        Self::InvalidHyperparameter(msg.into())
    }

    pub fn estimator(msg: impl Into<String>) -> Self {
        Self::Estimator(msg.into())
    }

    pub fn not_fitted(component: impl Into<String>) -> Self {
        Self::NotFitted(component.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HyperkitError>;
