//! # hyperkit-core: search spaces, native estimators and smoke-test helpers
//!
//! Every component declares a hyperparameter search space with a designated
//! default. The [`harness`] module builds components from those defaults, fits
//! them on deterministic splits of small reference datasets and checks the
//! invariants every component must keep:
//!
//! 1. **Determinism**: a fixed seed gives the same split every time
//! 2. **Non-mutation**: fitting never changes its inputs
//! 3. **Dtype preservation**: transforms return the precision and layout they were given

// Foundation
pub mod config;
pub mod error;

// Data
pub mod data;
pub mod matrix;

// Components
pub mod estimator;
pub mod registry;
pub mod space;

// Evaluation
pub mod harness;
pub mod metrics;

// Re-exports
pub use config::{HarnessConfig, load_config};
pub use data::{DatasetSplit, get_dataset};
pub use error::{HyperkitError, Result};
pub use estimator::{Capability, Classifier, Component, Regressor, Transformer};
pub use matrix::{Dtype, FeatureMatrix, Layout};
pub use registry::ComponentRegistry;
pub use space::{Configuration, ConfigurationSpace, Hyperparameter, HyperparameterValue};
