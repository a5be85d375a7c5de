//! Configuration for the smoke-test harness.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides. Configuration is
//! loaded from `~/.config/hyperkit/config.toml` and/or `.hyperkit/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings shared by dataset preparation and the harness helpers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Seed for the shuffle and for every random mask applied to a split.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// `random_state` handed to every estimator built by the harness.
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    /// Fraction of samples assigned to the training split.
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    /// Upper bound on the number of training samples.
    #[serde(default = "default_max_train_size")]
    pub max_train_size: usize,
    /// Probability that a training entry is replaced by NaN.
    #[serde(default = "default_half")]
    pub nan_probability: f64,
    /// Probability that an entry is zeroed before sparse repackaging.
    #[serde(default = "default_half")]
    pub sparse_zero_probability: f64,
    /// Directory holding `<name>.csv` datasets beyond the bundled ones.
    #[serde(default)]
    pub dataset_dir: Option<PathBuf>,
    /// Module paths the capability scan skips.
    #[serde(default)]
    pub skip_modules: Vec<String>,
    #[serde(default = "default_classification_dataset")]
    pub default_classification_dataset: String,
    #[serde(default = "default_regression_dataset")]
    pub default_regression_dataset: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            random_state: default_random_state(),
            train_fraction: default_train_fraction(),
            max_train_size: default_max_train_size(),
            nan_probability: default_half(),
            sparse_zero_probability: default_half(),
            dataset_dir: None,
            skip_modules: Vec::new(),
            default_classification_dataset: default_classification_dataset(),
            default_regression_dataset: default_regression_dataset(),
        }
    }
}

impl HarnessConfig {
    /// Directory used for CSV datasets: the configured one, or the
    /// per-user data directory.
    pub fn resolved_dataset_dir(&self) -> Option<PathBuf> {
        self.dataset_dir.clone().or_else(|| {
            directories::ProjectDirs::from("dev", "hyperkit", "hyperkit")
                .map(|d| d.data_dir().join("datasets"))
        })
    }
}

fn default_seed() -> u64 {
    42
}

fn default_random_state() -> u64 {
    1
}

fn default_train_fraction() -> f64 {
    2.0 / 3.0
}

fn default_max_train_size() -> usize {
    150
}

fn default_half() -> f64 {
    0.5
}

fn default_classification_dataset() -> String {
    "iris".to_string()
}

fn default_regression_dataset() -> String {
    "friedman1".to_string()
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `HYPERKIT_`)
/// 3. Workspace-local config (`.hyperkit/config.toml`)
/// 4. User config (`~/.config/hyperkit/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&HarnessConfig>,
) -> Result<HarnessConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(HarnessConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "hyperkit", "hyperkit") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".hyperkit").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // HYPERKIT_SEED, HYPERKIT_DATASET_DIR, ...
    figment = figment.merge(Env::prefixed("HYPERKIT_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}
