//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use anyhow::Context;
use hyperkit_core::data::available_datasets;
use hyperkit_core::harness::{
    check_preprocessing_dtype_by_name, run_classifier_by_name, run_preprocessing_by_name,
    run_regressor_by_name,
};
use hyperkit_core::metrics::{accuracy, mean_squared_error, r2_score};
use hyperkit_core::{Capability, ComponentRegistry, HarnessConfig, load_config};
use serde_json::{Value, json};
use std::path::Path;
use tracing::info;

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let registry = ComponentRegistry::builtin();
    let output = match command {
        Commands::Config { action } => return handle_config(action, workspace, config_file),
        Commands::Scan { capability } => {
            let config = resolve_config(workspace, config_file)?;
            scan(&registry, capability, &config)
        }
        Commands::Space { component } => {
            let descriptor = registry
                .get(&component)
                .with_context(|| format!("Unknown component '{component}'"))?;
            serde_json::to_value(descriptor.search_space()?)?
        }
        Commands::Defaults { component, toml } => {
            let defaults = registry.default_configuration(&component)?;
            if toml {
                println!("{}", toml::to_string_pretty(&defaults)?);
                return Ok(());
            }
            serde_json::to_value(defaults)?
        }
        Commands::Smoke {
            component,
            dataset,
            sparse,
            nans,
        } => {
            let config = resolve_config(workspace, config_file)?;
            smoke(&registry, &component, dataset.as_deref(), sparse, nans, &config)?
        }
        Commands::Datasets => {
            let config = resolve_config(workspace, config_file)?;
            json!(available_datasets(&config))
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Layered config, with `config_file` (if any) merged over it key by key.
fn resolve_config(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<HarnessConfig> {
    let config = load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    let Some(path) = config_file else {
        return Ok(config);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let overrides: toml::Table = toml::from_str(&content)
        .with_context(|| format!("Invalid TOML in {}", path.display()))?;
    let mut merged = toml::Value::try_from(&config)?;
    if let toml::Value::Table(table) = &mut merged {
        table.extend(overrides);
    }
    Ok(merged.try_into()?)
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".hyperkit");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&HarnessConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = resolve_config(workspace, config_file)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn scan(
    registry: &ComponentRegistry,
    capability: Option<Capability>,
    config: &HarnessConfig,
) -> Value {
    let capabilities: Vec<Capability> = match capability {
        Some(c) => vec![c],
        None => Capability::ALL.to_vec(),
    };
    let mut out = serde_json::Map::new();
    for capability in capabilities {
        let names = registry.find_components(capability, &config.skip_modules);
        out.insert(capability.to_string(), json!(names));
    }
    Value::Object(out)
}

fn smoke(
    registry: &ComponentRegistry,
    component: &str,
    dataset: Option<&str>,
    sparse: bool,
    nans: bool,
    config: &HarnessConfig,
) -> anyhow::Result<Value> {
    let descriptor = registry
        .get(component)
        .with_context(|| format!("Unknown component '{component}'"))?;
    let properties = &descriptor.properties;

    if properties.has(Capability::Classifier) {
        let dataset = dataset.unwrap_or(&config.default_classification_dataset);
        let (predictions, y_test) = run_classifier_by_name(registry, component, dataset, config)?;
        let score = accuracy(&y_test, &predictions)?;
        info!(component, dataset, score, "Classifier smoke run finished");
        return Ok(json!({
            "component": component,
            "capability": Capability::Classifier,
            "dataset": dataset,
            "test_samples": y_test.len(),
            "accuracy": score,
        }));
    }

    if properties.has(Capability::Regressor) {
        let dataset = dataset.unwrap_or(&config.default_regression_dataset);
        let (predictions, y_test) = run_regressor_by_name(registry, component, dataset, config)?;
        let r2 = r2_score(&y_test, &predictions)?;
        let mse = mean_squared_error(&y_test, &predictions)?;
        info!(component, dataset, r2, "Regressor smoke run finished");
        return Ok(json!({
            "component": component,
            "capability": Capability::Regressor,
            "dataset": dataset,
            "test_samples": y_test.len(),
            "r2": r2,
            "mse": mse,
        }));
    }

    let dataset = dataset.unwrap_or(&config.default_classification_dataset);
    let (transformed, original) =
        run_preprocessing_by_name(registry, component, dataset, sparse, config)?;
    check_preprocessing_dtype_by_name(registry, component, nans, config)?;
    info!(component, dataset, "Transformer smoke run finished");
    Ok(json!({
        "component": component,
        "capability": Capability::Transformer,
        "dataset": dataset,
        "shape": [transformed.n_samples(), transformed.n_features()],
        "dtype": transformed.dtype(),
        "layout": transformed.layout(),
        "input_nnz": original.nnz(),
        "output_nnz": transformed.nnz(),
        "dtype_preserved": true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_init_writes_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        handle_config(ConfigAction::Init, dir.path(), None).unwrap();

        let config_path = dir.path().join(".hyperkit").join("config.toml");
        assert!(config_path.exists());
        let content = std::fs::read_to_string(&config_path).unwrap();
        let parsed: HarnessConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.seed, 42);
        assert_eq!(parsed.max_train_size, 150);
    }

    #[test]
    fn test_config_file_overrides_single_keys() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("extra.toml");
        std::fs::write(&file, "seed = 7\nskip_modules = [\"neighbors\"]\n").unwrap();
        let config = resolve_config(dir.path(), Some(&file)).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.skip_modules, vec!["neighbors".to_string()]);
        assert_eq!(config.random_state, 1);
    }

    #[test]
    fn test_scan_honors_skip_modules() {
        let config = HarnessConfig {
            skip_modules: vec!["neighbors".to_string()],
            ..HarnessConfig::default()
        };
        let out = scan(
            &ComponentRegistry::builtin(),
            Some(Capability::Classifier),
            &config,
        );
        assert_eq!(out, json!({ "classifier": ["gaussian_nb"] }));
    }

    #[test]
    fn test_smoke_reports_scores() {
        let registry = ComponentRegistry::builtin();
        let config = HarnessConfig::default();

        let out = smoke(&registry, "gaussian_nb", None, false, false, &config).unwrap();
        assert_eq!(out["dataset"], "iris");
        assert!(out["accuracy"].as_f64().unwrap() > 0.8);

        let out = smoke(&registry, "ridge_regression", None, false, false, &config).unwrap();
        assert_eq!(out["dataset"], "friedman1");
        assert!(out["r2"].as_f64().is_some());

        let out = smoke(&registry, "rescaling", None, true, true, &config).unwrap();
        assert_eq!(out["layout"], "sparse");
        assert_eq!(out["dtype"], "float32");
    }

    #[test]
    fn test_smoke_unknown_component() {
        let err = smoke(
            &ComponentRegistry::builtin(),
            "svm",
            None,
            false,
            false,
            &HarnessConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("svm"));
    }
}
