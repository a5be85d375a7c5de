//! Reference datasets: bundled, generated, or read from the CSV dataset cache.

use crate::config::HarnessConfig;
use crate::error::{HyperkitError, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;
use tracing::debug;

const IRIS_CSV: &str = include_str!("../../data/iris.csv");

const FRIEDMAN1_SAMPLES: usize = 442;
const FRIEDMAN1_FEATURES: usize = 10;
const FRIEDMAN1_SEED: u64 = 0;

/// Datasets available without touching the filesystem.
pub const BUNDLED_DATASETS: &[&str] = &["iris", "friedman1"];

/// Learning task a dataset's target encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Classification,
    Regression,
}

/// A full reference dataset before shuffling and splitting.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub name: String,
    pub feature_names: Vec<String>,
    pub data: Array2<f64>,
    pub target: Array1<f64>,
    pub task: Task,
}

impl RawDataset {
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }
}

/// Load a dataset by name.
///
/// `iris` and `friedman1` are built in; any other name is read from
/// `<dataset_dir>/<name>.csv`.
pub fn load_dataset(name: &str, config: &HarnessConfig) -> Result<RawDataset> {
    let dataset = match name {
        "iris" => parse_csv("iris", IRIS_CSV)?,
        "friedman1" => friedman1(),
        other => {
            let dir = config.resolved_dataset_dir().ok_or_else(|| {
                HyperkitError::not_found(format!("dataset '{other}' (no dataset directory)"))
            })?;
            load_csv_dataset(other, &dir)?
        }
    };
    debug!(
        dataset = %dataset.name,
        samples = dataset.n_samples(),
        features = dataset.n_features(),
        "Loaded dataset"
    );
    Ok(dataset)
}

/// Names of every loadable dataset, bundled ones first.
pub fn available_datasets(config: &HarnessConfig) -> Vec<String> {
    let mut names: Vec<String> = BUNDLED_DATASETS.iter().map(|s| s.to_string()).collect();
    if let Some(dir) = config.resolved_dataset_dir() {
        if let Ok(entries) = std::fs::read_dir(&dir) {
            let mut cached: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
                .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
                .filter(|n| !names.contains(n))
                .collect();
            cached.sort();
            names.extend(cached);
        }
    }
    names
}

fn load_csv_dataset(name: &str, dir: &Path) -> Result<RawDataset> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(HyperkitError::dataset(format!("invalid dataset name '{name}'")));
    }
    let path = dir.join(format!("{name}.csv"));
    if !path.exists() {
        return Err(HyperkitError::not_found(format!(
            "dataset '{name}' ({} does not exist)",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(&path)?;
    parse_csv(name, &content)
}

/// Parse a headed CSV whose last column is the target.
///
/// The task is classification when every target is a small non-negative
/// integer, regression otherwise.
pub fn parse_csv(name: &str, content: &str) -> Result<RawDataset> {
    let csv_error = |e: csv::Error| HyperkitError::dataset(format!("{name}: {e}"));
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if header.len() < 2 {
        return Err(HyperkitError::dataset(format!(
            "{name}: need at least one feature and a target column"
        )));
    }
    let n_features = header.len() - 1;

    let mut values = Vec::new();
    let mut target = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        for (i, cell) in record.iter().enumerate() {
            let v = parse_cell(cell).ok_or_else(|| {
                HyperkitError::dataset(format!(
                    "{name}: row {} column '{}' is not numeric: '{cell}'",
                    row + 1,
                    header[i]
                ))
            })?;
            if i < n_features {
                values.push(v);
            } else {
                target.push(v);
            }
        }
    }
    if target.is_empty() {
        return Err(HyperkitError::dataset(format!("{name}: no rows")));
    }

    let data = Array2::from_shape_vec((target.len(), n_features), values)
        .map_err(|e| HyperkitError::dataset(format!("{name}: {e}")))?;
    let task = if target
        .iter()
        .all(|&t| t >= 0.0 && t.fract() == 0.0 && t < 1000.0)
    {
        Task::Classification
    } else {
        Task::Regression
    };

    Ok(RawDataset {
        name: name.to_string(),
        feature_names: header[..n_features].to_vec(),
        data,
        target: Array1::from(target),
        task,
    })
}

fn parse_cell(cell: &str) -> Option<f64> {
    match cell {
        "" | "nan" | "NaN" | "NA" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

/// Friedman #1 regression problem: five informative uniform features, five
/// noise features, unit Gaussian noise on the target.
fn friedman1() -> RawDataset {
    let mut rng = StdRng::seed_from_u64(FRIEDMAN1_SEED);
    let data = Array2::from_shape_simple_fn((FRIEDMAN1_SAMPLES, FRIEDMAN1_FEATURES), || {
        rng.r#gen::<f64>()
    });
    let target = data
        .rows()
        .into_iter()
        .map(|x| {
            10.0 * (PI * x[0] * x[1]).sin()
                + 20.0 * (x[2] - 0.5).powi(2)
                + 10.0 * x[3]
                + 5.0 * x[4]
                + rng.sample::<f64, _>(StandardNormal)
        })
        .collect::<Array1<f64>>();

    RawDataset {
        name: "friedman1".to_string(),
        feature_names: (0..FRIEDMAN1_FEATURES).map(|i| format!("x{i}")).collect(),
        data,
        target,
        task: Task::Regression,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iris_shape_and_classes() {
        let iris = load_dataset("iris", &HarnessConfig::default()).unwrap();
        assert_eq!(iris.data.dim(), (150, 4));
        assert_eq!(iris.task, Task::Classification);
        for class in 0..3 {
            let count = iris.target.iter().filter(|&&t| t == class as f64).count();
            assert_eq!(count, 50);
        }
        assert_eq!(iris.feature_names[0], "sepal_length");
    }

    #[test]
    fn test_friedman1_is_deterministic() {
        let a = load_dataset("friedman1", &HarnessConfig::default()).unwrap();
        let b = load_dataset("friedman1", &HarnessConfig::default()).unwrap();
        assert_eq!(a.data.dim(), (442, 10));
        assert_eq!(a.task, Task::Regression);
        assert_eq!(a.data, b.data);
        assert_eq!(a.target, b.target);
        assert!(a.data.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_friedman1_noise_is_standard_normal() {
        let ds = load_dataset("friedman1", &HarnessConfig::default()).unwrap();
        let residuals: Vec<f64> = ds
            .data
            .rows()
            .into_iter()
            .zip(ds.target.iter())
            .map(|(x, &y)| {
                y - (10.0 * (PI * x[0] * x[1]).sin()
                    + 20.0 * (x[2] - 0.5).powi(2)
                    + 10.0 * x[3]
                    + 5.0 * x[4])
            })
            .collect();
        let n = residuals.len() as f64;
        let mean = residuals.iter().sum::<f64>() / n;
        let var = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.25, "mean {mean}");
        assert!((0.7..1.3).contains(&var), "variance {var}");
    }

    #[test]
    fn test_unknown_dataset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig {
            dataset_dir: Some(dir.path().to_path_buf()),
            ..HarnessConfig::default()
        };
        let err = load_dataset("no_such_dataset", &config).unwrap_err();
        assert!(matches!(err, HyperkitError::NotFound(_)));
    }

    #[test]
    fn test_csv_dataset_from_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tiny.csv"),
            "a,b,y\n1.0,2.0,0.5\n3.0,,1.5\n5.0,6.0,2.25\n",
        )
        .unwrap();
        let config = HarnessConfig {
            dataset_dir: Some(dir.path().to_path_buf()),
            ..HarnessConfig::default()
        };
        let ds = load_dataset("tiny", &config).unwrap();
        assert_eq!(ds.data.dim(), (3, 2));
        assert!(ds.data[[1, 1]].is_nan());
        assert_eq!(ds.task, Task::Regression);

        let names = available_datasets(&config);
        assert_eq!(names, vec!["iris", "friedman1", "tiny"]);
    }

    #[test]
    fn test_quoted_header_with_comma() {
        let ds = parse_csv("quoted", "\"width, cm\",label\n1.5,0\n2.5,1\n").unwrap();
        assert_eq!(ds.feature_names, vec!["width, cm"]);
        assert_eq!(ds.data.dim(), (2, 1));
        assert_eq!(ds.target.to_vec(), vec![0.0, 1.0]);
        assert_eq!(ds.task, Task::Classification);
    }

    #[test]
    fn test_quoted_cells_and_blank_lines() {
        let ds = parse_csv("q", "a,y\n\"1.5\",\"NA\"\n\n 2.0 , 3.5\n").unwrap();
        assert_eq!(ds.data.dim(), (2, 1));
        assert!(ds.target[0].is_nan());
        assert_eq!(ds.data[[1, 0]], 2.0);
        assert!(matches!(parse_csv("empty", ""), Err(HyperkitError::Dataset(_))));
    }

    #[test]
    fn test_rejects_ragged_rows_and_path_names() {
        assert!(parse_csv("bad", "a,y\n1,2,3\n").is_err());
        assert!(parse_csv("bad", "a,y\nx,1\n").is_err());
        let config = HarnessConfig {
            dataset_dir: Some(std::env::temp_dir()),
            ..HarnessConfig::default()
        };
        assert!(matches!(
            load_dataset("../etc/passwd", &config),
            Err(HyperkitError::Dataset(_))
        ));
    }
}
