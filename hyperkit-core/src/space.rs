//! Hyperparameter search spaces and configurations.
//!
//! A [`ConfigurationSpace`] declares the tunable settings of a component,
//! each with a designated default. [`ConfigurationSpace::default_configuration`]
//! is what the harness uses to build estimators.

use crate::error::{HyperkitError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A concrete hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperparameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for HyperparameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

/// Domain of a single hyperparameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Domain {
    UniformFloat {
        lower: f64,
        upper: f64,
        default: f64,
        #[serde(default)]
        log: bool,
    },
    UniformInteger {
        lower: i64,
        upper: i64,
        default: i64,
        #[serde(default)]
        log: bool,
    },
    Categorical {
        choices: Vec<String>,
        default: String,
    },
    Constant {
        value: HyperparameterValue,
    },
}

/// A named hyperparameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperparameter {
    pub name: String,
    #[serde(flatten)]
    pub domain: Domain,
}

impl Hyperparameter {
    pub fn uniform_float(name: &str, lower: f64, upper: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            domain: Domain::UniformFloat {
                lower,
                upper,
                default,
                log: false,
            },
        }
    }

    pub fn log_uniform_float(name: &str, lower: f64, upper: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            domain: Domain::UniformFloat {
                lower,
                upper,
                default,
                log: true,
            },
        }
    }

    pub fn uniform_integer(name: &str, lower: i64, upper: i64, default: i64) -> Self {
        Self {
            name: name.to_string(),
            domain: Domain::UniformInteger {
                lower,
                upper,
                default,
                log: false,
            },
        }
    }

    pub fn log_uniform_integer(name: &str, lower: i64, upper: i64, default: i64) -> Self {
        Self {
            name: name.to_string(),
            domain: Domain::UniformInteger {
                lower,
                upper,
                default,
                log: true,
            },
        }
    }

    pub fn categorical(name: &str, choices: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            domain: Domain::Categorical {
                choices: choices.iter().map(|c| c.to_string()).collect(),
                default: default.to_string(),
            },
        }
    }

    pub fn constant(name: &str, value: HyperparameterValue) -> Self {
        Self {
            name: name.to_string(),
            domain: Domain::Constant { value },
        }
    }

    pub fn default_value(&self) -> HyperparameterValue {
        match &self.domain {
            Domain::UniformFloat { default, .. } => HyperparameterValue::Float(*default),
            Domain::UniformInteger { default, .. } => HyperparameterValue::Int(*default),
            Domain::Categorical { default, .. } => HyperparameterValue::Str(default.clone()),
            Domain::Constant { value } => value.clone(),
        }
    }

    fn check_domain(&self) -> Result<()> {
        let bad = |msg: String| Err(HyperkitError::invalid_hyperparameter(msg));
        match &self.domain {
            Domain::UniformFloat {
                lower,
                upper,
                default,
                log,
            } => {
                if !(lower.is_finite() && upper.is_finite() && default.is_finite())
                    || !(upper - lower).is_finite()
                {
                    return bad(format!(
                        "{}: bounds and default must be finite, got [{lower}, {upper}] default {default}",
                        self.name
                    ));
                }
                if lower >= upper {
                    return bad(format!("{}: lower {lower} >= upper {upper}", self.name));
                }
                if *log && *lower <= 0.0 {
                    return bad(format!("{}: log scale needs lower > 0", self.name));
                }
                if default < lower || default > upper {
                    return bad(format!("{}: default {default} out of range", self.name));
                }
            }
            Domain::UniformInteger {
                lower,
                upper,
                default,
                log,
            } => {
                if lower >= upper {
                    return bad(format!("{}: lower {lower} >= upper {upper}", self.name));
                }
                if *log && *lower <= 0 {
                    return bad(format!("{}: log scale needs lower > 0", self.name));
                }
                if default < lower || default > upper {
                    return bad(format!("{}: default {default} out of range", self.name));
                }
            }
            Domain::Categorical { choices, default } => {
                if choices.is_empty() {
                    return bad(format!("{}: no choices", self.name));
                }
                if !choices.contains(default) {
                    return bad(format!("{}: default {default} not a choice", self.name));
                }
            }
            Domain::Constant { .. } => {}
        }
        Ok(())
    }

    /// Whether `value` lies inside this hyperparameter's domain.
    pub fn contains(&self, value: &HyperparameterValue) -> bool {
        match (&self.domain, value) {
            (Domain::UniformFloat { lower, upper, .. }, HyperparameterValue::Float(v)) => {
                v >= lower && v <= upper
            }
            // Configuration::get_float widens integers, so `alpha = 1` is a float.
            (Domain::UniformFloat { lower, upper, .. }, HyperparameterValue::Int(v)) => {
                (*lower..=*upper).contains(&(*v as f64))
            }
            (Domain::UniformInteger { lower, upper, .. }, HyperparameterValue::Int(v)) => {
                v >= lower && v <= upper
            }
            (Domain::Categorical { choices, .. }, HyperparameterValue::Str(v)) => {
                choices.contains(v)
            }
            (Domain::Constant { value: expected }, v) => expected == v,
            _ => false,
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> HyperparameterValue {
        match &self.domain {
            Domain::UniformFloat {
                lower, upper, log, ..
            } => {
                let v = if *log {
                    rng.gen_range(lower.ln()..=upper.ln()).exp()
                } else {
                    rng.gen_range(*lower..=*upper)
                };
                HyperparameterValue::Float(v.clamp(*lower, *upper))
            }
            Domain::UniformInteger {
                lower, upper, log, ..
            } => {
                let v = if *log {
                    let x = rng.gen_range((*lower as f64).ln()..=(*upper as f64).ln());
                    x.exp().round() as i64
                } else {
                    rng.gen_range(*lower..=*upper)
                };
                HyperparameterValue::Int(v.clamp(*lower, *upper))
            }
            Domain::Categorical { choices, .. } => {
                HyperparameterValue::Str(choices[rng.gen_range(0..choices.len())].clone())
            }
            Domain::Constant { value } => value.clone(),
        }
    }
}

/// Ordered, name-unique set of hyperparameters.
///
/// Deserialization goes through [`ConfigurationSpace::add`], so a loaded
/// space holds the same guarantees as a built one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSpace")]
pub struct ConfigurationSpace {
    hyperparameters: Vec<Hyperparameter>,
}

#[derive(Deserialize)]
struct UncheckedSpace {
    #[serde(default)]
    hyperparameters: Vec<Hyperparameter>,
}

impl TryFrom<UncheckedSpace> for ConfigurationSpace {
    type Error = HyperkitError;

    fn try_from(raw: UncheckedSpace) -> Result<Self> {
        let mut space = Self::new();
        for hp in raw.hyperparameters {
            space.add(hp)?;
        }
        Ok(space)
    }
}

impl ConfigurationSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hyperparameter, rejecting duplicates and malformed domains.
    pub fn add(&mut self, hp: Hyperparameter) -> Result<()> {
        if self.get(&hp.name).is_some() {
            return Err(HyperkitError::invalid_hyperparameter(format!(
                "duplicate hyperparameter '{}'",
                hp.name
            )));
        }
        hp.check_domain()?;
        self.hyperparameters.push(hp);
        Ok(())
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, hp: Hyperparameter) -> Result<Self> {
        self.add(hp)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Hyperparameter> {
        self.hyperparameters.iter().find(|h| h.name == name)
    }

    pub fn hyperparameters(&self) -> &[Hyperparameter] {
        &self.hyperparameters
    }

    pub fn len(&self) -> usize {
        self.hyperparameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hyperparameters.is_empty()
    }

    pub fn default_configuration(&self) -> Configuration {
        Configuration {
            values: self
                .hyperparameters
                .iter()
                .map(|h| (h.name.clone(), h.default_value()))
                .collect(),
        }
    }

    pub fn sample_configuration<R: Rng + ?Sized>(&self, rng: &mut R) -> Configuration {
        Configuration {
            values: self
                .hyperparameters
                .iter()
                .map(|h| (h.name.clone(), h.sample(rng)))
                .collect(),
        }
    }

    /// Check that `config` assigns an in-domain value to every hyperparameter
    /// and nothing else.
    pub fn validate(&self, config: &Configuration) -> Result<()> {
        for name in config.values.keys() {
            if self.get(name).is_none() {
                return Err(HyperkitError::invalid_hyperparameter(format!(
                    "unknown hyperparameter '{name}'"
                )));
            }
        }
        for hp in &self.hyperparameters {
            match config.values.get(&hp.name) {
                None => {
                    return Err(HyperkitError::invalid_hyperparameter(format!(
                        "missing value for '{}'",
                        hp.name
                    )));
                }
                Some(v) if !hp.contains(v) => {
                    return Err(HyperkitError::invalid_hyperparameter(format!(
                        "value {v} outside domain of '{}'",
                        hp.name
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Name -> value assignment for one estimator construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub values: BTreeMap<String, HyperparameterValue>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: HyperparameterValue) {
        self.values.insert(name.to_string(), value);
    }

    fn lookup(&self, name: &str) -> Result<&HyperparameterValue> {
        self.values.get(name).ok_or_else(|| {
            HyperkitError::invalid_hyperparameter(format!("missing value for '{name}'"))
        })
    }

    fn mistyped(name: &str, expected: &str, got: &HyperparameterValue) -> HyperkitError {
        HyperkitError::invalid_hyperparameter(format!("'{name}' expected {expected}, got {got}"))
    }

    /// Float accessor; integer values are widened.
    pub fn get_float(&self, name: &str) -> Result<f64> {
        match self.lookup(name)? {
            HyperparameterValue::Float(v) => Ok(*v),
            HyperparameterValue::Int(v) => Ok(*v as f64),
            other => Err(Self::mistyped(name, "a float", other)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        match self.lookup(name)? {
            HyperparameterValue::Int(v) => Ok(*v),
            other => Err(Self::mistyped(name, "an integer", other)),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.lookup(name)? {
            HyperparameterValue::Str(v) => Ok(v),
            other => Err(Self::mistyped(name, "a string", other)),
        }
    }

    /// Bool accessor; the strings "True"/"False" are accepted too.
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.lookup(name)? {
            HyperparameterValue::Bool(v) => Ok(*v),
            HyperparameterValue::Str(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            HyperparameterValue::Str(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(Self::mistyped(name, "a bool", other)),
        }
    }
}
