//! Component catalog and capability scan.

use crate::error::{HyperkitError, Result};
use crate::estimator::{
    Capability, Classifier, Component, ComponentProperties, GaussianNaiveBayes, Imputation,
    KNearestNeighborsClassifier, KNearestNeighborsRegressor, NoPreprocessing, Regressor,
    Rescaling, RidgeRegression, Transformer,
};
use crate::space::{Configuration, ConfigurationSpace};
use std::collections::BTreeSet;
use std::fmt;
use tracing::info;

type ClassifierFactory = fn(&Configuration, u64) -> Result<Box<dyn Classifier>>;
type RegressorFactory = fn(&Configuration, u64) -> Result<Box<dyn Regressor>>;
type TransformerFactory = fn(&Configuration, u64) -> Result<Box<dyn Transformer>>;

#[derive(Clone, Copy)]
enum Factory {
    Classifier(ClassifierFactory),
    Regressor(RegressorFactory),
    Transformer(TransformerFactory),
}

/// A registered component.
#[derive(Clone)]
pub struct ComponentDescriptor {
    /// Dotted module path, e.g. `classification.naive_bayes`.
    pub module: &'static str,
    pub properties: ComponentProperties,
    search_space: fn() -> Result<ConfigurationSpace>,
    factory: Factory,
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("module", &self.module)
            .field("name", &self.properties.name)
            .finish()
    }
}

fn make_classifier<C: Component + Classifier + 'static>(
    config: &Configuration,
    random_state: u64,
) -> Result<Box<dyn Classifier>> {
    Ok(Box::new(C::from_configuration(config, random_state)?))
}

fn make_regressor<R: Component + Regressor + 'static>(
    config: &Configuration,
    random_state: u64,
) -> Result<Box<dyn Regressor>> {
    Ok(Box::new(R::from_configuration(config, random_state)?))
}

fn make_transformer<T: Component + Transformer + 'static>(
    config: &Configuration,
    random_state: u64,
) -> Result<Box<dyn Transformer>> {
    Ok(Box::new(T::from_configuration(config, random_state)?))
}

impl ComponentDescriptor {
    pub fn classifier<C: Component + Classifier + 'static>(module: &'static str) -> Self {
        Self {
            module,
            properties: C::properties(),
            search_space: C::search_space,
            factory: Factory::Classifier(make_classifier::<C>),
        }
    }

    pub fn regressor<R: Component + Regressor + 'static>(module: &'static str) -> Self {
        Self {
            module,
            properties: R::properties(),
            search_space: R::search_space,
            factory: Factory::Regressor(make_regressor::<R>),
        }
    }

    pub fn transformer<T: Component + Transformer + 'static>(module: &'static str) -> Self {
        Self {
            module,
            properties: T::properties(),
            search_space: T::search_space,
            factory: Factory::Transformer(make_transformer::<T>),
        }
    }

    pub fn name(&self) -> &'static str {
        self.properties.name
    }

    pub fn search_space(&self) -> Result<ConfigurationSpace> {
        (self.search_space)()
    }

    /// Whether this component lives in, or under, `module`. A bare segment
    /// such as `neighbors` matches any path ending in it.
    fn in_module(&self, module: &str) -> bool {
        self.module == module
            || self
                .module
                .strip_prefix(module)
                .is_some_and(|rest| rest.starts_with('.'))
            || self.module.rsplit('.').next() == Some(module)
    }
}

/// Catalog of every available component.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: Vec<ComponentDescriptor>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every native component.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ComponentDescriptor::classifier::<GaussianNaiveBayes>(
            "classification.naive_bayes",
        ));
        registry.register(ComponentDescriptor::classifier::<KNearestNeighborsClassifier>(
            "classification.neighbors",
        ));
        registry.register(ComponentDescriptor::regressor::<RidgeRegression>(
            "regression.ridge",
        ));
        registry.register(ComponentDescriptor::regressor::<KNearestNeighborsRegressor>(
            "regression.neighbors",
        ));
        registry.register(ComponentDescriptor::transformer::<Rescaling>(
            "preprocessing.rescaling",
        ));
        registry.register(ComponentDescriptor::transformer::<Imputation>(
            "preprocessing.imputation",
        ));
        registry.register(ComponentDescriptor::transformer::<NoPreprocessing>(
            "preprocessing.no_preprocessing",
        ));
        registry
    }

    /// Add a component, replacing any existing one with the same name.
    pub fn register(&mut self, descriptor: ComponentDescriptor) {
        self.components.retain(|c| c.name() != descriptor.name());
        self.components.push(descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|c| c.name() == name)
    }

    pub fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    /// Distinct module paths, sorted.
    pub fn modules(&self) -> BTreeSet<&'static str> {
        self.components.iter().map(|c| c.module).collect()
    }

    /// Names of every component with `capability`, walking module by module
    /// and skipping any module listed in `skip_modules`.
    pub fn find_components(
        &self,
        capability: Capability,
        skip_modules: &[String],
    ) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for module in self.modules() {
            if let Some(skip) = skip_modules.iter().find(|s| {
                self.components
                    .iter()
                    .any(|c| c.module == module && c.in_module(s))
            }) {
                info!(module, skip = %skip, "Skipping {module}");
                continue;
            }
            for component in self.components.iter().filter(|c| c.module == module) {
                if component.properties.has(capability) {
                    found.insert(component.name().to_string());
                }
            }
        }
        info!(capability = %capability, components = ?found, "Capability scan finished");
        found
    }

    fn lookup(&self, name: &str) -> Result<&ComponentDescriptor> {
        self.get(name)
            .ok_or_else(|| HyperkitError::not_found(format!("component '{name}'")))
    }

    pub fn default_configuration(&self, name: &str) -> Result<Configuration> {
        Ok(self.lookup(name)?.search_space()?.default_configuration())
    }

    fn checked(&self, name: &str, config: &Configuration) -> Result<&ComponentDescriptor> {
        let descriptor = self.lookup(name)?;
        descriptor.search_space()?.validate(config)?;
        Ok(descriptor)
    }

    pub fn build_classifier(
        &self,
        name: &str,
        config: &Configuration,
        random_state: u64,
    ) -> Result<Box<dyn Classifier>> {
        match self.checked(name, config)?.factory {
            Factory::Classifier(make) => make(config, random_state),
            _ => Err(HyperkitError::not_found(format!("classifier '{name}'"))),
        }
    }

    pub fn build_regressor(
        &self,
        name: &str,
        config: &Configuration,
        random_state: u64,
    ) -> Result<Box<dyn Regressor>> {
        match self.checked(name, config)?.factory {
            Factory::Regressor(make) => make(config, random_state),
            _ => Err(HyperkitError::not_found(format!("regressor '{name}'"))),
        }
    }

    pub fn build_transformer(
        &self,
        name: &str,
        config: &Configuration,
        random_state: u64,
    ) -> Result<Box<dyn Transformer>> {
        match self.checked(name, config)?.factory {
            Factory::Transformer(make) => make(config, random_state),
            _ => Err(HyperkitError::not_found(format!("transformer '{name}'"))),
        }
    }
}
