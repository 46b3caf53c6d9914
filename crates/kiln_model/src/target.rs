//! Target descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dependency::Dependency;
use crate::files::{CoreDataModel, Headers, ResourceFileElement, SourceFile, TargetScript};
use crate::product::{Platform, Product};
use crate::settings::Settings;

/// A buildable unit inside a project.
///
/// Paths held by a target are absolute. The graph loader resolves
/// [`dependencies`](Target::dependencies) in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Target name, unique within its project.
    pub name: String,
    /// Platform the target builds for.
    pub platform: Platform,
    /// Kind of artifact produced.
    pub product: Product,
    /// Explicit product name; defaults to the target name.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Bundle identifier.
    pub bundle_id: String,
    /// Declared dependencies, in order.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Compiled sources.
    #[serde(default)]
    pub sources: Vec<SourceFile>,
    /// Bundled resources.
    #[serde(default)]
    pub resources: Vec<ResourceFileElement>,
    /// Header visibility groups.
    #[serde(default)]
    pub headers: Option<Headers>,
    /// Core Data models.
    #[serde(default)]
    pub core_data_models: Vec<CoreDataModel>,
    /// Script phases, in order.
    #[serde(default)]
    pub scripts: Vec<TargetScript>,
    /// Target-level settings.
    #[serde(default)]
    pub settings: Option<Settings>,
    /// Environment variables for run actions.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl Target {
    /// Creates a target with no inputs and no dependencies.
    pub fn new(
        name: impl Into<String>,
        platform: Platform,
        product: Product,
        bundle_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            platform,
            product,
            product_name: None,
            bundle_id: bundle_id.into(),
            dependencies: Vec::new(),
            sources: Vec::new(),
            resources: Vec::new(),
            headers: None,
            core_data_models: Vec::new(),
            scripts: Vec::new(),
            settings: None,
            environment: BTreeMap::new(),
        }
    }

    /// Returns the product name, falling back to the target name with `-` mapped to `_`.
    pub fn product_name(&self) -> String {
        match &self.product_name {
            Some(name) => name.clone(),
            None => self.name.replace('-', "_"),
        }
    }

    /// Returns the file name of the built product.
    pub fn product_name_with_extension(&self) -> String {
        let name = self.product_name();
        match self.product {
            Product::StaticLibrary | Product::DynamicLibrary => {
                format!("lib{name}.{}", self.product.extension().unwrap_or_default())
            }
            _ => match self.product.extension() {
                Some(ext) => format!("{name}.{ext}"),
                None => name,
            },
        }
    }

    /// Sets an explicit product name.
    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }

    /// Appends a dependency.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Replaces the dependency list.
    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Replaces the source list.
    pub fn with_sources(mut self, sources: Vec<SourceFile>) -> Self {
        self.sources = sources;
        self
    }

    /// Replaces the resource list.
    pub fn with_resources(mut self, resources: Vec<ResourceFileElement>) -> Self {
        self.resources = resources;
        self
    }

    /// Sets the header groups.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Replaces the Core Data models.
    pub fn with_core_data_models(mut self, models: Vec<CoreDataModel>) -> Self {
        self.core_data_models = models;
        self
    }

    /// Replaces the script phases.
    pub fn with_scripts(mut self, scripts: Vec<TargetScript>) -> Self {
        self.scripts = scripts;
        self
    }

    /// Sets target-level settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Adds an environment variable.
    pub fn with_environment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}
