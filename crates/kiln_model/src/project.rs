//! Projects and workspaces.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dependency::Package;
use crate::settings::Settings;
use crate::target::Target;

/// A set of targets sharing one directory and one settings base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Absolute path of the project directory.
    pub path: PathBuf,
    /// Project name.
    pub name: String,
    /// Project-level settings.
    #[serde(default)]
    pub settings: Settings,
    /// Declared targets, in order.
    #[serde(default)]
    pub targets: Vec<Target>,
    /// External packages the project declares.
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl Project {
    /// Creates an empty project.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            settings: Settings::default(),
            targets: Vec::new(),
            packages: Vec::new(),
        }
    }

    /// Appends a target.
    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Sets the project settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Appends a package declaration.
    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    /// Looks up a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// A collection of projects opened together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Absolute path of the workspace directory.
    pub path: PathBuf,
    /// Workspace name.
    pub name: String,
    /// Absolute paths of member projects.
    #[serde(default)]
    pub projects: Vec<PathBuf>,
}

impl Workspace {
    /// Creates a workspace over the given project paths.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, projects: Vec<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            projects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Platform, Product};

    #[test]
    fn target_lookup() {
        let project = Project::new("/p", "P")
            .with_target(Target::new("A", Platform::Ios, Product::App, "io.a"))
            .with_target(Target::new("B", Platform::Ios, Product::Framework, "io.b"));
        assert_eq!(project.target("B").map(|t| t.product), Some(Product::Framework));
        assert!(project.target("C").is_none());
    }
}
