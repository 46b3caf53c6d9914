//! File-backed inputs of a target: sources, resources, headers, scripts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A compiled source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Extra compiler flags applied to this file only.
    #[serde(default)]
    pub compiler_flags: Option<String>,
}

impl SourceFile {
    /// Creates a source file without per-file flags.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            compiler_flags: None,
        }
    }

    /// Sets per-file compiler flags.
    pub fn with_compiler_flags(mut self, flags: impl Into<String>) -> Self {
        self.compiler_flags = Some(flags.into());
        self
    }
}

/// A resource copied into the product bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResourceFileElement {
    /// A single file.
    File {
        /// Absolute path of the file.
        path: PathBuf,
        /// On-demand resource tags.
        #[serde(default)]
        tags: Vec<String>,
    },
    /// A directory copied as a whole.
    FolderReference {
        /// Absolute path of the directory.
        path: PathBuf,
        /// On-demand resource tags.
        #[serde(default)]
        tags: Vec<String>,
    },
}

impl ResourceFileElement {
    /// Creates an untagged file resource.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ResourceFileElement::File {
            path: path.into(),
            tags: Vec::new(),
        }
    }

    /// Creates an untagged folder reference.
    pub fn folder_reference(path: impl Into<PathBuf>) -> Self {
        ResourceFileElement::FolderReference {
            path: path.into(),
            tags: Vec::new(),
        }
    }

    /// Returns the resource path.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::File { path, .. } | Self::FolderReference { path, .. } => path,
        }
    }

    /// Returns the resource tags.
    pub fn tags(&self) -> &[String] {
        match self {
            Self::File { tags, .. } | Self::FolderReference { tags, .. } => tags,
        }
    }

    /// Returns `true` for folder references.
    pub fn is_folder_reference(&self) -> bool {
        matches!(self, ResourceFileElement::FolderReference { .. })
    }
}

/// A versioned Core Data model bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreDataModel {
    /// Absolute path of the `.xcdatamodeld` directory.
    pub path: PathBuf,
    /// Absolute paths of every model version.
    #[serde(default)]
    pub versions: Vec<PathBuf>,
    /// Name of the active version.
    pub current_version: String,
}

/// When a script phase runs relative to compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptOrder {
    /// Before sources compile.
    Pre,
    /// After sources compile.
    Post,
}

/// A shell script phase attached to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetScript {
    /// Phase name.
    pub name: String,
    /// Pre- or post-compilation.
    pub order: ScriptOrder,
    /// Script body.
    pub script: String,
    /// Declared inputs.
    #[serde(default)]
    pub input_paths: Vec<PathBuf>,
    /// Declared outputs.
    #[serde(default)]
    pub output_paths: Vec<PathBuf>,
}

/// Header files grouped by visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    /// Headers exported to dependents.
    #[serde(default)]
    pub public: Vec<PathBuf>,
    /// Headers visible inside the module only.
    #[serde(default)]
    pub private: Vec<PathBuf>,
    /// Headers not shipped with the product.
    #[serde(default)]
    pub project: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_accessors() {
        let folder = ResourceFileElement::folder_reference("/p/Assets");
        assert!(folder.is_folder_reference());
        assert_eq!(folder.path(), &PathBuf::from("/p/Assets"));
        assert!(folder.tags().is_empty());
    }

    #[test]
    fn source_with_flags() {
        let source = SourceFile::new("/p/a.m").with_compiler_flags("-fno-objc-arc");
        assert_eq!(source.compiler_flags.as_deref(), Some("-fno-objc-arc"));
    }
}
