//! References handed to the generation layer.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use kiln_model::SdkStatus;

use crate::node::TargetNode;

/// An artifact a target links, embeds, or copies.
///
/// Ordering is SDKs first, then products of other targets, then absolute
/// paths, so sorted results group by kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DependencyReference {
    /// A system framework or library.
    Sdk {
        /// Location inside the SDK.
        path: PathBuf,
        /// Required or weakly linked.
        status: SdkStatus,
    },
    /// A product built by another target in the same build.
    Product {
        /// Name of the producing target.
        target: String,
        /// File name of the product.
        product_name: String,
    },
    /// A file-system artifact linked directly.
    Absolute {
        /// Path of the artifact.
        path: PathBuf,
    },
}

impl DependencyReference {
    /// References the product built by `node`.
    pub fn product(node: &TargetNode) -> Self {
        DependencyReference::Product {
            target: node.target.name.clone(),
            product_name: node.target.product_name_with_extension(),
        }
    }

    /// References an artifact on disk.
    pub fn absolute(path: impl Into<PathBuf>) -> Self {
        DependencyReference::Absolute { path: path.into() }
    }
}

impl fmt::Display for DependencyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyReference::Sdk { path, status } => {
                write!(f, "sdk {} ({})", path.display(), status.as_str())
            }
            DependencyReference::Product { product_name, .. } => f.write_str(product_name),
            DependencyReference::Absolute { path } => write!(f, "{}", path.display()),
        }
    }
}
