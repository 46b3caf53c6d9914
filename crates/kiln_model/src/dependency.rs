//! Declared dependencies of a target.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whether a system SDK must be present at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkStatus {
    /// Linking fails if the SDK is absent.
    Required,
    /// The SDK is weakly linked.
    Optional,
}

impl SdkStatus {
    /// Returns the lowercase status name.
    pub fn as_str(self) -> &'static str {
        match self {
            SdkStatus::Required => "required",
            SdkStatus::Optional => "optional",
        }
    }
}

/// Version constraint on a remote package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VersionRequirement {
    /// Any version compatible with the given major version.
    UpToNextMajor {
        /// Lower bound.
        version: String,
    },
    /// Any version compatible with the given minor version.
    UpToNextMinor {
        /// Lower bound.
        version: String,
    },
    /// Exactly this version.
    Exact {
        /// Pinned version.
        version: String,
    },
    /// A half-open version range.
    Range {
        /// Inclusive lower bound.
        from: String,
        /// Exclusive upper bound.
        to: String,
    },
    /// The tip of a branch.
    Branch {
        /// Branch name.
        branch: String,
    },
    /// A specific revision.
    Revision {
        /// Revision identifier.
        revision: String,
    },
}

/// An external package declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Package {
    /// A package fetched from a repository URL.
    Remote {
        /// Repository URL.
        url: String,
        /// Accepted versions.
        requirement: VersionRequirement,
    },
    /// A package checked out on disk.
    Local {
        /// Absolute path to the package root.
        path: PathBuf,
    },
}

impl Package {
    /// Returns a string that identifies the package source.
    pub fn location(&self) -> String {
        match self {
            Package::Remote { url, .. } => url.clone(),
            Package::Local { path } => path.display().to_string(),
        }
    }
}

/// A single declared dependency of a target, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Dependency {
    /// Another target of the same project.
    Target {
        /// Target name.
        name: String,
    },
    /// A target of another project.
    Project {
        /// Target name inside the other project.
        target: String,
        /// Absolute path of the other project.
        path: PathBuf,
    },
    /// A precompiled `.framework` bundle.
    Framework {
        /// Absolute path of the bundle.
        path: PathBuf,
    },
    /// A precompiled `.xcframework` holding one slice per platform variant.
    #[serde(rename = "xcframework")]
    XcFramework {
        /// Absolute path of the bundle.
        path: PathBuf,
    },
    /// A precompiled static or dynamic library.
    Library {
        /// Absolute path of the binary.
        path: PathBuf,
        /// Directory holding the library's public headers.
        public_headers: PathBuf,
        /// Optional module map exposing the library to Swift.
        #[serde(default)]
        swift_module_map: Option<PathBuf>,
    },
    /// A system framework or library (`Foo.framework` or `libfoo.tbd`).
    Sdk {
        /// File name of the SDK artifact.
        name: String,
        /// Required or weakly linked.
        status: SdkStatus,
    },
    /// A product exported by an external package.
    Package {
        /// Product name.
        product: String,
        /// Package declaring the product.
        package: Package,
    },
}
