//! Configuration types deserialized from `kiln.toml`.

use serde::Deserialize;

/// The top-level engine configuration parsed from `kiln.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KilnConfig {
    /// Graph loading options.
    #[serde(default)]
    pub graph: GraphConfig,
    /// Scope of content hashing.
    #[serde(default)]
    pub hashing: HashingConfig,
    /// Toolchain versions folded into every content hash.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Options applied while building the dependency graph.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Path fragments marking a precompiled framework as produced by a
    /// third-party dependency manager.
    #[serde(default = "default_third_party_markers")]
    pub third_party_markers: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            third_party_markers: default_third_party_markers(),
        }
    }
}

fn default_third_party_markers() -> Vec<String> {
    vec!["Carthage/Build".to_string()]
}

/// Which targets are hashed and which extra inputs are mixed in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HashingConfig {
    /// Target names excluded from hashing, along with their resource bundles.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
    /// Caller-supplied strings appended to every target's facts.
    #[serde(default)]
    pub additional_strings: Vec<String>,
    /// Build configuration whose settings overrides are hashed (e.g. `Debug`).
    #[serde(default)]
    pub configuration: Option<String>,
    /// Destination the artifacts are built for (e.g. `simulator`).
    #[serde(default)]
    pub destination: Option<String>,
}

/// Toolchain versions active when hashing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolchainConfig {
    /// Compiler language version (e.g. `5.9`).
    #[serde(default)]
    pub language_version: Option<String>,
    /// IDE / SDK bundle version (e.g. `15.3.0`).
    #[serde(default)]
    pub ide_version: Option<String>,
}
