//! Error types for graph loading.

use std::path::PathBuf;

use crate::node::NodeKey;

/// Errors that abort a graph load.
///
/// Loading is all-or-nothing: any of these means no [`Graph`](crate::Graph)
/// was produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphLoadingError {
    /// A referenced binary, header directory, or module map does not exist.
    #[error("couldn't find file at path {}", path.display())]
    MissingFile {
        /// The missing path.
        path: PathBuf,
    },

    /// A dependency names a target its project does not declare.
    #[error("couldn't find target '{name}' in project at {}", path.display())]
    TargetNotFound {
        /// The requested target name.
        name: String,
        /// The project directory that was searched.
        path: PathBuf,
    },

    /// No project or workspace manifest exists at a path.
    #[error("couldn't find manifest at path {}", path.display())]
    ManifestNotFound {
        /// The directory without a manifest.
        path: PathBuf,
    },

    /// Resolving a dependency led back to a target still being resolved.
    #[error("found circular dependency between targets: {}", format_cycle(cycle))]
    CircularDependency {
        /// The cycle, starting and ending with the same target.
        cycle: Vec<NodeKey>,
    },

    /// An SDK dependency has an extension other than `.framework` or `.tbd`.
    #[error("SDK '{name}' is not supported, expected a .framework or .tbd file")]
    UnsupportedSdk {
        /// The declared SDK name.
        name: String,
    },

    /// Any other failure reported by a model loader.
    #[error("unexpected error: {reason}")]
    Unexpected {
        /// Description of the failure.
        reason: String,
    },
}

fn format_cycle(cycle: &[NodeKey]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_dependency_display() {
        let err = GraphLoadingError::CircularDependency {
            cycle: vec![
                NodeKey::new("/p", "A"),
                NodeKey::new("/p", "B"),
                NodeKey::new("/p", "A"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "found circular dependency between targets: /p:A -> /p:B -> /p:A"
        );
    }

    #[test]
    fn missing_file_display() {
        let err = GraphLoadingError::MissingFile {
            path: PathBuf::from("/libs/libA.a"),
        };
        assert!(err.to_string().contains("/libs/libA.a"));
    }

    #[test]
    fn target_not_found_display() {
        let err = GraphLoadingError::TargetNotFound {
            name: "Core".to_string(),
            path: PathBuf::from("/p"),
        };
        assert_eq!(err.to_string(), "couldn't find target 'Core' in project at /p");
    }
}
