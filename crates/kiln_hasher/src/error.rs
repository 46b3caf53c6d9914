//! Error types for content hashing.

use std::path::PathBuf;

/// Errors that abort a hashing run.
///
/// Any input that cannot be read makes the hash of its target meaningless,
/// so unlike binary inspection these are never downgraded to warnings.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// A source, resource, or artifact could not be read.
    #[error("couldn't read {path} while hashing: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The graph was not in the shape the hasher expects.
    #[error("internal hashing error: {reason}")]
    Internal {
        /// Description of the inconsistency.
        reason: String,
    },
}
