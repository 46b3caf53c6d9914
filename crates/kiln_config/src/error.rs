//! Errors raised while reading `kiln.toml`.

use std::path::PathBuf;

/// Why a configuration could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read, or does not exist.
    #[error("couldn't read {}: {source}", path.display())]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The content is not valid TOML for the expected schema.
    #[error("invalid kiln.toml: {reason}")]
    Parse {
        /// The parser's message, including the location.
        reason: String,
    },

    /// A value parsed but is unusable.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending key, e.g. `hashing.configuration`.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}
