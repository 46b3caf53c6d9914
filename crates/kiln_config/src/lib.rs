//! Parsing and validation of `kiln.toml` engine configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`KilnConfig`] with graph loading options, hashing scope, and the
//! toolchain versions folded into content hashes.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
