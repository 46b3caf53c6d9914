//! Deterministic content hashes for the targets of a Kiln graph.
//!
//! A target's hash covers its own inputs (sources, resources, settings,
//! toolchain versions and more) together with the hashes of every target it
//! transitively depends on. Equal inputs produce equal hashes on any machine,
//! which makes the hex rendering usable as a key into an artifact cache.

#![warn(missing_docs)]

pub mod error;
pub mod file_hasher;
pub mod graph;
pub mod target;

pub use error::HashError;
pub use file_hasher::FileHasher;
pub use graph::{GraphContentHasher, HashOptions};
pub use target::TargetContentHasher;
