//! Shared foundational types used across the Kiln graph engine.
//!
//! This crate provides content hashing primitives and path helpers that the
//! graph loader and the content hasher both depend on.

#![warn(missing_docs)]

pub mod hash;
pub mod path;

pub use hash::{ContentHash, HashBuilder};
pub use path::relative_path;
