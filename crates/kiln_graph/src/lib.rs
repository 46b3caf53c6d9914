//! Dependency graph construction and traversal for the Kiln engine.
//!
//! The [`GraphLoader`] resolves the declared dependencies of every target
//! into an arena of [`Node`]s, deduplicated by identity and checked for
//! cycles while loading. The resulting [`Graph`] is immutable and answers
//! the link, embed, and search-path queries that drive generation.

#![warn(missing_docs)]

pub mod arena;
pub mod binary;
pub mod cache;
pub mod circular;
pub mod error;
pub mod export;
pub mod graph;
pub mod ids;
pub mod loader;
pub mod node;
pub mod reference;

pub use arena::{Arena, ArenaId};
pub use binary::{Architecture, BinaryError, BinaryInspector, BinaryMetadata, Linking, MachOInspector};
pub use cache::GraphLoaderCache;
pub use circular::CircularDetector;
pub use error::GraphLoadingError;
pub use graph::Graph;
pub use ids::NodeId;
pub use loader::{GraphLoader, InMemoryModelLoader, ModelLoader};
pub use node::{
    FrameworkNode, LibraryNode, Node, NodeKey, NodeKind, NodeVariant, PackageNode, Precompiled,
    SdkKind, SdkNode, TargetNode, XcFrameworkNode,
};
pub use reference::DependencyReference;
