//! Inbound project model consumed by the Kiln graph engine.
//!
//! Manifest loaders produce these values; the graph loader turns them into
//! nodes. Every type here is plain data: no I/O happens on construction.

#![warn(missing_docs)]

pub mod dependency;
pub mod files;
pub mod product;
pub mod project;
pub mod settings;
pub mod target;

pub use dependency::{Dependency, Package, SdkStatus, VersionRequirement};
pub use files::{CoreDataModel, Headers, ResourceFileElement, ScriptOrder, SourceFile, TargetScript};
pub use product::{Platform, Product};
pub use project::{Project, Workspace};
pub use settings::{SettingValue, Settings};
pub use target::Target;
