//! Integration tests for graph content hashing over on-disk fixtures.
//!
//! Two projects (`f1`, `f2`) live side by side in a temporary directory and
//! share a pool of source, resource, and model files one level up, so the
//! same file has the same project-relative identity from either project.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_graph::{Graph, GraphLoader, InMemoryModelLoader, NodeKey};
use kiln_hasher::{GraphContentHasher, HashOptions};
use kiln_model::{
    CoreDataModel, Platform, Product, Project, ResourceFileElement, SourceFile, Target, Workspace,
};
use proptest::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for name in ["1", "2", "3", "4"] {
            std::fs::write(dir.path().join(format!("{name}.swift")), name).unwrap();
        }
        for name in ["r1", "r2"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        for name in ["rf1", "rf2"] {
            let folder = dir.path().join(name);
            std::fs::create_dir(&folder).unwrap();
            std::fs::write(folder.join("content.json"), name).unwrap();
        }
        for name in ["CoreDataModel1", "CoreDataModel2"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn source(&self, name: &str) -> SourceFile {
        SourceFile::new(self.path(&format!("{name}.swift")))
    }

    fn core_data(&self, index: u8) -> CoreDataModel {
        CoreDataModel {
            path: self.path(&format!("CoreDataModel{index}")),
            versions: Vec::new(),
            current_version: index.to_string(),
        }
    }

    /// Loads `f1` and `f2`, each holding a single target, as one workspace.
    fn load_pair(&self, first: Target, second: Target) -> Graph {
        let f1 = self.path("f1");
        let f2 = self.path("f2");
        let workspace = Workspace::new(self.path("ws"), "W", vec![f1.clone(), f2.clone()]);
        let models = InMemoryModelLoader::new()
            .with_workspace(workspace)
            .with_project(Project::new(&f1, "P").with_target(first))
            .with_project(Project::new(&f2, "P").with_target(second));
        GraphLoader::new(models)
            .load_workspace(&self.path("ws"))
            .unwrap()
    }

    /// Hashes both targets of [`Fixture::load_pair`] and returns them in order.
    fn hash_pair(&self, first: Target, second: Target) -> (String, String) {
        let graph = self.load_pair(first, second);
        let hashes = hash(&graph, &HashOptions::default());
        let key = |project: &str| NodeKey::new(self.path(project), "Framework");
        (hashes[&key("f1")].clone(), hashes[&key("f2")].clone())
    }
}

fn framework() -> Target {
    Target::new("Framework", Platform::Ios, Product::Framework, "io.kiln.framework")
}

fn hash(graph: &Graph, options: &HashOptions) -> BTreeMap<NodeKey, String> {
    GraphContentHasher::new()
        .content_hashes(graph, options)
        .unwrap()
}

fn load(project: Project) -> Graph {
    let path = project.path.clone();
    GraphLoader::new(InMemoryModelLoader::new().with_project(project))
        .load_project(&path)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[test]
fn same_sources_in_any_order_hash_equal() {
    let fx = Fixture::new();
    let (a, b) = fx.hash_pair(
        framework().with_sources(vec![fx.source("1"), fx.source("2")]),
        framework().with_sources(vec![fx.source("2"), fx.source("1")]),
    );
    assert_eq!(a, b);
}

#[test]
fn different_sources_hash_differently() {
    let fx = Fixture::new();
    let (a, b) = fx.hash_pair(
        framework().with_sources(vec![fx.source("1"), fx.source("2")]),
        framework().with_sources(vec![fx.source("3"), fx.source("4")]),
    );
    assert_ne!(a, b);
}

#[test]
fn hashes_are_stable_across_runs() {
    let fx = Fixture::new();
    let graph = fx.load_pair(
        framework().with_sources(vec![fx.source("1")]),
        framework().with_sources(vec![fx.source("3")]),
    );
    let first = hash(&graph, &HashOptions::default());
    let second = hash(&graph, &HashOptions::default());
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Resources and Core Data
// ---------------------------------------------------------------------------

#[test]
fn resources_affect_hash() {
    let fx = Fixture::new();
    let (same_a, same_b) = fx.hash_pair(
        framework().with_resources(vec![ResourceFileElement::file(fx.path("r1"))]),
        framework().with_resources(vec![ResourceFileElement::file(fx.path("r1"))]),
    );
    assert_eq!(same_a, same_b);

    let (a, b) = fx.hash_pair(
        framework().with_resources(vec![ResourceFileElement::file(fx.path("r1"))]),
        framework().with_resources(vec![ResourceFileElement::file(fx.path("r2"))]),
    );
    assert_ne!(a, b);
}

#[test]
fn folder_references_affect_hash() {
    let fx = Fixture::new();
    let (a, b) = fx.hash_pair(
        framework().with_resources(vec![ResourceFileElement::folder_reference(fx.path("rf1"))]),
        framework().with_resources(vec![ResourceFileElement::folder_reference(fx.path("rf2"))]),
    );
    assert_ne!(a, b);
}

#[test]
fn core_data_models_affect_hash() {
    let fx = Fixture::new();
    let (same_a, same_b) = fx.hash_pair(
        framework().with_core_data_models(vec![fx.core_data(1)]),
        framework().with_core_data_models(vec![fx.core_data(1)]),
    );
    assert_eq!(same_a, same_b);

    let (a, b) = fx.hash_pair(
        framework().with_core_data_models(vec![fx.core_data(1)]),
        framework().with_core_data_models(vec![fx.core_data(2)]),
    );
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// Descriptor fields
// ---------------------------------------------------------------------------

#[test]
fn platform_affects_hash() {
    let fx = Fixture::new();
    let mut mac = framework();
    mac.platform = Platform::MacOs;
    let (a, b) = fx.hash_pair(framework(), mac);
    assert_ne!(a, b);
}

#[test]
fn product_name_affects_hash() {
    let fx = Fixture::new();
    let (a, b) = fx.hash_pair(framework(), framework().with_product_name("Renamed"));
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// Cross-project scenario
// ---------------------------------------------------------------------------

#[test]
fn equal_inputs_in_different_projects_hash_equal_until_content_changes() {
    let fx = Fixture::new();
    let f1 = fx.path("f1");
    let f2 = fx.path("f2");
    std::fs::create_dir_all(&f1).unwrap();
    std::fs::create_dir_all(&f2).unwrap();
    std::fs::write(f1.join("a.swift"), "1").unwrap();
    std::fs::write(f2.join("a.swift"), "1").unwrap();

    let first = framework().with_sources(vec![SourceFile::new(f1.join("a.swift"))]);
    let second = framework().with_sources(vec![SourceFile::new(f2.join("a.swift"))]);

    let (a, b) = fx.hash_pair(first.clone(), second.clone());
    assert_eq!(a, b);

    std::fs::write(f2.join("a.swift"), "2").unwrap();
    let (a, b) = fx.hash_pair(first, second);
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// Exclusion
// ---------------------------------------------------------------------------

#[test]
fn excluded_targets_and_their_bundles_are_dropped() {
    let project = Project::new("/p", "Shop")
        .with_target(
            Target::new("App", Platform::Ios, Product::App, "io.shop.app")
                .with_dependency(kiln_model::Dependency::Target {
                    name: "Core".to_string(),
                }),
        )
        .with_target(Target::new("Core", Platform::Ios, Product::Framework, "io.shop.core"))
        .with_target(Target::new("Legacy", Platform::Ios, Product::Framework, "io.shop.legacy"))
        .with_target(Target::new("Shop_Legacy", Platform::Ios, Product::Bundle, "io.shop.res"));
    let graph = load(project);

    let all = hash(&graph, &HashOptions::default());
    let options = HashOptions {
        excluded_targets: ["Legacy".to_string()].into_iter().collect(),
        ..HashOptions::default()
    };
    let filtered = hash(&graph, &options);

    let key = |name: &str| NodeKey::new("/p", name);
    assert_eq!(all.len(), 4);
    assert_eq!(filtered.len(), 2);
    assert!(!filtered.contains_key(&key("Legacy")));
    assert!(!filtered.contains_key(&key("Shop_Legacy")));
    assert_eq!(all[&key("App")], filtered[&key("App")]);
    assert_eq!(all[&key("Core")], filtered[&key("Core")]);
}

#[test]
fn excluded_dependency_drops_out_of_dependents_closure() {
    let project = Project::new("/p", "P")
        .with_target(
            Target::new("App", Platform::Ios, Product::App, "io.app").with_dependency(
                kiln_model::Dependency::Target {
                    name: "Legacy".to_string(),
                },
            ),
        )
        .with_target(Target::new("Legacy", Platform::Ios, Product::Framework, "io.legacy"));
    let graph = load(project);

    let options = HashOptions {
        excluded_targets: ["Legacy".to_string()].into_iter().collect(),
        ..HashOptions::default()
    };
    let hashes = hash(&graph, &options);
    assert_eq!(hashes.len(), 1);
    assert!(hashes.contains_key(&NodeKey::new("/p", "App")));
}

#[test]
fn missing_source_fails_the_run() {
    let project = Project::new("/p", "P").with_target(
        framework().with_sources(vec![SourceFile::new(Path::new("/nonexistent/kiln/a.swift"))]),
    );
    let graph = load(project);
    let result = GraphContentHasher::new().content_hashes(&graph, &HashOptions::default());
    assert!(matches!(result, Err(kiln_hasher::HashError::Io { .. })));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn source_order_never_matters(order in Just(vec!["1", "2", "3", "4"]).prop_shuffle()) {
        let fx = Fixture::new();
        let sorted: Vec<SourceFile> = ["1", "2", "3", "4"].iter().map(|n| fx.source(n)).collect();
        let shuffled: Vec<SourceFile> = order.iter().map(|n| fx.source(n)).collect();
        let (a, b) = fx.hash_pair(
            framework().with_sources(sorted),
            framework().with_sources(shuffled),
        );
        prop_assert_eq!(a, b);
    }
}
