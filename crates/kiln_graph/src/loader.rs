//! Graph construction from project models.
//!
//! A [`GraphLoader`] asks its [`ModelLoader`] for projects and resolves each
//! target's declared dependencies into nodes, bottom-up. Every load call owns
//! a fresh [`GraphLoaderCache`] and [`CircularDetector`]; nothing survives
//! between calls.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::GraphConfig;
use kiln_model::{Dependency, Package, Project, SdkStatus, Workspace};

use crate::binary::{BinaryInspector, MachOInspector};
use crate::cache::GraphLoaderCache;
use crate::circular::CircularDetector;
use crate::error::GraphLoadingError;
use crate::graph::Graph;
use crate::ids::NodeId;
use crate::node::{
    FrameworkNode, LibraryNode, NodeKey, PackageNode, SdkNode, TargetNode, XcFrameworkNode,
};

/// Source of project and workspace models.
///
/// Implemented by manifest loaders outside this crate.
pub trait ModelLoader {
    /// Loads the project whose directory is `path`.
    fn load_project(&self, path: &Path) -> Result<Project, GraphLoadingError>;

    /// Loads the workspace whose directory is `path`.
    fn load_workspace(&self, path: &Path) -> Result<Workspace, GraphLoadingError>;
}

/// A [`ModelLoader`] over models that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModelLoader {
    projects: HashMap<PathBuf, Project>,
    workspaces: HashMap<PathBuf, Workspace>,
}

impl InMemoryModelLoader {
    /// Creates a loader with no models.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a project under its own path.
    pub fn with_project(mut self, project: Project) -> Self {
        self.projects.insert(project.path.clone(), project);
        self
    }

    /// Registers a workspace under its own path.
    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspaces.insert(workspace.path.clone(), workspace);
        self
    }
}

impl ModelLoader for InMemoryModelLoader {
    fn load_project(&self, path: &Path) -> Result<Project, GraphLoadingError> {
        self.projects
            .get(path)
            .cloned()
            .ok_or_else(|| GraphLoadingError::ManifestNotFound {
                path: path.to_path_buf(),
            })
    }

    fn load_workspace(&self, path: &Path) -> Result<Workspace, GraphLoadingError> {
        self.workspaces
            .get(path)
            .cloned()
            .ok_or_else(|| GraphLoadingError::ManifestNotFound {
                path: path.to_path_buf(),
            })
    }
}

/// Builds immutable [`Graph`]s from a project or workspace entry point.
pub struct GraphLoader<L> {
    model_loader: L,
    config: GraphConfig,
    inspector: Arc<dyn BinaryInspector>,
}

impl<L: ModelLoader> GraphLoader<L> {
    /// Creates a loader with the default graph options and Mach-O inspection.
    pub fn new(model_loader: L) -> Self {
        Self {
            model_loader,
            config: GraphConfig::default(),
            inspector: Arc::new(MachOInspector),
        }
    }

    /// Replaces the graph options.
    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the inspector handed to precompiled nodes.
    pub fn with_inspector(mut self, inspector: Arc<dyn BinaryInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Loads the project at `path` and everything it depends on.
    ///
    /// Entry nodes are the project's targets, in declaration order.
    pub fn load_project(&self, path: &Path) -> Result<Graph, GraphLoadingError> {
        tracing::debug!("loading graph for project at {}", path.display());
        let mut session = LoadSession::new(self);
        let project = session.load_project(path)?;
        let mut entry_nodes = Vec::with_capacity(project.targets.len());
        for target in &project.targets {
            entry_nodes.push(session.load_target(path, &target.name)?);
        }
        session.load_remaining_targets()?;
        Ok(session.finish(project.name.clone(), path, entry_nodes))
    }

    /// Loads every project of the workspace at `path`.
    ///
    /// Entry nodes are the targets of all member projects, in order.
    pub fn load_workspace(&self, path: &Path) -> Result<Graph, GraphLoadingError> {
        tracing::debug!("loading graph for workspace at {}", path.display());
        let workspace = self.model_loader.load_workspace(path)?;
        let mut session = LoadSession::new(self);
        let mut entry_nodes = Vec::new();
        for project_path in &workspace.projects {
            let project = session.load_project(project_path)?;
            for target in &project.targets {
                entry_nodes.push(session.load_target(project_path, &target.name)?);
            }
        }
        session.load_remaining_targets()?;
        Ok(session.finish(workspace.name.clone(), path, entry_nodes))
    }
}

/// Mutable state owned by one load call.
struct LoadSession<'a, L> {
    loader: &'a GraphLoader<L>,
    cache: GraphLoaderCache,
    circular: CircularDetector,
}

impl<'a, L: ModelLoader> LoadSession<'a, L> {
    fn new(loader: &'a GraphLoader<L>) -> Self {
        Self {
            loader,
            cache: GraphLoaderCache::new(),
            circular: CircularDetector::new(),
        }
    }

    fn finish(self, name: String, entry_path: &Path, entry_nodes: Vec<NodeId>) -> Graph {
        tracing::debug!(
            "loaded graph '{}' with {} nodes across {} projects",
            name,
            self.cache.nodes().len(),
            self.cache.projects().len()
        );
        Graph::new(name, entry_path.to_path_buf(), entry_nodes, self.cache)
    }

    fn load_project(&mut self, path: &Path) -> Result<Arc<Project>, GraphLoadingError> {
        if let Some(project) = self.cache.project(path) {
            return Ok(Arc::clone(project));
        }
        let project = self.loader.model_loader.load_project(path)?;
        if project.path != path {
            return Err(GraphLoadingError::Unexpected {
                reason: format!(
                    "model loader returned project at {} when asked for {}",
                    project.path.display(),
                    path.display()
                ),
            });
        }
        tracing::debug!("loaded project '{}' at {}", project.name, path.display());
        Ok(self.cache.add_project(project))
    }

    /// Loads every target of every cached project that no edge reached.
    fn load_remaining_targets(&mut self) -> Result<(), GraphLoadingError> {
        loop {
            let pending: Vec<(PathBuf, String)> = self
                .cache
                .projects()
                .values()
                .flat_map(|project| {
                    project
                        .targets
                        .iter()
                        .filter(|t| self.cache.target_node(&project.path, &t.name).is_none())
                        .map(|t| (project.path.clone(), t.name.clone()))
                })
                .collect();
            if pending.is_empty() {
                return Ok(());
            }
            for (path, name) in pending {
                self.load_target(&path, &name)?;
            }
        }
    }

    fn load_target(&mut self, path: &Path, name: &str) -> Result<NodeId, GraphLoadingError> {
        if let Some(id) = self.cache.target_node(path, name) {
            tracing::trace!("target {} at {} already loaded", name, path.display());
            return Ok(id);
        }
        let project = self.load_project(path)?;
        let target = project
            .target(name)
            .cloned()
            .ok_or_else(|| GraphLoadingError::TargetNotFound {
                name: name.to_string(),
                path: path.to_path_buf(),
            })?;
        tracing::trace!("loading target {} at {}", name, path.display());

        let key = NodeKey::new(path, name);
        let mut dependencies = Vec::with_capacity(target.dependencies.len());
        for dependency in &target.dependencies {
            dependencies.push(self.load_dependency(&key, path, dependency)?);
        }
        self.circular.complete(&key);

        Ok(self.cache.add_target_node(TargetNode {
            project,
            target,
            dependencies,
        }))
    }

    fn load_dependency(
        &mut self,
        from: &NodeKey,
        path: &Path,
        dependency: &Dependency,
    ) -> Result<NodeId, GraphLoadingError> {
        match dependency {
            Dependency::Target { name } => self.load_target_dependency(from, path, name),
            Dependency::Project {
                target,
                path: project_path,
            } => {
                let project_path = resolve(path, project_path);
                self.load_target_dependency(from, &project_path, target)
            }
            Dependency::Framework {
                path: framework_path,
            } => self.load_framework(resolve(path, framework_path)),
            Dependency::XcFramework {
                path: xcframework_path,
            } => self.load_xcframework(resolve(path, xcframework_path)),
            Dependency::Library {
                path: library_path,
                public_headers,
                swift_module_map,
            } => self.load_library(
                resolve(path, library_path),
                resolve(path, public_headers),
                swift_module_map.as_ref().map(|m| resolve(path, m)),
            ),
            Dependency::Sdk { name, status } => self.load_sdk(name, *status),
            Dependency::Package { product, package } => self.load_package(path, product, package),
        }
    }

    fn load_target_dependency(
        &mut self,
        from: &NodeKey,
        path: &Path,
        name: &str,
    ) -> Result<NodeId, GraphLoadingError> {
        let to = NodeKey::new(path, name);
        self.circular.start(from, &to)?;
        let id = self.load_target(path, name)?;
        self.circular.complete(&to);
        Ok(id)
    }

    fn load_framework(&mut self, path: PathBuf) -> Result<NodeId, GraphLoadingError> {
        if let Some(id) = self.cache.precompiled_node(&path) {
            return Ok(id);
        }
        ensure_exists(&path)?;
        tracing::trace!("loading framework at {}", path.display());
        let node = FrameworkNode::new(
            path,
            &self.loader.config.third_party_markers,
            Arc::clone(&self.loader.inspector),
        );
        Ok(self.cache.add_framework_node(node))
    }

    fn load_xcframework(&mut self, path: PathBuf) -> Result<NodeId, GraphLoadingError> {
        if let Some(id) = self.cache.precompiled_node(&path) {
            return Ok(id);
        }
        ensure_exists(&path)?;
        let primary_binary = primary_binary(&path);
        tracing::trace!(
            "loading xcframework at {} (primary binary {})",
            path.display(),
            primary_binary.display()
        );
        let node = XcFrameworkNode::new(path, primary_binary, Arc::clone(&self.loader.inspector));
        Ok(self.cache.add_xcframework_node(node))
    }

    fn load_library(
        &mut self,
        path: PathBuf,
        public_headers: PathBuf,
        swift_module_map: Option<PathBuf>,
    ) -> Result<NodeId, GraphLoadingError> {
        if let Some(id) = self.cache.precompiled_node(&path) {
            return Ok(id);
        }
        ensure_exists(&path)?;
        ensure_exists(&public_headers)?;
        if let Some(module_map) = &swift_module_map {
            ensure_exists(module_map)?;
        }
        tracing::trace!("loading library at {}", path.display());
        let node = LibraryNode::new(
            path,
            public_headers,
            swift_module_map,
            Arc::clone(&self.loader.inspector),
        );
        Ok(self.cache.add_library_node(node))
    }

    fn load_sdk(&mut self, name: &str, status: SdkStatus) -> Result<NodeId, GraphLoadingError> {
        let node = SdkNode::new(name, status)?;
        if let Some(id) = self.cache.sdk_node(&node.path, status) {
            return Ok(id);
        }
        Ok(self.cache.add_sdk_node(node))
    }

    fn load_package(
        &mut self,
        path: &Path,
        product: &str,
        package: &Package,
    ) -> Result<NodeId, GraphLoadingError> {
        if let Some(id) = self.cache.package_node(path, product) {
            return Ok(id);
        }
        Ok(self.cache.add_package_node(PackageNode {
            path: path.to_path_buf(),
            product: product.to_string(),
            package: package.clone(),
        }))
    }
}

/// Resolves a declared path against the declaring project's directory.
fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Picks the slice binary that stands for a whole xcframework.
///
/// Slice directories are visited in name order. A slice holding
/// `<Name>.framework/<Name>` wins; otherwise the first `.a` or `.dylib` file
/// of a slice. With neither, `<path>/<Name>` is returned, which fails
/// inspection and so never counts as dynamic.
fn primary_binary(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    for slice in sorted_entries(path).into_iter().filter(|p| p.is_dir()) {
        let framework_binary = slice.join(format!("{stem}.framework")).join(&stem);
        if framework_binary.is_file() {
            return framework_binary;
        }
        let library = sorted_entries(&slice).into_iter().find(|candidate| {
            candidate.is_file()
                && matches!(
                    candidate.extension().and_then(|e| e.to_str()),
                    Some("a" | "dylib")
                )
        });
        if let Some(library) = library {
            return library;
        }
    }
    path.join(stem)
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    entries
}

fn ensure_exists(path: &Path) -> Result<(), GraphLoadingError> {
    if path.exists() {
        Ok(())
    } else {
        Err(GraphLoadingError::MissingFile {
            path: path.to_path_buf(),
        })
    }
}
