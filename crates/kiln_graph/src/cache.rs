//! Memoized storage for loaded projects and nodes.
//!
//! The loader checks here before constructing any node, which keeps at most
//! one node per identity in the arena.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_model::{Project, SdkStatus};

use crate::arena::Arena;
use crate::ids::NodeId;
use crate::node::{
    FrameworkNode, LibraryNode, Node, PackageNode, SdkNode, TargetNode, XcFrameworkNode,
};

/// Projects and nodes seen during one load.
///
/// Lookups of absent keys return `None`. Adding a node under a key that is
/// already present replaces the stored node in place, so its [`NodeId`] and
/// every edge pointing at it stay valid.
#[derive(Debug, Default)]
pub struct GraphLoaderCache {
    nodes: Arena<NodeId, Node>,
    projects: BTreeMap<PathBuf, Arc<Project>>,
    target_nodes: HashMap<PathBuf, HashMap<String, NodeId>>,
    precompiled_nodes: HashMap<PathBuf, NodeId>,
    sdk_nodes: HashMap<(PathBuf, SdkStatus), NodeId>,
    package_nodes: HashMap<(PathBuf, String), NodeId>,
}

impl GraphLoaderCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the project loaded from `path`.
    pub fn project(&self, path: &Path) -> Option<&Arc<Project>> {
        self.projects.get(path)
    }

    /// Stores a project and returns the shared handle target nodes will hold.
    pub fn add_project(&mut self, project: Project) -> Arc<Project> {
        let project = Arc::new(project);
        self.projects.insert(project.path.clone(), Arc::clone(&project));
        project
    }

    /// Returns every cached project, keyed by path.
    pub fn projects(&self) -> &BTreeMap<PathBuf, Arc<Project>> {
        &self.projects
    }

    /// Returns the target node `name` of the project at `path`.
    pub fn target_node(&self, path: &Path, name: &str) -> Option<NodeId> {
        self.target_nodes.get(path)?.get(name).copied()
    }

    /// Stores a target node.
    pub fn add_target_node(&mut self, node: TargetNode) -> NodeId {
        let path = node.path().to_path_buf();
        let name = node.name().to_string();
        let existing = self.target_node(&path, &name);
        let id = self.upsert(existing, Node::Target(node));
        self.target_nodes.entry(path).or_default().insert(name, id);
        id
    }

    /// Returns the framework or library node for the artifact at `path`.
    pub fn precompiled_node(&self, path: &Path) -> Option<NodeId> {
        self.precompiled_nodes.get(path).copied()
    }

    /// Stores a precompiled framework node.
    pub fn add_framework_node(&mut self, node: FrameworkNode) -> NodeId {
        self.add_precompiled(Node::Framework(node))
    }

    /// Stores a precompiled xcframework node.
    pub fn add_xcframework_node(&mut self, node: XcFrameworkNode) -> NodeId {
        self.add_precompiled(Node::XcFramework(node))
    }

    /// Stores a precompiled library node.
    pub fn add_library_node(&mut self, node: LibraryNode) -> NodeId {
        self.add_precompiled(Node::Library(node))
    }

    /// Returns the SDK node at `path` with the given status.
    pub fn sdk_node(&self, path: &Path, status: SdkStatus) -> Option<NodeId> {
        self.sdk_nodes.get(&(path.to_path_buf(), status)).copied()
    }

    /// Stores an SDK node.
    pub fn add_sdk_node(&mut self, node: SdkNode) -> NodeId {
        let key = (node.path.clone(), node.status);
        let existing = self.sdk_nodes.get(&key).copied();
        let id = self.upsert(existing, Node::Sdk(node));
        self.sdk_nodes.insert(key, id);
        id
    }

    /// Returns the package product node declared by the project at `path`.
    pub fn package_node(&self, path: &Path, product: &str) -> Option<NodeId> {
        self.package_nodes
            .get(&(path.to_path_buf(), product.to_string()))
            .copied()
    }

    /// Stores a package product node.
    pub fn add_package_node(&mut self, node: PackageNode) -> NodeId {
        let key = (node.path.clone(), node.product.clone());
        let existing = self.package_nodes.get(&key).copied();
        let id = self.upsert(existing, Node::Package(node));
        self.package_nodes.insert(key, id);
        id
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Returns the node arena.
    pub fn nodes(&self) -> &Arena<NodeId, Node> {
        &self.nodes
    }

    /// Returns the IDs of all target nodes, grouped by project path.
    pub fn target_nodes(&self) -> &HashMap<PathBuf, HashMap<String, NodeId>> {
        &self.target_nodes
    }

    /// Consumes the cache, returning its arena, projects, and target index.
    pub(crate) fn into_parts(
        self,
    ) -> (
        Arena<NodeId, Node>,
        BTreeMap<PathBuf, Arc<Project>>,
        HashMap<PathBuf, HashMap<String, NodeId>>,
    ) {
        (self.nodes, self.projects, self.target_nodes)
    }

    fn add_precompiled(&mut self, node: Node) -> NodeId {
        let path = node.path().to_path_buf();
        let existing = self.precompiled_node(&path);
        let id = self.upsert(existing, node);
        self.precompiled_nodes.insert(path, id);
        id
    }

    fn upsert(&mut self, existing: Option<NodeId>, node: Node) -> NodeId {
        match existing {
            Some(id) => {
                self.nodes.replace(id, node);
                id
            }
            None => self.nodes.alloc(node),
        }
    }
}
