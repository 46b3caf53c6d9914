//! The loaded dependency graph and its traversal queries.
//!
//! A [`Graph`] is immutable once the loader returns it. Every query takes
//! `&self` and keeps its visited set on the stack, so one graph can be
//! queried from many threads at once.
//!
//! Queries are keyed by the `(path, name)` of a target. Asking about a target
//! the graph does not contain yields an empty result, never an error.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_model::{Product, Project};

use crate::arena::Arena;
use crate::binary::Linking;
use crate::cache::GraphLoaderCache;
use crate::ids::NodeId;
use crate::node::{
    FrameworkNode, LibraryNode, Node, NodeVariant, PackageNode, Precompiled, SdkNode, TargetNode,
    XcFrameworkNode,
};
use crate::reference::DependencyReference;

/// An immutable dependency graph over one arena of nodes.
#[derive(Debug)]
pub struct Graph {
    name: String,
    entry_path: PathBuf,
    entry_nodes: Vec<NodeId>,
    nodes: Arena<NodeId, Node>,
    projects: BTreeMap<PathBuf, Arc<Project>>,
    target_index: HashMap<PathBuf, HashMap<String, NodeId>>,
}

impl Graph {
    /// Freezes a loader cache into a graph.
    pub(crate) fn new(
        name: String,
        entry_path: PathBuf,
        entry_nodes: Vec<NodeId>,
        cache: GraphLoaderCache,
    ) -> Self {
        let (nodes, projects, target_index) = cache.into_parts();
        Self {
            name,
            entry_path,
            entry_nodes,
            nodes,
            projects,
            target_index,
        }
    }

    /// Returns the name of the entry project or workspace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directory the graph was loaded from.
    pub fn entry_path(&self) -> &Path {
        &self.entry_path
    }

    /// Returns the IDs of the root nodes.
    pub fn entry_node_ids(&self) -> &[NodeId] {
        &self.entry_nodes
    }

    /// Iterates over the root nodes.
    pub fn entry_nodes(&self) -> impl Iterator<Item = &Node> {
        self.entry_nodes.iter().map(|id| &self.nodes[*id])
    }

    /// Returns the node with the given ID, or `None` if `id` was not issued
    /// for this graph.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Indexes a node by an ID this graph issued itself.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Iterates over every node in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterates over `(ID, node)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Iterates over all loaded projects, sorted by path.
    pub fn projects(&self) -> impl Iterator<Item = &Arc<Project>> {
        self.projects.values()
    }

    /// Returns the project at `path`.
    pub fn project(&self, path: &Path) -> Option<&Arc<Project>> {
        self.projects.get(path)
    }

    /// Iterates over every target node.
    pub fn targets(&self) -> impl Iterator<Item = &TargetNode> {
        self.variants::<TargetNode>()
    }

    /// Returns the target nodes of the project at `path`, sorted by name.
    pub fn targets_at(&self, path: &Path) -> Vec<&TargetNode> {
        let mut targets: Vec<&TargetNode> = self
            .target_index
            .get(path)
            .into_iter()
            .flat_map(|by_name| by_name.values())
            .filter_map(|id| TargetNode::from_node(&self.nodes[*id]))
            .collect();
        targets.sort_by(|a, b| a.name().cmp(b.name()));
        targets
    }

    /// Iterates over precompiled framework nodes.
    pub fn frameworks(&self) -> impl Iterator<Item = &FrameworkNode> {
        self.variants::<FrameworkNode>()
    }

    /// Iterates over precompiled xcframework nodes.
    pub fn xcframeworks(&self) -> impl Iterator<Item = &XcFrameworkNode> {
        self.variants::<XcFrameworkNode>()
    }

    /// Iterates over precompiled library nodes.
    pub fn libraries(&self) -> impl Iterator<Item = &LibraryNode> {
        self.variants::<LibraryNode>()
    }

    /// Iterates over all precompiled nodes, frameworks and libraries alike.
    pub fn precompiled(&self) -> impl Iterator<Item = &Precompiled> {
        self.variants::<Precompiled>()
    }

    /// Iterates over SDK nodes.
    pub fn sdks(&self) -> impl Iterator<Item = &SdkNode> {
        self.variants::<SdkNode>()
    }

    /// Iterates over package product nodes.
    pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
        self.variants::<PackageNode>()
    }

    /// Returns the ID of target `name` in the project at `path`.
    pub fn target_id(&self, path: &Path, name: &str) -> Option<NodeId> {
        self.target_index.get(path)?.get(name).copied()
    }

    /// Returns target `name` in the project at `path`.
    pub fn target(&self, path: &Path, name: &str) -> Option<&TargetNode> {
        self.lookup(path, name).map(|(_, node)| node)
    }

    /// Collects every node reachable from `root` that is a `T` and passes `test`.
    ///
    /// Iterative depth-first search with an explicit stack. Each node is
    /// visited at most once however many paths lead to it. A node that is an
    /// `S` and matches `skip` is still reported if it is a `T` passing `test`,
    /// but its dependencies are not explored. The root itself is never
    /// reported nor skipped. Only target nodes have outgoing edges.
    ///
    /// Pass [`Node`] as `S` with `|_| false` to explore everything.
    pub fn find_all<T, S, F, P>(&self, root: NodeId, test: F, skip: P) -> Vec<&T>
    where
        T: NodeVariant,
        S: NodeVariant,
        F: Fn(&T) -> bool,
        P: Fn(&S) -> bool,
    {
        let mut stack = vec![root];
        let mut visited = HashSet::new();
        let mut found = Vec::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = &self.nodes[id];
            if id != root {
                if let Some(value) = T::from_node(node) {
                    if test(value) {
                        found.push(value);
                    }
                }
                if S::from_node(node).is_some_and(&skip) {
                    continue;
                }
            }
            stack.extend(
                node.dependencies()
                    .iter()
                    .rev()
                    .filter(|child| !visited.contains(*child)),
            );
        }

        found
    }

    /// Direct target dependencies declared in the same project.
    pub fn target_dependencies(&self, path: &Path, name: &str) -> Vec<&TargetNode> {
        let Some((_, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        self.direct::<TargetNode>(node)
            .filter(|dependency| dependency.path() == path)
            .collect()
    }

    /// Products of direct static library and static framework dependencies.
    pub fn static_dependencies(&self, path: &Path, name: &str) -> Vec<DependencyReference> {
        let Some((_, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        self.direct::<TargetNode>(node)
            .filter(|dependency| is_static(dependency))
            .map(DependencyReference::product)
            .collect()
    }

    /// Direct dependencies that are resource bundles.
    pub fn resource_bundle_dependencies(&self, path: &Path, name: &str) -> Vec<&TargetNode> {
        let Some((_, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        self.direct::<TargetNode>(node)
            .filter(|dependency| dependency.target.product == Product::Bundle)
            .collect()
    }

    /// Everything that must appear on the linker's input list for a target.
    ///
    /// Includes direct SDKs, every precompiled artifact in the transitive
    /// closure, and direct dynamic libraries and frameworks. Targets that can
    /// link static products also get the static targets reachable without
    /// crossing a dynamic framework, together with those targets' SDKs and
    /// direct dynamic dependencies. A unit test bundle leaves out static
    /// products its host application already links. Sorted and deduplicated.
    pub fn linkable_dependencies(&self, path: &Path, name: &str) -> Vec<DependencyReference> {
        let Some((id, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        let mut references = BTreeSet::new();

        if node.target.product.can_link_static_products() {
            let mut static_targets = self.transitive_static_targets(id);
            if node.target.product == Product::UnitTests {
                if let Some(host) = self.host_application(node) {
                    let linked_by_host: HashSet<&TargetNode> =
                        self.transitive_static_targets(host).into_iter().collect();
                    static_targets.retain(|t| !linked_by_host.contains(t));
                }
            }
            for static_target in static_targets {
                references.insert(DependencyReference::product(static_target));
                references.extend(self.direct::<SdkNode>(static_target).map(sdk_reference));
                references.extend(
                    self.direct::<TargetNode>(static_target)
                        .filter(|t| is_dynamic_linkable(t))
                        .map(DependencyReference::product),
                );
            }
        }

        references.extend(self.direct::<SdkNode>(node).map(sdk_reference));
        references.extend(
            self.find_all::<Precompiled, Node, _, _>(id, |_| true, |_| false)
                .into_iter()
                .map(|precompiled| DependencyReference::absolute(precompiled.path())),
        );
        references.extend(
            self.direct::<TargetNode>(node)
                .filter(|t| is_dynamic_linkable(t))
                .map(DependencyReference::product),
        );

        references.into_iter().collect()
    }

    /// Frameworks that must be copied into the target's product bundle.
    ///
    /// Only apps and test bundles embed. The result holds precompiled
    /// frameworks and xcframeworks whose binary links dynamically,
    /// first-party framework targets, and every precompiled framework or
    /// xcframework bundle in the transitive closure. The search does not
    /// descend into other embedding targets, which carry their own
    /// frameworks. A unit test bundle also leaves out what its host
    /// application embeds. Sorted and deduplicated.
    pub fn embeddable_frameworks(&self, path: &Path, name: &str) -> Vec<DependencyReference> {
        let Some((id, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        if !node.target.product.can_embed_products() {
            return Vec::new();
        }
        let mut references = BTreeSet::new();

        let bundles = self.find_all::<Precompiled, TargetNode, _, _>(
            id,
            is_framework_bundle,
            embeds_products,
        );
        references.extend(
            bundles
                .iter()
                .filter(|precompiled| uses_dynamic_linking(precompiled))
                .map(|precompiled| DependencyReference::absolute(precompiled.path())),
        );
        references.extend(
            self.find_all::<TargetNode, TargetNode, _, _>(
                id,
                |t| t.target.product == Product::Framework,
                embeds_products,
            )
            .into_iter()
            .map(DependencyReference::product),
        );
        references.extend(
            bundles
                .into_iter()
                .map(|precompiled| DependencyReference::absolute(precompiled.path())),
        );

        if node.target.product == Product::UnitTests {
            if let Some(host) = self.host_application(node) {
                let host = &self.nodes[host];
                for embedded in self.embeddable_frameworks(host.path(), &host.name()) {
                    references.remove(&embedded);
                }
            }
        }

        references.into_iter().collect()
    }

    /// Public header directories of direct library dependencies.
    pub fn libraries_public_headers_folders(&self, path: &Path, name: &str) -> Vec<PathBuf> {
        let Some((_, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        self.direct::<LibraryNode>(node)
            .map(|library| library.public_headers.clone())
            .collect()
    }

    /// Directories containing direct library dependencies.
    pub fn libraries_search_paths(&self, path: &Path, name: &str) -> Vec<PathBuf> {
        let Some((_, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        self.direct::<LibraryNode>(node)
            .filter_map(|library| library.precompiled.path().parent().map(Path::to_path_buf))
            .collect()
    }

    /// Directories containing the Swift module maps of direct library dependencies.
    pub fn libraries_swift_include_paths(&self, path: &Path, name: &str) -> Vec<PathBuf> {
        let Some((_, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        self.direct::<LibraryNode>(node)
            .filter_map(|library| library.swift_module_map.as_deref())
            .filter_map(|module_map| module_map.parent().map(Path::to_path_buf))
            .collect()
    }

    /// Products that must be built before the target even though it does not link them.
    ///
    /// Static products list their static dependencies; every target lists its
    /// resource bundles.
    pub fn copy_product_dependencies(&self, path: &Path, name: &str) -> Vec<DependencyReference> {
        let Some((_, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        let mut references = BTreeSet::new();
        if node.target.product.is_static() {
            references.extend(self.static_dependencies(path, name));
        }
        references.extend(
            self.resource_bundle_dependencies(path, name)
                .into_iter()
                .map(DependencyReference::product),
        );
        references.into_iter().collect()
    }

    /// Every reference any target of the project at `path` links, embeds, or copies.
    pub fn all_dependency_references(&self, path: &Path) -> Vec<DependencyReference> {
        let Some(project) = self.projects.get(path) else {
            return Vec::new();
        };
        let mut references = BTreeSet::new();
        for target in &project.targets {
            references.extend(self.linkable_dependencies(path, &target.name));
            references.extend(self.embeddable_frameworks(path, &target.name));
            references.extend(self.copy_product_dependencies(path, &target.name));
        }
        references.into_iter().collect()
    }

    /// Direct dependencies that are app extensions.
    pub fn app_extension_dependencies(&self, path: &Path, name: &str) -> Vec<&TargetNode> {
        let Some((_, node)) = self.lookup(path, name) else {
            return Vec::new();
        };
        self.direct::<TargetNode>(node)
            .filter(|dependency| dependency.target.product.is_extension())
            .collect()
    }

    /// The first target of the same project, by name, that depends on target `name`.
    pub fn host_target_node_for(&self, path: &Path, name: &str) -> Option<&TargetNode> {
        let id = self.target_id(path, name)?;
        self.targets_at(path)
            .into_iter()
            .find(|candidate| candidate.dependencies.contains(&id))
    }

    /// Test bundles of the same project that directly depend on target `name`.
    ///
    /// Sorted by name.
    pub fn test_targets_depending_on(&self, path: &Path, name: &str) -> Vec<&TargetNode> {
        let Some(id) = self.target_id(path, name) else {
            return Vec::new();
        };
        self.targets_at(path)
            .into_iter()
            .filter(|candidate| candidate.target.product.is_tests_bundle())
            .filter(|candidate| candidate.dependencies.contains(&id))
            .collect()
    }

    fn lookup(&self, path: &Path, name: &str) -> Option<(NodeId, &TargetNode)> {
        let id = self.target_id(path, name)?;
        TargetNode::from_node(&self.nodes[id]).map(|node| (id, node))
    }

    fn variants<'a, T: NodeVariant + 'a>(&'a self) -> impl Iterator<Item = &'a T> + 'a {
        self.nodes.values().filter_map(T::from_node)
    }

    fn direct<'a, T: NodeVariant + 'a>(
        &'a self,
        node: &'a TargetNode,
    ) -> impl Iterator<Item = &'a T> + 'a {
        node.dependencies
            .iter()
            .filter_map(|id| T::from_node(&self.nodes[*id]))
    }

    /// Static targets reachable from `id` without crossing a product that
    /// links its own static dependencies.
    fn transitive_static_targets(&self, id: NodeId) -> Vec<&TargetNode> {
        self.find_all::<TargetNode, TargetNode, _, _>(id, is_static, links_static_products)
    }

    fn host_application(&self, node: &TargetNode) -> Option<NodeId> {
        node.dependencies.iter().copied().find(|id| {
            TargetNode::from_node(&self.nodes[*id])
                .is_some_and(|dependency| dependency.target.product == Product::App)
        })
    }
}

fn is_static(node: &TargetNode) -> bool {
    node.target.product.is_static()
}

fn links_static_products(node: &TargetNode) -> bool {
    node.target.product.can_link_static_products()
}

fn embeds_products(node: &TargetNode) -> bool {
    node.target.product.can_embed_products()
}

/// Framework and xcframework bundles; plain libraries are linked, never embedded.
fn is_framework_bundle(precompiled: &Precompiled) -> bool {
    matches!(
        precompiled.path().extension().and_then(|e| e.to_str()),
        Some("framework" | "xcframework")
    )
}

fn is_dynamic_linkable(node: &TargetNode) -> bool {
    matches!(
        node.target.product,
        Product::Framework | Product::DynamicLibrary
    )
}

fn sdk_reference(sdk: &SdkNode) -> DependencyReference {
    DependencyReference::Sdk {
        path: sdk.path.clone(),
        status: sdk.status,
    }
}

/// Inspection failures count as not dynamic.
fn uses_dynamic_linking(precompiled: &Precompiled) -> bool {
    match precompiled.linking() {
        Ok(linking) => linking == Linking::Dynamic,
        Err(err) => {
            tracing::warn!(
                "couldn't determine linking of {}, assuming static: {}",
                precompiled.path().display(),
                err
            );
            false
        }
    }
}
