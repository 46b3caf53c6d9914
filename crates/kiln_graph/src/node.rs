//! Graph nodes and their identities.
//!
//! Every node is one variant of [`Node`]. Identity is a [`NodeKey`]
//! (directory path plus name), unique among nodes of one [`NodeKind`]. A
//! package product and a target may share a key, as may an SDK and a
//! precompiled framework at the same path; [`Node::identity`] pairs the key
//! with the kind and is unique across the graph. Equality compares identity
//! together with the variant-specific fields that make two declarations
//! distinct.
//! Edges between nodes are [`NodeId`]s into the owning arena.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use kiln_model::{Package, Product, Project, SdkStatus, Target};
use serde::Serialize;

use crate::binary::{Architecture, BinaryError, BinaryInspector, BinaryMetadata, Linking};
use crate::error::GraphLoadingError;
use crate::ids::NodeId;

/// The `(path, name)` pair that uniquely identifies a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeKey {
    /// Project directory for targets and packages, artifact path otherwise.
    pub path: PathBuf,
    /// Target, product, or file name.
    pub name: String,
}

impl NodeKey {
    /// Creates a key.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.name)
    }
}

/// The variant of a [`Node`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// [`Node::Target`]
    Target,
    /// [`Node::Framework`]
    Framework,
    /// [`Node::XcFramework`]
    XcFramework,
    /// [`Node::Library`]
    Library,
    /// [`Node::Sdk`]
    Sdk,
    /// [`Node::Package`]
    Package,
}

/// A node in the dependency graph.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum Node {
    /// A first-party target.
    Target(TargetNode),
    /// A precompiled `.framework` bundle.
    Framework(FrameworkNode),
    /// A precompiled `.xcframework` bundle.
    XcFramework(XcFrameworkNode),
    /// A precompiled static or dynamic library.
    Library(LibraryNode),
    /// A system framework or library.
    Sdk(SdkNode),
    /// A product of an external package.
    Package(PackageNode),
}

impl Node {
    /// Returns the node's identity within its kind.
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.path(), self.name())
    }

    /// Returns the variant.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Target(_) => NodeKind::Target,
            Node::Framework(_) => NodeKind::Framework,
            Node::XcFramework(_) => NodeKind::XcFramework,
            Node::Library(_) => NodeKind::Library,
            Node::Sdk(_) => NodeKind::Sdk,
            Node::Package(_) => NodeKind::Package,
        }
    }

    /// Returns the kind and key, which no two nodes of a graph share.
    pub fn identity(&self) -> (NodeKind, NodeKey) {
        (self.kind(), self.key())
    }

    /// Returns the identity path.
    pub fn path(&self) -> &Path {
        match self {
            Node::Target(node) => &node.project.path,
            Node::Framework(node) => node.precompiled.path(),
            Node::XcFramework(node) => node.precompiled.path(),
            Node::Library(node) => node.precompiled.path(),
            Node::Sdk(node) => &node.path,
            Node::Package(node) => &node.path,
        }
    }

    /// Returns the identity name.
    pub fn name(&self) -> String {
        match self {
            Node::Target(node) => node.target.name.clone(),
            Node::Framework(node) => node.precompiled.name(),
            Node::XcFramework(node) => node.precompiled.name(),
            Node::Library(node) => node.precompiled.name(),
            Node::Sdk(node) => node.name.clone(),
            Node::Package(node) => node.product.clone(),
        }
    }

    /// Returns the outgoing edges. Only targets have dependencies.
    pub fn dependencies(&self) -> &[NodeId] {
        match self {
            Node::Target(node) => &node.dependencies,
            _ => &[],
        }
    }

    /// Returns the precompiled payload of framework and library nodes.
    pub fn as_precompiled(&self) -> Option<&Precompiled> {
        Precompiled::from_node(self)
    }

    /// Returns the node as `T`, if it is that variant.
    pub fn downcast<T: NodeVariant>(&self) -> Option<&T> {
        T::from_node(self)
    }
}

/// Typed access to one node variant.
///
/// Traversals are generic over this trait, so a search for frameworks
/// simply never matches other variants instead of failing a cast.
pub trait NodeVariant {
    /// Returns the payload if `node` is this variant.
    fn from_node(node: &Node) -> Option<&Self>;
}

impl NodeVariant for Node {
    fn from_node(node: &Node) -> Option<&Self> {
        Some(node)
    }
}

/// A first-party target together with the project that declares it.
#[derive(Debug)]
pub struct TargetNode {
    /// Declaring project, shared by all of its target nodes.
    pub project: Arc<Project>,
    /// The target descriptor.
    pub target: Target,
    /// Resolved dependencies, in declaration order.
    pub dependencies: Vec<NodeId>,
}

impl TargetNode {
    /// Returns the project directory.
    pub fn path(&self) -> &Path {
        &self.project.path
    }

    /// Returns the target name.
    pub fn name(&self) -> &str {
        &self.target.name
    }

    /// Returns the node's identity.
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.path(), self.name())
    }
}

impl PartialEq for TargetNode {
    fn eq(&self, other: &Self) -> bool {
        self.project.path == other.project.path && self.target.name == other.target.name
    }
}

impl Eq for TargetNode {}

impl Hash for TargetNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.project.path.hash(state);
        self.target.name.hash(state);
    }
}

impl NodeVariant for TargetNode {
    fn from_node(node: &Node) -> Option<&Self> {
        match node {
            Node::Target(target) => Some(target),
            _ => None,
        }
    }
}

/// Artifact path plus lazily inspected binary metadata.
///
/// Shared payload of [`FrameworkNode`], [`XcFrameworkNode`] and [`LibraryNode`].
pub struct Precompiled {
    path: PathBuf,
    binary_path: PathBuf,
    inspector: Arc<dyn BinaryInspector>,
    metadata: OnceLock<Result<BinaryMetadata, BinaryError>>,
}

impl Precompiled {
    /// Creates a payload. No I/O happens until metadata is requested.
    pub fn new(
        path: impl Into<PathBuf>,
        binary_path: impl Into<PathBuf>,
        inspector: Arc<dyn BinaryInspector>,
    ) -> Self {
        Self {
            path: path.into(),
            binary_path: binary_path.into(),
            inspector,
            metadata: OnceLock::new(),
        }
    }

    /// Returns the artifact path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file name of the artifact.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Returns the path of the binary inside the artifact.
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Inspects the binary on first use and caches the outcome, error included.
    pub fn metadata(&self) -> Result<&BinaryMetadata, BinaryError> {
        self.metadata
            .get_or_init(|| self.inspector.inspect(&self.binary_path))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Returns how the binary links.
    pub fn linking(&self) -> Result<Linking, BinaryError> {
        self.metadata().map(|m| m.linking)
    }

    /// Returns the architectures in the binary.
    pub fn architectures(&self) -> Result<Vec<Architecture>, BinaryError> {
        self.metadata().map(|m| m.architectures.clone())
    }
}

impl fmt::Debug for Precompiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Precompiled")
            .field("path", &self.path)
            .field("binary_path", &self.binary_path)
            .field("metadata", &self.metadata.get())
            .finish()
    }
}

impl NodeVariant for Precompiled {
    fn from_node(node: &Node) -> Option<&Self> {
        match node {
            Node::Framework(framework) => Some(&framework.precompiled),
            Node::XcFramework(xcframework) => Some(&xcframework.precompiled),
            Node::Library(library) => Some(&library.precompiled),
            _ => None,
        }
    }
}

/// A precompiled `.framework` bundle.
#[derive(Debug)]
pub struct FrameworkNode {
    /// Path and binary metadata.
    pub precompiled: Precompiled,
    third_party: bool,
}

impl FrameworkNode {
    /// Creates a framework node for the bundle at `path`.
    ///
    /// The binary lives at `<path>/<bundle name without extension>`. The node
    /// is flagged third-party when its path contains one of `markers`.
    pub fn new(path: PathBuf, markers: &[String], inspector: Arc<dyn BinaryInspector>) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        let binary_path = path.join(stem);
        let display = path.to_string_lossy();
        let third_party = markers.iter().any(|m| display.contains(m.as_str()));
        Self {
            precompiled: Precompiled::new(path, binary_path, inspector),
            third_party,
        }
    }

    /// Returns `true` if a third-party dependency manager produced the bundle.
    pub fn is_third_party(&self) -> bool {
        self.third_party
    }

    /// Returns the product kind implied by the binary's linking.
    pub fn product(&self) -> Result<Product, BinaryError> {
        Ok(match self.precompiled.linking()? {
            Linking::Static => Product::StaticFramework,
            Linking::Dynamic => Product::Framework,
        })
    }
}

impl PartialEq for FrameworkNode {
    fn eq(&self, other: &Self) -> bool {
        self.precompiled.path == other.precompiled.path
    }
}

impl Eq for FrameworkNode {}

impl Hash for FrameworkNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.precompiled.path.hash(state);
    }
}

impl NodeVariant for FrameworkNode {
    fn from_node(node: &Node) -> Option<&Self> {
        match node {
            Node::Framework(framework) => Some(framework),
            _ => None,
        }
    }
}

/// A precompiled `.xcframework` bundle.
///
/// Linking is read from the primary binary, the slice binary the loader
/// picked for the bundle.
#[derive(Debug)]
pub struct XcFrameworkNode {
    /// Path and binary metadata.
    pub precompiled: Precompiled,
}

impl XcFrameworkNode {
    /// Creates an xcframework node whose metadata comes from `primary_binary_path`.
    pub fn new(
        path: PathBuf,
        primary_binary_path: PathBuf,
        inspector: Arc<dyn BinaryInspector>,
    ) -> Self {
        Self {
            precompiled: Precompiled::new(path, primary_binary_path, inspector),
        }
    }
}

impl PartialEq for XcFrameworkNode {
    fn eq(&self, other: &Self) -> bool {
        self.precompiled.path == other.precompiled.path
    }
}

impl Eq for XcFrameworkNode {}

impl Hash for XcFrameworkNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.precompiled.path.hash(state);
    }
}

impl NodeVariant for XcFrameworkNode {
    fn from_node(node: &Node) -> Option<&Self> {
        match node {
            Node::XcFramework(xcframework) => Some(xcframework),
            _ => None,
        }
    }
}

/// A precompiled static or dynamic library with its headers.
#[derive(Debug)]
pub struct LibraryNode {
    /// Path and binary metadata. The binary path equals the library path.
    pub precompiled: Precompiled,
    /// Directory of public headers.
    pub public_headers: PathBuf,
    /// Module map exposing the library to Swift.
    pub swift_module_map: Option<PathBuf>,
}

impl LibraryNode {
    /// Creates a library node.
    pub fn new(
        path: PathBuf,
        public_headers: PathBuf,
        swift_module_map: Option<PathBuf>,
        inspector: Arc<dyn BinaryInspector>,
    ) -> Self {
        Self {
            precompiled: Precompiled::new(path.clone(), path, inspector),
            public_headers,
            swift_module_map,
        }
    }

    /// Returns the product kind implied by the binary's linking.
    pub fn product(&self) -> Result<Product, BinaryError> {
        Ok(match self.precompiled.linking()? {
            Linking::Static => Product::StaticLibrary,
            Linking::Dynamic => Product::DynamicLibrary,
        })
    }
}

impl PartialEq for LibraryNode {
    fn eq(&self, other: &Self) -> bool {
        self.precompiled.path == other.precompiled.path
            && self.public_headers == other.public_headers
            && self.swift_module_map == other.swift_module_map
    }
}

impl Eq for LibraryNode {}

impl Hash for LibraryNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.precompiled.path.hash(state);
        self.public_headers.hash(state);
        self.swift_module_map.hash(state);
    }
}

impl NodeVariant for LibraryNode {
    fn from_node(node: &Node) -> Option<&Self> {
        match node {
            Node::Library(library) => Some(library),
            _ => None,
        }
    }
}

/// Whether a system SDK is a framework bundle or a text-based library stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkKind {
    /// `Foo.framework`
    Framework,
    /// `libfoo.tbd`
    Library,
}

/// A system framework or library provided by the platform SDK.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SdkNode {
    /// File name as declared.
    pub name: String,
    /// Location inside the SDK.
    pub path: PathBuf,
    /// Required or weakly linked.
    pub status: SdkStatus,
    /// Framework or library.
    pub kind: SdkKind,
}

impl SdkNode {
    /// Creates an SDK node from its declared file name.
    ///
    /// `.framework` resolves under `/System/Library/Frameworks`, `.tbd` under
    /// `/usr/lib`. Any other extension is rejected.
    pub fn new(name: &str, status: SdkStatus) -> Result<Self, GraphLoadingError> {
        let extension = Path::new(name).extension().and_then(|e| e.to_str());
        let (kind, path) = match extension {
            Some("framework") => (
                SdkKind::Framework,
                Path::new("/System/Library/Frameworks").join(name),
            ),
            Some("tbd") => (SdkKind::Library, Path::new("/usr/lib").join(name)),
            _ => {
                return Err(GraphLoadingError::UnsupportedSdk {
                    name: name.to_string(),
                })
            }
        };
        Ok(Self {
            name: name.to_string(),
            path,
            status,
            kind,
        })
    }
}

impl NodeVariant for SdkNode {
    fn from_node(node: &Node) -> Option<&Self> {
        match node {
            Node::Sdk(sdk) => Some(sdk),
            _ => None,
        }
    }
}

/// A product exported by an external package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageNode {
    /// Directory of the project that declares the dependency.
    pub path: PathBuf,
    /// Product name.
    pub product: String,
    /// Package source.
    pub package: Package,
}

impl NodeVariant for PackageNode {
    fn from_node(node: &Node) -> Option<&Self> {
        match node {
            Node::Package(package) => Some(package),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::MachOInspector;
    use kiln_model::{Platform, Project, Target};
    use std::collections::HashSet;

    fn inspector() -> Arc<dyn BinaryInspector> {
        Arc::new(MachOInspector)
    }

    fn target_node(path: &str, name: &str, product: Product) -> TargetNode {
        TargetNode {
            project: Arc::new(Project::new(path, "P")),
            target: Target::new(name, Platform::Ios, product, "io.kiln"),
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn target_identity_ignores_descriptor_details() {
        let a = target_node("/p", "A", Product::Framework);
        let b = target_node("/p", "A", Product::StaticFramework);
        let c = target_node("/q", "A", Product::Framework);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn variants_never_compare_equal() {
        let sdk = SdkNode::new("A.framework", SdkStatus::Required).unwrap();
        let framework = FrameworkNode::new(
            PathBuf::from("/System/Library/Frameworks/A.framework"),
            &[],
            inspector(),
        );
        assert_eq!(
            Node::Sdk(sdk.clone()).key(),
            Node::Framework(FrameworkNode::new(sdk.path.clone(), &[], inspector())).key()
        );
        assert_ne!(Node::Sdk(sdk), Node::Framework(framework));
    }

    #[test]
    fn library_equality_includes_headers() {
        let a = LibraryNode::new("/l/libA.a".into(), "/l/include".into(), None, inspector());
        let b = LibraryNode::new("/l/libA.a".into(), "/l/headers".into(), None, inspector());
        let c = LibraryNode::new("/l/libA.a".into(), "/l/include".into(), None, inspector());
        assert_ne!(a, b);
        assert_eq!(a, c);
        let set: HashSet<_> = [a, b, c].into_iter().map(Node::Library).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn framework_binary_path_and_third_party() {
        let markers = vec!["Carthage/Build".to_string()];
        let node = FrameworkNode::new(
            PathBuf::from("/p/Carthage/Build/iOS/Alamofire.framework"),
            &markers,
            inspector(),
        );
        assert_eq!(
            node.precompiled.binary_path(),
            Path::new("/p/Carthage/Build/iOS/Alamofire.framework/Alamofire")
        );
        assert_eq!(node.precompiled.name(), "Alamofire.framework");
        assert!(node.is_third_party());

        let local =
            FrameworkNode::new(PathBuf::from("/p/Vendor/A.framework"), &markers, inspector());
        assert!(!local.is_third_party());
    }

    #[test]
    fn sdk_paths() {
        let framework = SdkNode::new("ARKit.framework", SdkStatus::Required).unwrap();
        assert_eq!(framework.path, Path::new("/System/Library/Frameworks/ARKit.framework"));
        assert_eq!(framework.kind, SdkKind::Framework);

        let library = SdkNode::new("libc++.tbd", SdkStatus::Optional).unwrap();
        assert_eq!(library.path, Path::new("/usr/lib/libc++.tbd"));
        assert_eq!(library.kind, SdkKind::Library);
    }

    #[test]
    fn unsupported_sdk_extension() {
        let err = SdkNode::new("libz.dylib", SdkStatus::Required).unwrap_err();
        assert!(matches!(err, GraphLoadingError::UnsupportedSdk { .. }));
    }

    #[test]
    fn sdk_status_is_discriminating() {
        let required = SdkNode::new("libz.tbd", SdkStatus::Required).unwrap();
        let optional = SdkNode::new("libz.tbd", SdkStatus::Optional).unwrap();
        assert_ne!(required, optional);
    }

    #[test]
    fn metadata_failure_is_cached_and_recoverable() {
        let library = LibraryNode::new(
            "/nonexistent/libA.a".into(),
            "/nonexistent".into(),
            None,
            inspector(),
        );
        assert!(matches!(library.precompiled.linking(), Err(BinaryError::Io { .. })));
        assert!(library.precompiled.architectures().is_err());
        assert!(library.product().is_err());
    }

    #[test]
    fn package_and_target_share_a_key_but_not_an_identity() {
        let target = Node::Target(target_node("/p", "Lib", Product::Framework));
        let package = Node::Package(PackageNode {
            path: PathBuf::from("/p"),
            product: "Lib".to_string(),
            package: Package::Local {
                path: PathBuf::from("/pkgs/Lib"),
            },
        });
        assert_eq!(target.key(), package.key());
        assert_ne!(target.identity(), package.identity());
        assert_eq!(package.kind(), NodeKind::Package);
    }

    #[test]
    fn xcframework_is_precompiled() {
        let node = Node::XcFramework(XcFrameworkNode::new(
            "/v/XF.xcframework".into(),
            "/v/XF.xcframework/ios-arm64/XF.framework/XF".into(),
            inspector(),
        ));
        assert_eq!(node.name(), "XF.xcframework");
        assert_eq!(node.kind(), NodeKind::XcFramework);
        let precompiled = node.as_precompiled().unwrap();
        assert_eq!(
            precompiled.binary_path(),
            Path::new("/v/XF.xcframework/ios-arm64/XF.framework/XF")
        );
        assert!(node.downcast::<FrameworkNode>().is_none());
    }

    #[test]
    fn downcast_is_total() {
        let node = Node::Target(target_node("/p", "A", Product::App));
        assert!(node.downcast::<TargetNode>().is_some());
        assert!(node.downcast::<FrameworkNode>().is_none());
        assert!(node.downcast::<Precompiled>().is_none());
        assert!(node.downcast::<Node>().is_some());
    }
}
