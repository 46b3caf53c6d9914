//! JSON export of a loaded graph.
//!
//! Nodes are written as a flat array sorted by `(path, name)` and then kind, each listing
//! its dependencies by identity. Binary metadata that cannot be read is
//! written as `null` rather than failing the export.

use std::path::Path;

use kiln_model::{Package, Platform, Product, SdkStatus};
use serde::Serialize;

use crate::binary::{Architecture, Linking};
use crate::graph::Graph;
use crate::node::{Node, NodeKey, Precompiled, SdkKind};

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum NodeView<'a> {
    Target {
        path: &'a Path,
        name: &'a str,
        platform: Platform,
        product: Product,
        bundle_id: &'a str,
        dependencies: Vec<NodeKey>,
    },
    Framework {
        path: &'a Path,
        name: String,
        third_party: bool,
        linking: Option<Linking>,
        architectures: Option<Vec<Architecture>>,
    },
    #[serde(rename = "xcframework")]
    XcFramework {
        path: &'a Path,
        name: String,
        primary_binary_path: &'a Path,
        linking: Option<Linking>,
        architectures: Option<Vec<Architecture>>,
    },
    Library {
        path: &'a Path,
        name: String,
        public_headers: &'a Path,
        swift_module_map: Option<&'a Path>,
        linking: Option<Linking>,
        architectures: Option<Vec<Architecture>>,
    },
    Sdk {
        path: &'a Path,
        name: &'a str,
        status: SdkStatus,
        kind: SdkKind,
    },
    Package {
        path: &'a Path,
        product: &'a str,
        package: &'a Package,
    },
}

impl Graph {
    /// Serializes the graph to a JSON value.
    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        let mut nodes: Vec<&Node> = self.nodes().collect();
        nodes.sort_by_cached_key(|node| (node.key(), node.kind()));
        let views: Vec<NodeView<'_>> = nodes.into_iter().map(|node| self.view(node)).collect();
        serde_json::to_value(views)
    }

    /// Serializes the graph to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_json_value()?)
    }

    fn view<'a>(&'a self, node: &'a Node) -> NodeView<'a> {
        match node {
            Node::Target(target) => NodeView::Target {
                path: target.path(),
                name: target.name(),
                platform: target.target.platform,
                product: target.target.product,
                bundle_id: &target.target.bundle_id,
                dependencies: target
                    .dependencies
                    .iter()
                    .map(|id| self.node(*id).key())
                    .collect(),
            },
            Node::Framework(framework) => NodeView::Framework {
                path: framework.precompiled.path(),
                name: framework.precompiled.name(),
                third_party: framework.is_third_party(),
                linking: linking(&framework.precompiled),
                architectures: framework.precompiled.architectures().ok(),
            },
            Node::XcFramework(xcframework) => NodeView::XcFramework {
                path: xcframework.precompiled.path(),
                name: xcframework.precompiled.name(),
                primary_binary_path: xcframework.precompiled.binary_path(),
                linking: linking(&xcframework.precompiled),
                architectures: xcframework.precompiled.architectures().ok(),
            },
            Node::Library(library) => NodeView::Library {
                path: library.precompiled.path(),
                name: library.precompiled.name(),
                public_headers: &library.public_headers,
                swift_module_map: library.swift_module_map.as_deref(),
                linking: linking(&library.precompiled),
                architectures: library.precompiled.architectures().ok(),
            },
            Node::Sdk(sdk) => NodeView::Sdk {
                path: &sdk.path,
                name: &sdk.name,
                status: sdk.status,
                kind: sdk.kind,
            },
            Node::Package(package) => NodeView::Package {
                path: &package.path,
                product: &package.product,
                package: &package.package,
            },
        }
    }
}

fn linking(precompiled: &Precompiled) -> Option<Linking> {
    precompiled.linking().ok()
}
