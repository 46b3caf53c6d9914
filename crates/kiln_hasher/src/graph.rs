//! Hashing every target of a graph.
//!
//! Targets are scheduled in dependency levels: a level holds the targets
//! whose target dependencies all sit in earlier levels. Each level is hashed
//! in parallel with rayon, so a target is hashed exactly once and only after
//! everything it depends on.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use kiln_common::{ContentHash, HashBuilder};
use kiln_config::KilnConfig;
use kiln_graph::{Graph, Node, NodeId, NodeKey, TargetNode};
use kiln_model::Product;
use rayon::prelude::*;

use crate::error::HashError;
use crate::file_hasher::FileHasher;
use crate::target::TargetContentHasher;

/// What a hashing run covers and which extra inputs it mixes in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashOptions {
    /// Names of targets that are not hashed. Resource bundles synthesized
    /// from them are left out as well.
    pub excluded_targets: BTreeSet<String>,
    /// Build configuration whose setting overrides are hashed.
    pub configuration: Option<String>,
    /// Destination the artifacts are built for.
    pub destination: Option<String>,
    /// Appended to every target's inputs, in order.
    pub additional_strings: Vec<String>,
    /// Compiler language version.
    pub language_version: Option<String>,
    /// IDE / SDK bundle version.
    pub ide_version: Option<String>,
}

impl From<&KilnConfig> for HashOptions {
    fn from(config: &KilnConfig) -> Self {
        Self {
            excluded_targets: config.hashing.excluded_targets.iter().cloned().collect(),
            configuration: config.hashing.configuration.clone(),
            destination: config.hashing.destination.clone(),
            additional_strings: config.hashing.additional_strings.clone(),
            language_version: config.toolchain.language_version.clone(),
            ide_version: config.toolchain.ide_version.clone(),
        }
    }
}

impl HashOptions {
    /// Returns `true` if `node` is excluded by name, or is the resource bundle
    /// `<project>_<target>` synthesized for an excluded target.
    pub fn excludes(&self, node: &TargetNode) -> bool {
        let name = &node.target.name;
        if self.excluded_targets.contains(name) {
            return true;
        }
        node.target.product == Product::Bundle
            && self.excluded_targets.iter().any(|excluded| {
                *name == format!("{}_{}", node.project.name, excluded.replace('-', "_"))
            })
    }
}

/// Computes content hashes for every target of a graph.
///
/// File contents are memoized for the lifetime of the hasher, so reuse one
/// instance only while the files on disk are unchanged.
#[derive(Debug, Default)]
pub struct GraphContentHasher {
    files: FileHasher,
}

impl GraphContentHasher {
    /// Creates a hasher with an empty file memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the file memo shared by every target of a run.
    pub fn files(&self) -> &FileHasher {
        &self.files
    }

    /// Hashes every non-excluded target in `graph`.
    ///
    /// Each hash covers the target's own inputs and the hashes of all
    /// non-excluded targets in its transitive dependency closure. Values are
    /// 32-character lowercase hex strings.
    pub fn content_hashes(
        &self,
        graph: &Graph,
        options: &HashOptions,
    ) -> Result<BTreeMap<NodeKey, String>, HashError> {
        let levels = dependency_levels(graph)?;
        let target_hasher = TargetContentHasher::new(&self.files);
        let mut hashes: HashMap<NodeId, ContentHash> = HashMap::new();

        for (depth, level) in levels.iter().enumerate() {
            let pending: Vec<(NodeId, &TargetNode)> = level
                .iter()
                .filter_map(|id| target_node(graph, *id).map(|node| (*id, node)))
                .filter(|(_, node)| !options.excludes(node))
                .collect();
            tracing::debug!("hashing level {} ({} targets)", depth, pending.len());

            let done = &hashes;
            let computed = pending
                .par_iter()
                .map(|(id, node)| {
                    let own = target_hasher.hash(graph, node, options)?;
                    let hash = combine(graph, *id, own, options, done)?;
                    tracing::trace!("{}:{} -> {}", node.path().display(), node.name(), hash);
                    Ok((*id, hash))
                })
                .collect::<Result<Vec<_>, HashError>>()?;
            hashes.extend(computed);
        }

        hashes
            .into_iter()
            .map(|(id, hash)| {
                let node = graph.get(id).ok_or_else(|| foreign_node(id))?;
                Ok((node.key(), hash.to_string()))
            })
            .collect()
    }
}

/// Folds the hashes of the target's dependency closure into its own hash.
fn combine(
    graph: &Graph,
    id: NodeId,
    own: ContentHash,
    options: &HashOptions,
    done: &HashMap<NodeId, ContentHash>,
) -> Result<ContentHash, HashError> {
    let mut closure = Vec::new();
    let dependencies =
        graph.find_all::<TargetNode, Node, _, _>(id, |t| !options.excludes(t), |_| false);
    for dependency in dependencies {
        let hash = graph
            .target_id(dependency.path(), dependency.name())
            .and_then(|dependency_id| done.get(&dependency_id))
            .ok_or_else(|| HashError::Internal {
                reason: format!(
                    "dependency {} hashed after its dependent",
                    dependency.key()
                ),
            })?;
        closure.push(*hash);
    }
    closure.sort();

    let mut builder = HashBuilder::new();
    builder.update_hash(&own);
    for hash in &closure {
        builder.update_hash(hash);
    }
    Ok(builder.finish())
}

fn target_node(graph: &Graph, id: NodeId) -> Option<&TargetNode> {
    match graph.get(id) {
        Some(Node::Target(target)) => Some(target),
        _ => None,
    }
}

pub(crate) fn foreign_node(id: NodeId) -> HashError {
    HashError::Internal {
        reason: format!("node {id:?} is not part of the graph"),
    }
}

/// Groups target nodes so that every target's dependencies sit in earlier groups.
fn dependency_levels(graph: &Graph) -> Result<Vec<Vec<NodeId>>, HashError> {
    let mut remaining: HashMap<NodeId, usize> = HashMap::new();
    let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    for target in graph.targets() {
        let Some(id) = graph.target_id(target.path(), target.name()) else {
            continue;
        };
        let mut dependencies: Vec<NodeId> = target
            .dependencies
            .iter()
            .copied()
            .filter(|dependency| target_node(graph, *dependency).is_some())
            .collect();
        dependencies.sort();
        dependencies.dedup();
        remaining.insert(id, dependencies.len());
        for dependency in dependencies {
            dependents.entry(dependency).or_default().push(id);
        }
    }

    let total = remaining.len();
    let mut level: Vec<NodeId> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    level.sort();

    let mut levels = Vec::new();
    let mut scheduled = 0;
    while !level.is_empty() {
        let mut next = Vec::new();
        for id in &level {
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        next.push(*dependent);
                    }
                }
            }
        }
        next.sort();
        scheduled += level.len();
        levels.push(std::mem::replace(&mut level, next));
    }

    if scheduled != total {
        return Err(HashError::Internal {
            reason: format!("{} targets are part of a dependency cycle", total - scheduled),
        });
    }
    Ok(levels)
}
