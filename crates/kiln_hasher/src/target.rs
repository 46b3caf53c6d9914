//! Hashing of a single target's own inputs.
//!
//! [`TargetContentHasher`] turns a target into a list of labelled facts and
//! digests them in a fixed order. Collections whose order carries no meaning
//! (sources, resources, models, headers) are sorted first, so reordering a
//! declaration never changes the hash. Paths enter the hash relative to the
//! project directory, never as absolute paths.

use std::collections::BTreeMap;
use std::path::Path;

use kiln_common::{relative_path, ContentHash, HashBuilder};
use kiln_graph::{Graph, Node, TargetNode};
use kiln_model::{Package, ScriptOrder, SettingValue, Settings, VersionRequirement};

use crate::error::HashError;
use crate::file_hasher::{portable, FileHasher};
use crate::graph::{foreign_node, HashOptions};

/// Computes the hash of a target's own inputs, excluding its dependencies' hashes.
pub struct TargetContentHasher<'a> {
    files: &'a FileHasher,
}

impl<'a> TargetContentHasher<'a> {
    /// Creates a hasher that reads file contents through `files`.
    pub fn new(files: &'a FileHasher) -> Self {
        Self { files }
    }

    /// Hashes the inputs of `node`.
    pub fn hash(
        &self,
        graph: &Graph,
        node: &TargetNode,
        options: &HashOptions,
    ) -> Result<ContentHash, HashError> {
        let base = node.path();
        let target = &node.target;
        let mut builder = HashBuilder::new();

        builder
            .update_str("name")
            .update_str(&target.name)
            .update_str("platform")
            .update_str(target.platform.as_str())
            .update_str("product")
            .update_str(target.product.as_str())
            .update_str("product_name")
            .update_str(&target.product_name())
            .update_str("bundle_id")
            .update_str(&target.bundle_id);

        let mut sources = Vec::with_capacity(target.sources.len());
        for source in &target.sources {
            sources.push((
                identity(&source.path, base),
                self.files.hash(&source.path)?,
                source.compiler_flags.clone().unwrap_or_default(),
            ));
        }
        sources.sort();
        sources.dedup();
        builder.update_str("sources");
        for (path, hash, flags) in &sources {
            builder.update_str(path).update_hash(hash).update_str(flags);
        }

        let mut resources = Vec::with_capacity(target.resources.len());
        for resource in &target.resources {
            let kind = if resource.is_folder_reference() {
                "folder"
            } else {
                "file"
            };
            let mut tags = resource.tags().to_vec();
            tags.sort();
            resources.push((
                identity(resource.path(), base),
                kind,
                self.files.hash(resource.path())?,
                tags.join(","),
            ));
        }
        resources.sort();
        resources.dedup();
        builder.update_str("resources");
        for (path, kind, hash, tags) in &resources {
            builder
                .update_str(path)
                .update_str(kind)
                .update_hash(hash)
                .update_str(tags);
        }

        let mut models = Vec::with_capacity(target.core_data_models.len());
        for model in &target.core_data_models {
            models.push((
                identity(&model.path, base),
                model.current_version.clone(),
                self.files.hash(&model.path)?,
            ));
        }
        models.sort();
        builder.update_str("core_data_models");
        for (path, version, hash) in &models {
            builder.update_str(path).update_str(version).update_hash(hash);
        }

        if let Some(headers) = &target.headers {
            for (visibility, paths) in [
                ("public_headers", &headers.public),
                ("private_headers", &headers.private),
                ("project_headers", &headers.project),
            ] {
                let mut hashed = Vec::with_capacity(paths.len());
                for path in paths {
                    hashed.push((identity(path, base), self.files.hash(path)?));
                }
                hashed.sort();
                builder.update_str(visibility);
                for (path, hash) in &hashed {
                    builder.update_str(path).update_hash(hash);
                }
            }
        }

        // Script phases run in declaration order, so their order is hashed.
        builder.update_str("scripts");
        for script in &target.scripts {
            builder
                .update_str(&script.name)
                .update_str(match script.order {
                    ScriptOrder::Pre => "pre",
                    ScriptOrder::Post => "post",
                })
                .update_str(&script.script);
            for path in &script.input_paths {
                builder.update_str("input").update_str(&identity(path, base));
            }
            for path in &script.output_paths {
                builder.update_str("output").update_str(&identity(path, base));
            }
        }

        builder.update_str("project_settings");
        hash_settings(&mut builder, &node.project.settings, options);
        builder.update_str("target_settings");
        if let Some(settings) = &target.settings {
            hash_settings(&mut builder, settings, options);
        }

        builder.update_str("environment");
        for (key, value) in &target.environment {
            builder.update_str(key).update_str(value);
        }

        builder.update_str("dependencies");
        for fact in self.dependency_facts(graph, node)? {
            builder.update_str(&fact);
        }

        builder
            .update_str("language_version")
            .update_str(options.language_version.as_deref().unwrap_or_default())
            .update_str("ide_version")
            .update_str(options.ide_version.as_deref().unwrap_or_default())
            .update_str("configuration")
            .update_str(options.configuration.as_deref().unwrap_or_default())
            .update_str("destination")
            .update_str(options.destination.as_deref().unwrap_or_default());
        builder.update_str("additional_strings");
        for extra in &options.additional_strings {
            builder.update_str(extra);
        }

        Ok(builder.finish())
    }

    /// Facts about direct non-target dependencies, plus the names of direct
    /// target dependencies. Target contents reach the final hash through the
    /// dependency closure instead.
    fn dependency_facts(&self, graph: &Graph, node: &TargetNode) -> Result<Vec<String>, HashError> {
        let base = node.path();
        let mut facts = Vec::with_capacity(node.dependencies.len());
        for id in &node.dependencies {
            let dependency = graph.get(*id).ok_or_else(|| foreign_node(*id))?;
            let fact = match dependency {
                Node::Target(dependency) => {
                    format!("target {}", dependency.name())
                }
                Node::Framework(framework) => {
                    let path = framework.precompiled.path();
                    format!(
                        "framework {} {}",
                        identity(path, base),
                        self.files.hash(path)?
                    )
                }
                Node::XcFramework(xcframework) => {
                    let path = xcframework.precompiled.path();
                    format!(
                        "xcframework {} {}",
                        identity(path, base),
                        self.files.hash(path)?
                    )
                }
                Node::Library(library) => {
                    let path = library.precompiled.path();
                    let mut fact = format!(
                        "library {} {} {}",
                        identity(path, base),
                        self.files.hash(path)?,
                        identity(&library.public_headers, base)
                    );
                    if let Some(module_map) = &library.swift_module_map {
                        fact.push(' ');
                        fact.push_str(&identity(module_map, base));
                        fact.push(' ');
                        fact.push_str(&self.files.hash(module_map)?.to_string());
                    }
                    fact
                }
                Node::Sdk(sdk) => format!("sdk {} {}", sdk.name, sdk.status.as_str()),
                Node::Package(package) => {
                    format!("package {} {}", package.product, package_fact(&package.package, base))
                }
            };
            facts.push(fact);
        }
        facts.sort();
        Ok(facts)
    }
}

/// The path as it enters a hash: relative to the project, `/`-separated.
fn identity(path: &Path, base: &Path) -> String {
    portable(&relative_path(path, base))
}

fn hash_settings(builder: &mut HashBuilder, settings: &Settings, options: &HashOptions) {
    hash_setting_map(builder, &settings.base);
    if let Some(configuration) = &options.configuration {
        if let Some(overrides) = settings.configurations.get(configuration) {
            builder.update_str(configuration);
            hash_setting_map(builder, overrides);
        }
    }
}

fn hash_setting_map(builder: &mut HashBuilder, map: &BTreeMap<String, SettingValue>) {
    for (key, value) in map {
        builder.update_str(key).update_str(&value.to_string());
    }
}

fn package_fact(package: &Package, base: &Path) -> String {
    match package {
        Package::Remote { url, requirement } => {
            let requirement = match requirement {
                VersionRequirement::UpToNextMajor { version } => format!("major {version}"),
                VersionRequirement::UpToNextMinor { version } => format!("minor {version}"),
                VersionRequirement::Exact { version } => format!("exact {version}"),
                VersionRequirement::Range { from, to } => format!("range {from} {to}"),
                VersionRequirement::Branch { branch } => format!("branch {branch}"),
                VersionRequirement::Revision { revision } => format!("revision {revision}"),
            };
            format!("remote {url} {requirement}")
        }
        Package::Local { path } => format!("local {}", identity(path, base)),
    }
}
