// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Composition logic for merging multiple manifests into a single request.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::config::ResolverOptions;
use crate::package::PackageRequest;
use crate::spec::ToolchainDecl;
use crate::EnvSpec;

#[cfg(test)]
#[path = "./compose_test.rs"]
mod compose_test;

/// Composed request from multiple manifests.
#[derive(Debug, Clone, Default)]
pub struct ComposedSpec {
    /// The last toolchain pin (`file` or `channel`) encountered.
    pub toolchain: Option<ToolchainDecl>,

    /// Union of every manifest's requested extensions.
    pub extensions: BTreeSet<String>,

    /// Package requests in search order, later same-name entries replacing
    /// earlier ones in place.
    pub packages: Vec<PackageRequest>,

    /// Fixed variables (later manifests win per key).
    pub env: BTreeMap<String, String>,

    /// Resolver options (last manifest wins if set).
    pub resolver: Option<ResolverOptions>,

    /// Source files that contributed to this composition.
    pub source_files: Vec<PathBuf>,
}

impl ComposedSpec {
    /// Check if a toolchain is pinned.
    pub fn has_toolchain(&self) -> bool {
        self.toolchain.is_some()
    }

    /// Get the number of source files.
    pub fn source_count(&self) -> usize {
        self.source_files.len()
    }
}

/// Compose multiple manifests into a single request.
///
/// Manifests are processed in order, with later manifests layering on top of earlier ones.
pub fn compose_specs(specs: &[EnvSpec]) -> ComposedSpec {
    let mut composed = ComposedSpec::default();

    for spec in specs {
        if let Some(decl) = &spec.toolchain {
            // Extensions accumulate; only an actual pin replaces the toolchain
            composed.extensions.extend(decl.extensions.iter().cloned());
            if decl.file.is_some() || decl.channel.is_some() {
                composed.toolchain = Some(decl.clone());
            }
        }

        for request in &spec.packages {
            match composed
                .packages
                .iter_mut()
                .find(|p| p.name == request.name)
            {
                Some(existing) => *existing = request.clone(),
                None => composed.packages.push(request.clone()),
            }
        }

        composed
            .env
            .extend(spec.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        if spec.resolver.is_some() {
            composed.resolver = spec.resolver.clone();
        }

        if let Some(path) = &spec.source_path {
            composed.source_files.push(path.clone());
        }
    }

    composed
}
