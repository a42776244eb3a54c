// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Discovery algorithm for finding and loading .shellenv.yaml files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[cfg(test)]
#[path = "./discovery_test.rs"]
mod discovery_test;

use crate::spec::resolve_path;
use crate::{EnvSpec, SHELLENV_FILENAME, SHELLENV_LOCAL_FILENAME};

/// Options for discovery behavior.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Disable in-tree inheritance (from --no-inherit or SHELLENV_NO_INHERIT).
    pub no_inherit: bool,

    /// Enable in-tree inheritance (from --inherit or SHELLENV_INHERIT).
    pub force_inherit: bool,

    /// Additional includes (from --include or SHELLENV_INCLUDE).
    pub includes: Vec<String>,
}

/// Tracks include files already loaded during one discovery pass.
#[derive(Debug, Default)]
struct IncludeTracker {
    seen: HashSet<PathBuf>,
}

impl IncludeTracker {
    fn load(&mut self, include_path: &str, base_dir: Option<&Path>) -> crate::Result<EnvSpec> {
        let path = resolve_path(include_path, base_dir)?;
        let path = dunce::canonicalize(&path).map_err(|e| crate::Error::IncludeNotFound {
            path: path.clone(),
            error: e,
        })?;

        if !self.seen.insert(path.clone()) {
            return Err(crate::Error::CircularInclude(path));
        }

        load_validated(&path)
    }
}

fn load_validated(path: &Path) -> crate::Result<EnvSpec> {
    let spec = EnvSpec::load(path)?;
    spec.validate()?;
    Ok(spec)
}

/// Discover all applicable .shellenv.yaml files.
///
/// Returns manifests in composition order (earlier manifests are layered first).
pub fn discover_specs<P: AsRef<Path>>(
    start_path: P,
    options: &DiscoveryOptions,
) -> crate::Result<Vec<EnvSpec>> {
    let mut tracker = IncludeTracker::default();
    let mut specs = Vec::new();

    // Step 1: Process explicit includes (go first in composition)
    for include_path in &options.includes {
        specs.push(tracker.load(include_path, None)?);
    }

    // Step 2: Discover in-tree manifests
    let in_tree_specs = discover_in_tree(start_path.as_ref(), options)?;
    specs.extend(in_tree_specs);

    // Step 3: Resolve all includes recursively
    let mut all_specs = resolve_all_includes(specs, &mut tracker)?;

    // Step 4: Load local override if it exists
    let start = resolve_start_path(start_path.as_ref());
    let local_path = start.join(SHELLENV_LOCAL_FILENAME);
    if local_path.is_file() {
        all_specs.push(load_validated(&local_path)?);
    }

    tracing::debug!(count = all_specs.len(), "discovered manifests");
    Ok(all_specs)
}

/// Resolve starting path, preferring $PWD to preserve symlinks.
fn resolve_start_path(start_path: &Path) -> PathBuf {
    if start_path.is_absolute() {
        start_path.to_owned()
    } else {
        match std::env::var("PWD").ok() {
            Some(pwd) => PathBuf::from(pwd).join(start_path),
            None => std::env::current_dir()
                .unwrap_or_default()
                .join(start_path),
        }
    }
}

/// Discover manifests in directory tree (walking up parents).
fn discover_in_tree(start_path: &Path, options: &DiscoveryOptions) -> crate::Result<Vec<EnvSpec>> {
    let start = resolve_start_path(start_path);
    let mut specs = Vec::new();
    let mut current = start.clone();

    let start_spec_path = current.join(SHELLENV_FILENAME);
    if start_spec_path.is_file() {
        let spec = load_validated(&start_spec_path)?;
        let should_inherit = if options.force_inherit {
            true
        } else if options.no_inherit {
            false
        } else {
            spec.inherit
        };
        specs.push(spec);

        if !should_inherit {
            return Ok(specs);
        }
    } else if options.no_inherit {
        return Err(crate::Error::NotFoundAtPath(current));
    }

    // Walk up directory tree
    while current.pop() {
        let spec_path = current.join(SHELLENV_FILENAME);

        if spec_path.is_file() {
            let spec = load_validated(&spec_path)?;
            let inherit = spec.inherit;
            specs.insert(0, spec); // Parents go first

            if !inherit {
                break;
            }
        }
    }

    if specs.is_empty() {
        return Err(crate::Error::NotFoundInTree(start));
    }

    Ok(specs)
}

/// Recursively resolve all includes; included manifests precede the includer.
fn resolve_all_includes(
    specs: Vec<EnvSpec>,
    tracker: &mut IncludeTracker,
) -> crate::Result<Vec<EnvSpec>> {
    let mut result = Vec::new();

    for spec in specs {
        if let Some(path) = &spec.source_path {
            if let Ok(canonical) = dunce::canonicalize(path) {
                tracker.seen.insert(canonical);
            }
        }

        for include_path in &spec.includes {
            let base_dir = spec.source_path.as_ref().and_then(|p| p.parent());
            let include_spec = tracker.load(include_path, base_dir)?;
            let nested = resolve_all_includes(vec![include_spec], tracker)?;
            result.extend(nested);
        }

        result.push(spec);
    }

    Ok(result)
}
