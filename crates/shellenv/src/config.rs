// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Resolver configuration: where toolchains and packages are looked up.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::spec::resolve_path;

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// The `resolver:` section of a manifest.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResolverOptions {
    /// Directory holding one subdirectory per installed toolchain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchains: Option<String>,

    /// Package installation roots, searched in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_roots: Vec<String>,

    /// Directory of the manifest that declared this (not serialized).
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Effective resolver locations for one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub toolchains_dir: PathBuf,
    pub package_roots: Vec<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_default();
        let mut package_roots = Vec::new();
        if let Some(data) = dirs::data_dir() {
            package_roots.push(data.join("shellenv").join("packages"));
        }
        package_roots.push(PathBuf::from("/opt/shellenv/packages"));

        Self {
            toolchains_dir: home.join(".rustup").join("toolchains"),
            package_roots,
        }
    }
}

impl ResolverConfig {
    /// Layer a manifest `resolver:` section over this configuration.
    pub fn with_options(mut self, options: &ResolverOptions) -> crate::Result<Self> {
        let base = options.base_dir.as_deref();
        if let Some(toolchains) = &options.toolchains {
            self.toolchains_dir = resolve_path(toolchains, base)?;
        }
        if !options.package_roots.is_empty() {
            self.package_roots = options
                .package_roots
                .iter()
                .map(|r| resolve_path(r, base))
                .collect::<crate::Result<_>>()?;
        }
        Ok(self)
    }

    /// Override locations given explicitly by the caller (CLI flags or
    /// their environment fallbacks). Empty values keep the current ones.
    pub fn with_overrides(mut self, toolchains: Option<&Path>, package_roots: &[PathBuf]) -> Self {
        if let Some(dir) = toolchains.filter(|d| !d.as_os_str().is_empty()) {
            self.toolchains_dir = dir.to_path_buf();
        }
        let roots: Vec<PathBuf> = package_roots
            .iter()
            .filter(|r| !r.as_os_str().is_empty())
            .cloned()
            .collect();
        if !roots.is_empty() {
            self.package_roots = roots;
        }
        self
    }

    /// Build the configuration from defaults and the manifest, in increasing
    /// precedence.
    pub fn load(options: Option<&ResolverOptions>) -> crate::Result<Self> {
        match options {
            Some(options) => Self::default().with_options(options),
            None => Ok(Self::default()),
        }
    }
}
