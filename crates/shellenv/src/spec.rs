// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Manifest parsing and data types for .shellenv.yaml files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ResolverOptions;
use crate::package::PackageRequest;

#[cfg(test)]
#[path = "./spec_test.rs"]
mod spec_test;

/// API version for manifest files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "shellenv/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// Toolchain selection and extension overrides.
///
/// Exactly one of `file` or `channel` must be given. Extensions listed here
/// are added to whatever the declaration file already requests.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolchainDecl {
    /// Path to a `rust-toolchain.toml` (or legacy `rust-toolchain`) file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Inline toolchain identifier, e.g. `1.81` or `nightly-2024-05-01`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Extra extensions to request on top of the base declaration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,

    /// Directory of the manifest that declared this (not serialized).
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl ToolchainDecl {
    /// Resolve the declaration file against the declaring manifest.
    pub fn file_path(&self) -> crate::Result<Option<PathBuf>> {
        self.file
            .as_deref()
            .map(|f| resolve_path(f, self.base_dir.as_deref()))
            .transpose()
    }
}

/// Main environment manifest from a .shellenv.yaml file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnvSpec {
    /// API version identifier.
    pub api: ApiVersion,

    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// In-tree inheritance control.
    /// When false (default), stops walking up directory tree.
    #[serde(default)]
    pub inherit: bool,

    /// Out-of-tree includes loaded before this manifest.
    /// Can use absolute paths, home-relative (~/) paths, or relative paths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    /// Toolchain pin and extension requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<ToolchainDecl>,

    /// Native libraries and tools, in search path order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageRequest>,

    /// Fixed environment variables exported into the session.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Where packages and toolchains are looked up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<ResolverOptions>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl EnvSpec {
    /// Parse manifest from YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value =
            serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        // Stage 2: Deserialize based on version
        match with_version.api {
            ApiVersion::V0 => {
                serde_yaml::from_value(value).map_err(|e| crate::Error::InvalidYaml {
                    error: e,
                    yaml_content: yaml,
                })
            }
        }
    }

    /// Load manifest from file path.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;

        let mut spec = Self::from_yaml(yaml)?;
        spec.source_path = Some(path.to_path_buf());

        let base_dir = path.parent().map(Path::to_path_buf);
        if let Some(toolchain) = spec.toolchain.as_mut() {
            toolchain.base_dir = base_dir.clone();
        }
        if let Some(resolver) = spec.resolver.as_mut() {
            resolver.base_dir = base_dir;
        }

        tracing::debug!(path = %path.display(), "loaded manifest");
        Ok(spec)
    }

    /// Validate manifest after loading.
    pub fn validate(&self) -> crate::Result<()> {
        if self.source_path.is_none() {
            return Err(crate::Error::ValidationFailed(
                "source_path must be set".to_string(),
            ));
        }

        if let Some(toolchain) = &self.toolchain {
            match (&toolchain.file, &toolchain.channel) {
                (Some(_), Some(_)) => {
                    return Err(crate::Error::ValidationFailed(
                        "toolchain: 'file' and 'channel' are mutually exclusive".to_string(),
                    ));
                }
                (None, None) if toolchain.extensions.is_empty() => {
                    return Err(crate::Error::ValidationFailed(
                        "toolchain: one of 'file' or 'channel' is required".to_string(),
                    ));
                }
                _ => {}
            }
        }

        if let Some(pkg) = self.packages.iter().find(|p| p.name.trim().is_empty()) {
            return Err(crate::Error::ValidationFailed(format!(
                "package name must not be empty (version: {:?})",
                pkg.version
            )));
        }

        for key in self.env.keys() {
            if crate::environment::is_derived_variable(key) {
                return Err(crate::Error::ReservedVariable(key.clone()));
            }
            if !is_variable_name(key) {
                return Err(crate::Error::ValidationFailed(format!(
                    "invalid environment variable name: {key:?}"
                )));
            }
        }

        Ok(())
    }

    /// Resolve relative includes to absolute paths.
    pub fn resolve_includes(&self) -> crate::Result<Vec<PathBuf>> {
        let base_dir = self
            .source_path
            .as_ref()
            .and_then(|p| p.parent())
            .ok_or_else(|| {
                crate::Error::ValidationFailed(
                    "Cannot resolve includes without source_path".to_string(),
                )
            })?;

        let mut resolved = Vec::new();
        for include in &self.includes {
            let path = resolve_path(include, Some(base_dir))?;
            let canonical =
                dunce::canonicalize(&path).map_err(|e| crate::Error::IncludeNotFound {
                    path: path.clone(),
                    error: e,
                })?;
            resolved.push(canonical);
        }

        Ok(resolved)
    }
}

fn is_variable_name(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Expand a home-relative, absolute or relative path.
///
/// Relative paths require a base directory. The result is not canonicalized.
pub fn resolve_path(raw: &str, base_dir: Option<&Path>) -> crate::Result<PathBuf> {
    if raw.starts_with('~') {
        let home = dirs::home_dir().ok_or_else(|| {
            crate::Error::ValidationFailed("Cannot resolve ~ without HOME".to_string())
        })?;
        let rel = raw.strip_prefix("~/").unwrap_or(raw.trim_start_matches('~'));
        Ok(home.join(rel))
    } else if Path::new(raw).is_absolute() {
        Ok(PathBuf::from(raw))
    } else {
        let base = base_dir.ok_or_else(|| {
            crate::Error::ValidationFailed(format!(
                "Cannot resolve relative path '{raw}' without base directory"
            ))
        })?;
        Ok(base.join(raw))
    }
}
