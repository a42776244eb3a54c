// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Package requests, resolved dependencies and the prefix-based resolver.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./package_test.rs"]
mod package_test;

/// What a requested package is expected to contribute.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Native libraries (and possibly executables).
    #[default]
    Library,
    /// Executables only; never contributes to the library search path.
    Tool,
}

/// A package entry from the `packages:` list of a manifest.
///
/// Accepts either a bare name or a mapping:
///
/// ```yaml
/// packages:
///   - openssl
///   - name: protobuf
///     kind: tool
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub kind: PackageKind,
}

impl PackageRequest {
    pub fn library<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            version: None,
            kind: PackageKind::Library,
        }
    }

    pub fn tool<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            version: None,
            kind: PackageKind::Tool,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PackageEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        kind: PackageKind,
    },
}

impl<'de> Deserialize<'de> for PackageRequest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match PackageEntry::deserialize(deserializer)? {
            PackageEntry::Name(name) => PackageRequest::library(name),
            PackageEntry::Detailed {
                name,
                version,
                kind,
            } => PackageRequest {
                name,
                version,
                kind,
            },
        })
    }
}

/// Role of a dependency within the session.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Toolchain,
    Library,
    Tool,
}

/// A resolved package with its filesystem locations.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub kind: DependencyKind,
    /// Directory holding the dependency's executables, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
    /// Library directories, in search order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lib_dirs: Vec<PathBuf>,
    /// Whether the resolver claims this dependency ships native libraries.
    pub provides_libraries: bool,
}

impl Dependency {
    /// A library-bearing dependency with a single library directory.
    pub fn library<S: Into<String>, P: Into<PathBuf>>(name: S, lib_dir: P) -> Self {
        Self {
            name: name.into(),
            kind: DependencyKind::Library,
            bin_dir: None,
            lib_dirs: vec![lib_dir.into()],
            provides_libraries: true,
        }
    }

    /// An executable-only dependency.
    pub fn tool<S: Into<String>, P: Into<PathBuf>>(name: S, bin_dir: P) -> Self {
        Self {
            name: name.into(),
            kind: DependencyKind::Tool,
            bin_dir: Some(bin_dir.into()),
            lib_dirs: Vec::new(),
            provides_libraries: false,
        }
    }

    pub fn with_bin_dir<P: Into<PathBuf>>(mut self, bin_dir: P) -> Self {
        self.bin_dir = Some(bin_dir.into());
        self
    }
}

/// Turns package requests into resolved dependencies.
pub trait PackageResolver {
    fn resolve(&self, request: &PackageRequest) -> Result<Dependency>;
}

/// Resolves packages from installation prefixes laid out as
/// `<root>/<name>` or `<root>/<name>-<version>`, each with `bin/` and `lib/`.
#[derive(Debug, Clone, Default)]
pub struct PrefixResolver {
    roots: Vec<PathBuf>,
}

impl PrefixResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Locate the installation prefix for a request, searching roots in order.
    pub fn find_prefix(&self, request: &PackageRequest) -> Result<Option<PathBuf>> {
        for root in &self.roots {
            if !root.is_dir() {
                tracing::debug!(root = %root.display(), "skipping missing package root");
                continue;
            }

            if let Some(version) = &request.version {
                let candidate = root.join(format!("{}-{}", request.name, version));
                if candidate.is_dir() {
                    return Ok(Some(candidate));
                }
                continue;
            }

            let exact = root.join(&request.name);
            if exact.is_dir() {
                return Ok(Some(exact));
            }

            if let Some(found) = latest_versioned(root, &request.name)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// One `.`/`-` separated component of a version string. Text sorts below
/// numbers, so `1.2-rc1` < `1.2-1`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum VersionPart {
    Text(String),
    Number(u64),
}

/// Sort key comparing numeric components as integers, so `1.10` > `1.9`.
fn version_key(version: &str) -> Vec<VersionPart> {
    version
        .split(['.', '-'])
        .map(|part| match part.parse() {
            Ok(n) => VersionPart::Number(n),
            Err(_) => VersionPart::Text(part.to_string()),
        })
        .collect()
}

/// Pick the highest `<name>-<digit>...` directory, comparing versions
/// component-wise.
fn latest_versioned(root: &Path, name: &str) -> Result<Option<PathBuf>> {
    let prefix = format!("{name}-");
    let mut latest: Option<(Vec<VersionPart>, PathBuf)> = None;
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(version) = file_name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
            continue;
        };
        if !version.starts_with(|c: char| c.is_ascii_digit()) || !entry.path().is_dir() {
            continue;
        }
        let key = version_key(version);
        if latest.as_ref().is_none_or(|(best, _)| key > *best) {
            latest = Some((key, entry.path()));
        }
    }
    Ok(latest.map(|(_, path)| path))
}

impl PackageResolver for PrefixResolver {
    fn resolve(&self, request: &PackageRequest) -> Result<Dependency> {
        let prefix = self
            .find_prefix(request)?
            .ok_or_else(|| Error::PackageNotFound {
                name: request.name.clone(),
                searched: self.roots.clone(),
            })?;

        let bin_dir = Some(prefix.join("bin")).filter(|p| p.is_dir());
        let (kind, lib_dirs, provides_libraries) = match request.kind {
            PackageKind::Library => {
                let lib_dirs: Vec<PathBuf> = ["lib", "lib64"]
                    .iter()
                    .map(|d| prefix.join(d))
                    .filter(|p| p.is_dir())
                    .collect();
                (DependencyKind::Library, lib_dirs, true)
            }
            PackageKind::Tool => (DependencyKind::Tool, Vec::new(), false),
        };

        tracing::debug!(
            package = %request.name,
            prefix = %prefix.display(),
            lib_dirs = lib_dirs.len(),
            "resolved package"
        );

        Ok(Dependency {
            name: request.name.clone(),
            kind,
            bin_dir,
            lib_dirs,
            provides_libraries,
        })
    }
}
