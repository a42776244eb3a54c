// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Toolchain declaration files, release sources and resolution.
//!
//! A toolchain is pinned by a channel identifier, either inline in the
//! manifest or through a `rust-toolchain.toml` file:
//!
//! ```toml
//! [toolchain]
//! channel = "1.81"
//! components = ["rustfmt"]
//! ```
//!
//! Resolution matches the channel against the releases a
//! [`ToolchainSource`] offers and grants the requested extensions, failing
//! on the first one the release does not ship.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::package::{Dependency, DependencyKind};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./toolchain_test.rs"]
mod toolchain_test;

/// Per-target library directory inside a toolchain.
const RUSTLIB_DIR: &str = "lib/rustlib";

/// Location of the installed component list inside a toolchain directory.
const COMPONENTS_FILE: &str = "lib/rustlib/components";

/// Name of the compiler executable.
const COMPILER: &str = "rustc";

/// Leading target-triple tokens used to strip host suffixes from component names.
const ARCH_PREFIXES: &[&str] = &[
    "x86_64", "aarch64", "i686", "i586", "arm", "thumb", "wasm", "riscv", "powerpc", "s390x",
    "mips", "loongarch", "sparc",
];

/// Contents of a `rust-toolchain.toml` or legacy `rust-toolchain` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainFile {
    pub channel: String,
    pub components: Vec<String>,
    pub targets: Vec<String>,
}

#[derive(Deserialize)]
struct ToolchainToml {
    toolchain: ToolchainSection,
}

#[derive(Deserialize)]
struct ToolchainSection {
    channel: String,
    #[serde(default)]
    components: Vec<String>,
    #[serde(default)]
    targets: Vec<String>,
}

impl ToolchainFile {
    /// Parse declaration file content. `path` is only used for diagnostics.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut lines = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        if let (Some(line), None) = (lines.next(), lines.next()) {
            if !line.contains(['=', '[']) {
                return Ok(Self {
                    channel: line.to_string(),
                    ..Default::default()
                });
            }
        }

        let parsed: ToolchainToml = toml::from_str(content).map_err(|e| Error::InvalidToml {
            path: path.to_path_buf(),
            error: e,
        })?;
        let section = parsed.toolchain;
        if section.channel.trim().is_empty() {
            return Err(Error::ValidationFailed(format!(
                "{}: toolchain channel must not be empty",
                path.display()
            )));
        }

        Ok(Self {
            channel: section.channel,
            components: section.components,
            targets: section.targets,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;
        Self::parse(path, &content)
    }
}

/// A toolchain identifier plus the extensions requested on top of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolchainRequest {
    pub channel: String,
    pub extensions: BTreeSet<String>,
    /// Cross-compilation targets expected to be installed.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub targets: BTreeSet<String>,
}

impl ToolchainRequest {
    pub fn new<S: Into<String>>(channel: S) -> Self {
        Self {
            channel: channel.into(),
            extensions: BTreeSet::new(),
            targets: BTreeSet::new(),
        }
    }

    /// Start from a declaration file; its components become extensions.
    pub fn from_file(file: &ToolchainFile) -> Self {
        let mut request =
            Self::new(file.channel.clone()).with_extensions(file.components.iter().cloned());
        request.targets.extend(file.targets.iter().cloned());
        request
    }

    pub fn with_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extensions.insert(extension.into());
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(extensions.into_iter().map(Into::into));
        self
    }
}

/// An installed toolchain release and the extensions it offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainRelease {
    pub id: String,
    pub root: PathBuf,
    /// Offered extensions, mapped to the executable each one ships (if any).
    pub extensions: BTreeMap<String, Option<String>>,
}

impl ToolchainRelease {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(id: S, root: P) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
            extensions: BTreeMap::new(),
        }
    }

    /// Offer an extension, using the well-known executable for its name.
    pub fn offering<S: Into<String>>(mut self, extension: S) -> Self {
        let extension = extension.into();
        let executable = extension_executable(&extension).map(String::from);
        self.extensions.insert(extension, executable);
        self
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn offers(&self, extension: &str) -> bool {
        self.extensions.contains_key(extension)
    }
}

/// Executable shipped by a known extension.
pub fn extension_executable(extension: &str) -> Option<&'static str> {
    match extension {
        "cargo" => Some("cargo"),
        "clippy" => Some("cargo-clippy"),
        "rustfmt" => Some("rustfmt"),
        "rust-analyzer" => Some("rust-analyzer"),
        "miri" => Some("cargo-miri"),
        _ => None,
    }
}

/// Somewhere toolchain releases can be looked up.
pub trait ToolchainSource {
    /// Every release this source can offer, sorted by id.
    fn releases(&self) -> Result<Vec<ToolchainRelease>>;

    /// The release matching `id`, if any.
    fn find_release(&self, id: &str) -> Result<Option<ToolchainRelease>> {
        Ok(self.releases()?.into_iter().find(|r| r.id == id))
    }
}

impl ToolchainSource for Vec<ToolchainRelease> {
    fn releases(&self) -> Result<Vec<ToolchainRelease>> {
        let mut releases = self.clone();
        releases.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(releases)
    }
}

/// Toolchains installed as subdirectories of a single root, the way
/// rustup lays out `~/.rustup/toolchains`.
#[derive(Debug, Clone)]
pub struct DirectoryToolchains {
    root: PathBuf,
}

impl DirectoryToolchains {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn release_names(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            tracing::debug!(root = %self.root.display(), "toolchain directory does not exist");
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_release(&self, name: &str) -> Result<ToolchainRelease> {
        let root = self.root.join(name);
        let components_path = root.join(COMPONENTS_FILE);
        let mut release = ToolchainRelease::new(name, &root);

        match std::fs::read_to_string(&components_path) {
            Ok(content) => {
                for line in content.lines() {
                    if let Some(extension) = normalize_component(line) {
                        release = release.offering(extension);
                    }
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    toolchain = name,
                    "no component list found, toolchain offers no extensions"
                );
            }
            Err(error) => {
                return Err(Error::ReadFailed {
                    path: components_path,
                    error,
                });
            }
        }
        Ok(release)
    }
}

impl ToolchainSource for DirectoryToolchains {
    fn releases(&self) -> Result<Vec<ToolchainRelease>> {
        self.release_names()?
            .iter()
            .map(|name| self.load_release(name))
            .collect()
    }

    fn find_release(&self, id: &str) -> Result<Option<ToolchainRelease>> {
        let names = self.release_names()?;
        let prefix = format!("{id}-");
        let found = names
            .iter()
            .find(|n| n.as_str() == id)
            .or_else(|| {
                names
                    .iter()
                    .find(|n| n.strip_prefix(prefix.as_str()).is_some_and(is_host_triple))
            })
            .or_else(|| names.iter().find(|n| n.starts_with(&prefix)));
        found.map(|name| self.load_release(name)).transpose()
    }
}

/// Whether `s` starts with a target triple, e.g. `x86_64-unknown-linux-gnu`.
fn is_host_triple(s: &str) -> bool {
    ARCH_PREFIXES.iter().any(|arch| s.starts_with(arch))
}

/// Reduce an installed component entry such as
/// `clippy-preview-x86_64-unknown-linux-gnu` to its extension name.
fn normalize_component(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut name = line;
    let mut offset = 0;
    while let Some(pos) = line[offset..].find('-') {
        let split = offset + pos;
        let rest = &line[split + 1..];
        if is_host_triple(rest) {
            name = &line[..split];
            break;
        }
        offset = split + 1;
    }

    let name = name.strip_suffix("-preview").unwrap_or(name);
    if name == COMPILER {
        return None;
    }
    Some(name.to_string())
}

/// A resolved toolchain with its granted extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    /// The release that matched, e.g. `1.81-x86_64-unknown-linux-gnu`.
    pub id: String,
    /// The requested identifier.
    pub channel: String,
    pub root: PathBuf,
    pub compiler: PathBuf,
    pub extensions: BTreeSet<String>,
    /// Executables contributed by granted extensions.
    pub executables: BTreeMap<String, PathBuf>,
    pub targets: BTreeSet<String>,
}

impl Toolchain {
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Standard library directory installed for a cross-compilation target.
    pub fn target_dir(&self, target: &str) -> PathBuf {
        self.root.join(RUSTLIB_DIR).join(target)
    }

    /// The toolchain as an executable-only member of the dependency set.
    pub fn to_dependency(&self) -> Dependency {
        Dependency {
            name: format!("toolchain-{}", self.channel),
            kind: DependencyKind::Toolchain,
            bin_dir: Some(self.bin_dir()),
            lib_dirs: Vec::new(),
            provides_libraries: false,
        }
    }
}

fn executable_path(bin_dir: &Path, name: &str) -> PathBuf {
    bin_dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
}

/// Resolve a toolchain request against a release source.
pub fn resolve(request: &ToolchainRequest, source: &dyn ToolchainSource) -> Result<Toolchain> {
    let release = match source.find_release(&request.channel)? {
        Some(release) => release,
        None => {
            let available = source.releases()?.into_iter().map(|r| r.id).collect();
            return Err(Error::ToolchainNotFound {
                id: request.channel.clone(),
                available,
            });
        }
    };

    if let Some(unsupported) = request.extensions.iter().find(|e| !release.offers(e)) {
        return Err(Error::UnsupportedExtension {
            extension: unsupported.clone(),
            toolchain: release.id.clone(),
            offered: release.extensions.keys().cloned().collect(),
        });
    }

    let bin_dir = release.bin_dir();
    let executables = request
        .extensions
        .iter()
        .filter_map(|ext| {
            release
                .extensions
                .get(ext)
                .and_then(Option::as_deref)
                .map(|exe| (ext.clone(), executable_path(&bin_dir, exe)))
        })
        .collect();

    tracing::debug!(
        toolchain = %release.id,
        extensions = ?request.extensions,
        "resolved toolchain"
    );

    Ok(Toolchain {
        id: release.id.clone(),
        channel: request.channel.clone(),
        compiler: executable_path(&bin_dir, COMPILER),
        root: release.root,
        extensions: request.extensions.clone(),
        executables,
        targets: request.targets.clone(),
    })
}
