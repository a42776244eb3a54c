// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::environment::{BACKTRACE_VAR, LIBRARY_PATH_VAR, PATH_LIST_SEPARATOR};
use crate::package::{PackageRequest, PrefixResolver};
use crate::spec::ToolchainDecl;
use crate::toolchain::ToolchainRelease;
use crate::DependencyKind;

/// A package resolver that hands out fixed dependencies by name.
struct MapResolver(BTreeMap<String, Dependency>);

impl PackageResolver for MapResolver {
    fn resolve(&self, request: &PackageRequest) -> Result<Dependency> {
        self.0
            .get(&request.name)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound {
                name: request.name.clone(),
                searched: Vec::new(),
            })
    }
}

#[fixture]
fn releases() -> Vec<ToolchainRelease> {
    vec![ToolchainRelease::new("1.81", "/t")
        .offering("clippy")
        .offering("rust-src")]
}

#[fixture]
fn resolver() -> MapResolver {
    MapResolver(BTreeMap::from([
        (
            "openssl".to_string(),
            Dependency::library("openssl", "/lib/ssl"),
        ),
        ("alsa".to_string(), Dependency::library("alsa", "/lib/alsa")),
        (
            "protobuf".to_string(),
            Dependency::tool("protobuf", "/pkgs/protobuf/bin"),
        ),
    ]))
}

fn composed(channel: Option<&str>, extensions: &[&str], packages: &[&str]) -> ComposedSpec {
    ComposedSpec {
        toolchain: channel.map(|c| ToolchainDecl {
            channel: Some(c.to_string()),
            ..Default::default()
        }),
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
        packages: packages.iter().map(|p| PackageRequest::library(*p)).collect(),
        ..Default::default()
    }
}

#[rstest]
fn test_activate_example(releases: Vec<ToolchainRelease>, resolver: MapResolver) {
    let spec = composed(Some("1.81"), &["clippy"], &["openssl", "alsa"]);
    let activation = activate(&spec, &releases, &resolver).expect("Should activate");

    assert_eq!(activation.dependencies.len(), 3);
    assert_eq!(activation.dependencies[0].kind, DependencyKind::Toolchain);
    assert_eq!(
        activation.environment.library_path,
        ["/lib/ssl", "/lib/alsa"].join(PATH_LIST_SEPARATOR)
    );
    assert_eq!(activation.environment.path, vec![PathBuf::from("/t/bin")]);
    assert_eq!(activation.environment.vars[BACKTRACE_VAR], "1");
}

#[rstest]
fn test_activate_without_toolchain(releases: Vec<ToolchainRelease>, resolver: MapResolver) {
    let spec = composed(None, &[], &["protobuf"]);
    let activation = activate(&spec, &releases, &resolver).unwrap();

    assert!(activation.toolchain.is_none());
    assert_eq!(activation.environment.library_path, "");
    assert_eq!(
        activation.environment.path,
        vec![PathBuf::from("/pkgs/protobuf/bin")]
    );
}

#[rstest]
fn test_activate_unsupported_extension(releases: Vec<ToolchainRelease>, resolver: MapResolver) {
    let spec = composed(Some("1.81"), &["clippy", "ghost"], &[]);
    match activate(&spec, &releases, &resolver) {
        Err(Error::UnsupportedExtension { extension, .. }) => assert_eq!(extension, "ghost"),
        other => panic!("Expected UnsupportedExtension, got: {:?}", other),
    }
}

#[rstest]
fn test_extensions_without_toolchain(releases: Vec<ToolchainRelease>, resolver: MapResolver) {
    let spec = composed(None, &["clippy"], &[]);
    assert!(matches!(
        activate(&spec, &releases, &resolver),
        Err(Error::ValidationFailed(_))
    ));
}

#[rstest]
fn test_activate_is_all_or_nothing(releases: Vec<ToolchainRelease>, resolver: MapResolver) {
    let spec = composed(Some("1.81"), &[], &["openssl", "libxkbcommon"]);
    assert!(matches!(
        activate(&spec, &releases, &resolver),
        Err(Error::PackageNotFound { .. })
    ));
}

#[rstest]
fn test_manifest_env_overrides_defaults() {
    let mut spec = composed(None, &[], &[]);
    spec.env.insert(BACKTRACE_VAR.to_string(), "0".to_string());
    spec.env.insert("WGPU_BACKEND".to_string(), "vulkan".to_string());

    let vars = fixed_vars(&spec);
    assert_eq!(vars[BACKTRACE_VAR], "0");
    assert_eq!(vars["WGPU_BACKEND"], "vulkan");
}

#[rstest]
fn test_toolchain_request_from_file() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("rust-toolchain.toml"),
        "[toolchain]\nchannel = \"1.81\"\ncomponents = [\"rustfmt\"]\n",
    )
    .unwrap();

    let mut spec = composed(None, &["rust-src"], &[]);
    spec.toolchain = Some(ToolchainDecl {
        file: Some("rust-toolchain.toml".to_string()),
        base_dir: Some(tmp.path().to_path_buf()),
        ..Default::default()
    });

    let request = toolchain_request(&spec).unwrap().expect("Should have request");
    assert_eq!(request.channel, "1.81");
    assert!(request.extensions.contains("rustfmt"));
    assert!(request.extensions.contains("rust-src"));
}

fn install(root: &Path, rel: &str) {
    std::fs::create_dir_all(root.join(rel)).unwrap();
}

#[rstest]
fn test_activate_from_disk() {
    let tmp = TempDir::new().unwrap();
    let toolchains = tmp.path().join("toolchains");
    let packages = tmp.path().join("packages");
    install(&toolchains, "1.81-x86_64-unknown-linux-gnu/bin");
    install(&toolchains, "1.81-x86_64-unknown-linux-gnu/lib/rustlib");
    std::fs::write(
        toolchains.join("1.81-x86_64-unknown-linux-gnu/lib/rustlib/components"),
        "rustc-x86_64-unknown-linux-gnu\nclippy-preview-x86_64-unknown-linux-gnu\n",
    )
    .unwrap();
    install(&packages, "openssl/lib");
    install(&packages, "wayland-1.22/lib");

    let spec = composed(Some("1.81"), &["clippy"], &["openssl", "wayland"]);
    let activation = activate(
        &spec,
        &crate::DirectoryToolchains::new(&toolchains),
        &PrefixResolver::new(vec![packages.clone()]),
    )
    .expect("Should activate");

    let expected = [
        packages.join("openssl/lib").display().to_string(),
        packages.join("wayland-1.22/lib").display().to_string(),
    ]
    .join(PATH_LIST_SEPARATOR);
    assert_eq!(activation.environment.library_path, expected);

    let vars = activation.environment.to_vars();
    assert_eq!(vars[LIBRARY_PATH_VAR], expected);
}

#[rstest]
fn test_command_carries_environment(releases: Vec<ToolchainRelease>, resolver: MapResolver) {
    let spec = composed(Some("1.81"), &[], &["openssl"]);
    let activation = activate(&spec, &releases, &resolver).unwrap();
    let cmd = activation.command("cargo", ["build"]).unwrap();

    let envs: BTreeMap<_, _> = cmd
        .get_envs()
        .map(|(k, v)| (k.to_owned(), v.map(|v| v.to_owned())))
        .collect();
    assert_eq!(
        envs[std::ffi::OsStr::new(LIBRARY_PATH_VAR)].as_deref(),
        Some(std::ffi::OsStr::new("/lib/ssl"))
    );
    assert!(envs.contains_key(std::ffi::OsStr::new(BACKTRACE_VAR)));
}
