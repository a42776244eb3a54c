// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn install(root: &Path, dir: &str, subdirs: &[&str]) -> PathBuf {
    let prefix = root.join(dir);
    std::fs::create_dir_all(&prefix).unwrap();
    for sub in subdirs {
        std::fs::create_dir_all(prefix.join(sub)).unwrap();
    }
    prefix
}

#[rstest]
fn test_parse_package_entries() {
    let yaml = r#"
- openssl
- name: protobuf
  kind: tool
- name: alsa-lib
  version: "1.2.11"
"#;
    let requests: Vec<PackageRequest> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(requests[0], PackageRequest::library("openssl"));
    assert_eq!(requests[1], PackageRequest::tool("protobuf"));
    assert_eq!(requests[2].version.as_deref(), Some("1.2.11"));
    assert_eq!(requests[2].kind, PackageKind::Library);
}

#[rstest]
fn test_resolve_library_prefix() {
    let tmp = TempDir::new().unwrap();
    let prefix = install(tmp.path(), "openssl", &["bin", "lib", "lib64"]);

    let resolver = PrefixResolver::new(vec![tmp.path().to_path_buf()]);
    let dep = resolver
        .resolve(&PackageRequest::library("openssl"))
        .expect("Should resolve");

    assert_eq!(dep.kind, DependencyKind::Library);
    assert_eq!(dep.bin_dir, Some(prefix.join("bin")));
    assert_eq!(dep.lib_dirs, vec![prefix.join("lib"), prefix.join("lib64")]);
    assert!(dep.provides_libraries);
}

#[rstest]
fn test_resolve_tool_ignores_libraries() {
    let tmp = TempDir::new().unwrap();
    let prefix = install(tmp.path(), "protobuf", &["bin", "lib"]);

    let resolver = PrefixResolver::new(vec![tmp.path().to_path_buf()]);
    let dep = resolver.resolve(&PackageRequest::tool("protobuf")).unwrap();

    assert_eq!(dep.kind, DependencyKind::Tool);
    assert_eq!(dep.bin_dir, Some(prefix.join("bin")));
    assert!(dep.lib_dirs.is_empty());
    assert!(!dep.provides_libraries);
}

#[rstest]
fn test_library_without_lib_dir_claims_libraries() {
    let tmp = TempDir::new().unwrap();
    install(tmp.path(), "fontconfig", &["bin"]);

    let resolver = PrefixResolver::new(vec![tmp.path().to_path_buf()]);
    let dep = resolver
        .resolve(&PackageRequest::library("fontconfig"))
        .unwrap();

    assert!(dep.provides_libraries);
    assert!(dep.lib_dirs.is_empty());
}

#[rstest]
fn test_roots_are_searched_in_order() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    install(second.path(), "wayland", &["lib"]);
    let preferred = install(first.path(), "wayland", &["lib"]);

    let resolver = PrefixResolver::new(vec![
        first.path().join("missing-root"),
        first.path().to_path_buf(),
        second.path().to_path_buf(),
    ]);
    let dep = resolver.resolve(&PackageRequest::library("wayland")).unwrap();
    assert_eq!(dep.lib_dirs, vec![preferred.join("lib")]);
}

#[rstest]
#[case("1.2.10", "1.2.11")]
#[case("1.2.10", "1.9")]
#[case("1.9", "1.10")]
#[case("1.2.9", "1.2.10")]
#[case("1.2.10-rc1", "1.2.10-1")]
fn test_versioned_prefixes(#[case] older: &str, #[case] newer: &str) {
    let tmp = TempDir::new().unwrap();
    install(tmp.path(), &format!("alsa-lib-{older}"), &["lib"]);
    let newest = install(tmp.path(), &format!("alsa-lib-{newer}"), &["lib"]);
    // Not a version of alsa-lib
    install(tmp.path(), "alsa-lib-devel", &["lib"]);

    let resolver = PrefixResolver::new(vec![tmp.path().to_path_buf()]);

    let latest = resolver
        .find_prefix(&PackageRequest::library("alsa-lib"))
        .unwrap();
    assert_eq!(latest, Some(newest));

    let pinned = PackageRequest {
        version: Some(older.to_string()),
        ..PackageRequest::library("alsa-lib")
    };
    let found = resolver.find_prefix(&pinned).unwrap();
    assert_eq!(found, Some(tmp.path().join(format!("alsa-lib-{older}"))));

    let missing = PackageRequest {
        version: Some("2.0".to_string()),
        ..PackageRequest::library("alsa-lib")
    };
    assert_eq!(resolver.find_prefix(&missing).unwrap(), None);
}

#[rstest]
fn test_package_not_found() {
    let tmp = TempDir::new().unwrap();
    let resolver = PrefixResolver::new(vec![tmp.path().to_path_buf()]);

    match resolver.resolve(&PackageRequest::library("libxkbcommon")) {
        Err(Error::PackageNotFound { name, searched }) => {
            assert_eq!(name, "libxkbcommon");
            assert_eq!(searched, vec![tmp.path().to_path_buf()]);
        }
        other => panic!("Expected PackageNotFound, got: {:?}", other),
    }
}
