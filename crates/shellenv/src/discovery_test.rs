// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn create_spec_file(dir: &Path, content: &str) {
    let path = dir.join(SHELLENV_FILENAME);
    std::fs::write(path, content).expect("Failed to write manifest file");
}

fn names(spec: &EnvSpec) -> Vec<&str> {
    spec.packages.iter().map(|p| p.name.as_str()).collect()
}

#[rstest]
fn test_discover_single_spec() {
    let tmp = TempDir::new().unwrap();
    create_spec_file(
        tmp.path(),
        r#"
api: shellenv/v0
packages:
  - openssl
"#,
    );

    let options = DiscoveryOptions::default();
    let specs = discover_specs(tmp.path(), &options).expect("Should discover manifest");

    assert_eq!(specs.len(), 1);
    assert_eq!(names(&specs[0]), vec!["openssl"]);
}

#[rstest]
fn test_inherit_false_stops_discovery() {
    let tmp = TempDir::new().unwrap();
    let child = tmp.path().join("child");
    std::fs::create_dir(&child).unwrap();

    create_spec_file(
        tmp.path(),
        r#"
api: shellenv/v0
packages:
  - parent-lib
"#,
    );
    create_spec_file(
        &child,
        r#"
api: shellenv/v0
packages:
  - child-lib
"#,
    );

    let specs = discover_specs(&child, &DiscoveryOptions::default()).expect("Should discover");

    // Should only find child manifest since inherit defaults to false
    assert_eq!(specs.len(), 1);
    assert_eq!(names(&specs[0]), vec!["child-lib"]);
}

#[rstest]
fn test_inherit_true_walks_up() {
    let tmp = TempDir::new().unwrap();
    let child = tmp.path().join("child");
    std::fs::create_dir(&child).unwrap();

    create_spec_file(
        tmp.path(),
        r#"
api: shellenv/v0
packages:
  - parent-lib
"#,
    );
    create_spec_file(
        &child,
        r#"
api: shellenv/v0
inherit: true
packages:
  - child-lib
"#,
    );

    let specs = discover_specs(&child, &DiscoveryOptions::default()).expect("Should discover");

    // Parent comes first in composition order
    assert_eq!(specs.len(), 2);
    assert_eq!(names(&specs[0]), vec!["parent-lib"]);
    assert_eq!(names(&specs[1]), vec!["child-lib"]);
}

#[rstest]
fn test_force_inherit_option() {
    let tmp = TempDir::new().unwrap();
    let child = tmp.path().join("child");
    std::fs::create_dir(&child).unwrap();

    create_spec_file(tmp.path(), "api: shellenv/v0\npackages: [parent-lib]\n");
    create_spec_file(&child, "api: shellenv/v0\npackages: [child-lib]\n");

    let options = DiscoveryOptions {
        force_inherit: true,
        ..Default::default()
    };
    let specs = discover_specs(&child, &options).expect("Should discover manifests");
    assert_eq!(specs.len(), 2);
}

#[rstest]
fn test_no_inherit_option() {
    let tmp = TempDir::new().unwrap();
    let child = tmp.path().join("child");
    std::fs::create_dir(&child).unwrap();

    create_spec_file(tmp.path(), "api: shellenv/v0\npackages: [parent-lib]\n");
    create_spec_file(
        &child,
        "api: shellenv/v0\ninherit: true\npackages: [child-lib]\n",
    );

    let options = DiscoveryOptions {
        no_inherit: true,
        ..Default::default()
    };
    let specs = discover_specs(&child, &options).expect("Should discover manifest");
    assert_eq!(specs.len(), 1);
    assert_eq!(names(&specs[0]), vec!["child-lib"]);
}

#[rstest]
fn test_no_inherit_without_spec_is_error() {
    let tmp = TempDir::new().unwrap();
    let options = DiscoveryOptions {
        no_inherit: true,
        ..Default::default()
    };
    let result = discover_specs(tmp.path(), &options);
    assert!(matches!(result, Err(crate::Error::NotFoundAtPath(_))));
}

#[rstest]
fn test_not_found_error() {
    let tmp = TempDir::new().unwrap();

    let result = discover_specs(tmp.path(), &DiscoveryOptions::default());
    match result {
        Err(crate::Error::NotFoundInTree(_)) => {}
        other => panic!("Expected NotFoundInTree, got: {:?}", other),
    }
}

#[rstest]
fn test_local_override() {
    let tmp = TempDir::new().unwrap();
    create_spec_file(tmp.path(), "api: shellenv/v0\npackages: [openssl]\n");

    let local_path = tmp.path().join(SHELLENV_LOCAL_FILENAME);
    std::fs::write(
        local_path,
        "api: shellenv/v0\ntoolchain:\n  extensions: [rust-analyzer]\n",
    )
    .unwrap();

    let specs = discover_specs(tmp.path(), &DiscoveryOptions::default()).expect("Should discover");

    assert_eq!(specs.len(), 2);
    assert_eq!(names(&specs[0]), vec!["openssl"]);
    assert!(specs[1].toolchain.is_some());
}

#[rstest]
fn test_includes_precede_includer() {
    let tmp = TempDir::new().unwrap();
    let shared = tmp.path().join("shared");
    let project = tmp.path().join("project");
    std::fs::create_dir_all(&shared).unwrap();
    std::fs::create_dir_all(&project).unwrap();

    std::fs::write(
        shared.join("base.shellenv.yaml"),
        "api: shellenv/v0\npackages: [openssl]\n",
    )
    .unwrap();
    create_spec_file(
        &project,
        "api: shellenv/v0\nincludes: [../shared/base.shellenv.yaml]\npackages: [wayland]\n",
    );

    let specs = discover_specs(&project, &DiscoveryOptions::default()).expect("Should discover");
    assert_eq!(specs.len(), 2);
    assert_eq!(names(&specs[0]), vec!["openssl"]);
    assert_eq!(names(&specs[1]), vec!["wayland"]);
}

#[rstest]
fn test_explicit_includes_go_first() {
    let tmp = TempDir::new().unwrap();
    let extra = tmp.path().join("extra.shellenv.yaml");
    std::fs::write(&extra, "api: shellenv/v0\npackages: [vulkan-loader]\n").unwrap();
    let project = tmp.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    create_spec_file(&project, "api: shellenv/v0\npackages: [wayland]\n");

    let options = DiscoveryOptions {
        includes: vec![extra.display().to_string()],
        ..Default::default()
    };
    let specs = discover_specs(&project, &options).expect("Should discover");
    assert_eq!(names(&specs[0]), vec!["vulkan-loader"]);
    assert_eq!(names(&specs[1]), vec!["wayland"]);
}

#[rstest]
fn test_circular_include() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("a.shellenv.yaml"),
        "api: shellenv/v0\nincludes: [b.shellenv.yaml]\n",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("b.shellenv.yaml"),
        "api: shellenv/v0\nincludes: [a.shellenv.yaml]\n",
    )
    .unwrap();
    create_spec_file(tmp.path(), "api: shellenv/v0\nincludes: [a.shellenv.yaml]\n");

    let result = discover_specs(tmp.path(), &DiscoveryOptions::default());
    assert!(matches!(result, Err(crate::Error::CircularInclude(_))));
}

#[rstest]
fn test_missing_include() {
    let tmp = TempDir::new().unwrap();
    create_spec_file(tmp.path(), "api: shellenv/v0\nincludes: [nope.shellenv.yaml]\n");

    let result = discover_specs(tmp.path(), &DiscoveryOptions::default());
    assert!(matches!(result, Err(crate::Error::IncludeNotFound { .. })));
}

#[rstest]
fn test_invalid_manifest_fails_discovery() {
    let tmp = TempDir::new().unwrap();
    create_spec_file(tmp.path(), "api: shellenv/v0\nenv:\n  PATH: /x\n");

    let result = discover_specs(tmp.path(), &DiscoveryOptions::default());
    assert!(result.is_err());
}
