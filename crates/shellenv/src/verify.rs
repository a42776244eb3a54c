// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! On-disk verification of an activated environment.

use std::path::{Path, PathBuf};

use crate::session::Activation;

#[cfg(test)]
#[path = "./verify_test.rs"]
mod verify_test;

/// A single detected problem with the activated environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub kind: ProblemKind,
    /// Dependency or extension the problem belongs to.
    pub subject: String,
    pub path: PathBuf,
}

/// Types of environment problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    CompilerMissing,
    ExtensionExecutableMissing,
    TargetMissing,
    BinDirMissing,
    LibDirMissing,
    NoSharedLibraries,
}

/// Whether a file name looks like a shared library.
fn is_shared_library(name: &str) -> bool {
    name.ends_with(".so")
        || name.contains(".so.")
        || name.ends_with(".dylib")
        || name.ends_with(".dll")
}

fn has_shared_libraries(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_str().is_some_and(is_shared_library))
}

/// Check that every path the environment points at exists on disk.
pub fn verify_activation(activation: &Activation) -> Vec<Problem> {
    let mut problems = Vec::new();

    if let Some(toolchain) = &activation.toolchain {
        if !toolchain.compiler.is_file() {
            problems.push(Problem {
                kind: ProblemKind::CompilerMissing,
                subject: toolchain.id.clone(),
                path: toolchain.compiler.clone(),
            });
        }
        for (extension, exe) in &toolchain.executables {
            if !exe.is_file() {
                problems.push(Problem {
                    kind: ProblemKind::ExtensionExecutableMissing,
                    subject: extension.clone(),
                    path: exe.clone(),
                });
            }
        }
        for target in &toolchain.targets {
            let dir = toolchain.target_dir(target);
            if !dir.is_dir() {
                problems.push(Problem {
                    kind: ProblemKind::TargetMissing,
                    subject: target.clone(),
                    path: dir,
                });
            }
        }
    }

    for dep in &activation.dependencies {
        if let Some(bin) = &dep.bin_dir {
            if !bin.is_dir() {
                problems.push(Problem {
                    kind: ProblemKind::BinDirMissing,
                    subject: dep.name.clone(),
                    path: bin.clone(),
                });
            }
        }
        for dir in &dep.lib_dirs {
            let kind = if !dir.is_dir() {
                ProblemKind::LibDirMissing
            } else if !has_shared_libraries(dir) {
                ProblemKind::NoSharedLibraries
            } else {
                continue;
            };
            problems.push(Problem {
                kind,
                subject: dep.name.clone(),
                path: dir.clone(),
            });
        }
    }

    problems
}
