// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Derivation of the session environment from a dependency set.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use serde::Serialize;

use crate::package::Dependency;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// Variable holding the dynamic library search path.
#[cfg(target_os = "macos")]
pub const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(not(target_os = "macos"))]
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Variable holding the executable search path.
pub const PATH_VAR: &str = "PATH";

/// Backtrace verbosity flag always present in a session.
pub const BACKTRACE_VAR: &str = "RUST_BACKTRACE";

/// Separator between entries of a path list.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: &str = ":";

/// Whether `key` is computed from the dependency set.
pub fn is_derived_variable(key: &str) -> bool {
    key == PATH_VAR || key == LIBRARY_PATH_VAR
}

/// Fixed variables every session starts from.
pub fn default_fixed_vars() -> BTreeMap<String, String> {
    BTreeMap::from([(BACKTRACE_VAR.to_string(), "1".to_string())])
}

/// Final environment for one activation session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentDescription {
    /// Executable directories, highest precedence first.
    pub path: Vec<PathBuf>,
    /// Library directories joined with [`PATH_LIST_SEPARATOR`].
    pub library_path: String,
    /// Fixed variables, disjoint from the derived ones.
    pub vars: BTreeMap<String, String>,
}

/// Compose the environment for an ordered dependency set.
pub fn compose(
    deps: &[Dependency],
    fixed: &BTreeMap<String, String>,
) -> Result<EnvironmentDescription> {
    if let Some(key) = fixed.keys().find(|k| is_derived_variable(k)) {
        return Err(Error::ReservedVariable(key.clone()));
    }

    let mut path = Vec::new();
    let mut lib_dirs = Vec::new();
    for dep in deps {
        if let Some(bin) = &dep.bin_dir {
            path.push(bin.clone());
        }
        if dep.provides_libraries && dep.lib_dirs.is_empty() {
            return Err(Error::MissingLibraryDirectory(dep.name.clone()));
        }
        for dir in &dep.lib_dirs {
            if lib_dirs.contains(dir) {
                tracing::debug!(dependency = %dep.name, dir = %dir.display(), "duplicate library directory");
            }
            lib_dirs.push(dir.clone());
        }
    }

    let library_path = lib_dirs
        .iter()
        .map(|d| d.to_string_lossy())
        .collect::<Vec<_>>()
        .join(PATH_LIST_SEPARATOR);

    Ok(EnvironmentDescription {
        path,
        library_path,
        vars: fixed.clone(),
    })
}

impl EnvironmentDescription {
    /// Executable search entries joined into a single path list.
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(PATH_LIST_SEPARATOR)
    }

    /// Every exported variable, derived and fixed. `PATH` carries only the
    /// session's own entries; [`apply`](Self::apply) prepends them to the
    /// ambient value.
    pub fn to_vars(&self) -> BTreeMap<String, String> {
        let mut vars = self.vars.clone();
        vars.insert(PATH_VAR.to_string(), self.path_string());
        vars.insert(LIBRARY_PATH_VAR.to_string(), self.library_path.clone());
        vars
    }

    /// Session `PATH` merged over an ambient value.
    pub fn merged_path(&self, ambient: Option<OsString>) -> Result<OsString> {
        let mut entries = self.path.clone();
        if let Some(ambient) = ambient {
            entries.extend(std::env::split_paths(&ambient));
        }
        std::env::join_paths(entries)
            .map_err(|e| Error::ValidationFailed(format!("Cannot build {PATH_VAR}: {e}")))
    }

    /// Export this environment into a child process command.
    pub fn apply(&self, command: &mut Command) -> Result<()> {
        let path = self.merged_path(std::env::var_os(PATH_VAR))?;
        command.env(PATH_VAR, path);
        command.env(LIBRARY_PATH_VAR, &self.library_path);
        command.envs(&self.vars);
        Ok(())
    }
}

/// Escape a value for use inside a double-quoted POSIX shell string.
fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render the environment as a POSIX shell script suitable for `eval`.
pub fn generate_startup_script(env: &EnvironmentDescription) -> String {
    let mut script = String::from("# generated by shellenv\n");

    if !env.path.is_empty() {
        script.push_str(&format!(
            "export {PATH_VAR}=\"{}{PATH_LIST_SEPARATOR}${{{PATH_VAR}}}\"\n",
            shell_escape(&env.path_string())
        ));
    }
    script.push_str(&format!(
        "export {LIBRARY_PATH_VAR}=\"{}\"\n",
        shell_escape(&env.library_path)
    ));
    for (key, value) in &env.vars {
        script.push_str(&format!("export {key}=\"{}\"\n", shell_escape(value)));
    }

    script
}
