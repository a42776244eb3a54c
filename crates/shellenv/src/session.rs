// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Activation: turn a composed manifest into a ready-to-launch environment.

use std::collections::BTreeMap;
use std::process::Command;

use crate::environment::{compose, default_fixed_vars, EnvironmentDescription};
use crate::package::{Dependency, PackageResolver};
use crate::toolchain::{self, Toolchain, ToolchainFile, ToolchainRequest, ToolchainSource};
use crate::{ComposedSpec, Error, Result};

#[cfg(test)]
#[path = "./session_test.rs"]
mod session_test;

/// Everything derived for one activation session.
#[derive(Debug, Clone)]
pub struct Activation {
    pub toolchain: Option<Toolchain>,
    /// The dependency set, toolchain first.
    pub dependencies: Vec<Dependency>,
    pub environment: EnvironmentDescription,
}

impl Activation {
    /// Build a command for `program` running inside this environment.
    pub fn command<I, S>(&self, program: &str, args: I) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args);
        self.environment.apply(&mut cmd)?;
        Ok(cmd)
    }
}

/// Build the toolchain request described by a composed manifest, if any.
pub fn toolchain_request(composed: &ComposedSpec) -> Result<Option<ToolchainRequest>> {
    let Some(decl) = &composed.toolchain else {
        if let Some(extension) = composed.extensions.iter().next() {
            return Err(Error::ValidationFailed(format!(
                "extension '{extension}' requested but no toolchain is pinned"
            )));
        }
        return Ok(None);
    };

    let request = match (decl.file_path()?, &decl.channel) {
        (Some(path), _) => ToolchainRequest::from_file(&ToolchainFile::load(&path)?),
        (None, Some(channel)) => ToolchainRequest::new(channel.clone()),
        (None, None) => {
            return Err(Error::ValidationFailed(
                "toolchain: one of 'file' or 'channel' is required".to_string(),
            ));
        }
    };

    Ok(Some(request.with_extensions(composed.extensions.iter().cloned())))
}

/// Fixed variables for the session: defaults overlaid with manifest `env`.
pub fn fixed_vars(composed: &ComposedSpec) -> BTreeMap<String, String> {
    let mut vars = default_fixed_vars();
    vars.extend(composed.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    vars
}

/// Resolve the toolchain and packages, then compose the environment.
///
/// Any failure aborts the whole activation.
pub fn activate(
    composed: &ComposedSpec,
    toolchains: &dyn ToolchainSource,
    packages: &dyn PackageResolver,
) -> Result<Activation> {
    let mut dependencies = Vec::new();

    let toolchain = match toolchain_request(composed)? {
        Some(request) => {
            let toolchain = toolchain::resolve(&request, toolchains)?;
            dependencies.push(toolchain.to_dependency());
            Some(toolchain)
        }
        None => None,
    };

    for request in &composed.packages {
        dependencies.push(packages.resolve(request)?);
    }

    let environment = compose(&dependencies, &fixed_vars(composed))?;

    tracing::info!(
        toolchain = toolchain.as_ref().map(|t| t.id.as_str()).unwrap_or("none"),
        dependencies = dependencies.len(),
        "environment activated"
    );

    Ok(Activation {
        toolchain,
        dependencies,
        environment,
    })
}
