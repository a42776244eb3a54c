// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `shellenv show` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;
use serde::Serialize;

/// Display the composed environment configuration
#[derive(Debug, Args)]
pub struct CmdShow {
    /// Manifest discovery flags
    #[clap(flatten)]
    discovery: crate::DiscoveryFlags,

    /// Resolver location flags
    #[clap(flatten)]
    resolver: crate::ResolverFlags,

    /// Also resolve the toolchain and packages and show the derived environment
    #[clap(long)]
    resolve: bool,

    /// Output format: table, yaml, json
    #[clap(long, default_value = "table")]
    format: String,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    discovered_files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    toolchain: Option<shellenv::ToolchainRequest>,
    packages: &'a [shellenv::PackageRequest],
    env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<ResolvedOutput<'a>>,
}

#[derive(Serialize)]
struct ResolvedOutput<'a> {
    dependencies: &'a [shellenv::Dependency],
    environment: BTreeMap<String, String>,
}

impl CmdShow {
    pub fn run(&mut self) -> Result<i32> {
        let (specs, composed) = self.discovery.compose()?;
        let request = shellenv::session::toolchain_request(&composed)?;
        let activation = if self.resolve {
            Some(self.resolver.activate(&composed)?)
        } else {
            None
        };

        match self.format.as_str() {
            "yaml" | "json" => {
                let output = ShowOutput {
                    discovered_files: composed.source_files.clone(),
                    toolchain: request,
                    packages: &composed.packages,
                    env: shellenv::session::fixed_vars(&composed),
                    resolved: activation.as_ref().map(|a| ResolvedOutput {
                        dependencies: &a.dependencies,
                        environment: a.environment.to_vars(),
                    }),
                };
                let rendered = if self.format == "yaml" {
                    serde_yaml::to_string(&output)
                        .map_err(|e| miette::miette!("Failed to render yaml: {e}"))?
                } else {
                    serde_json::to_string_pretty(&output)
                        .map_err(|e| miette::miette!("Failed to render json: {e}"))?
                };
                println!("{rendered}");
            }
            "table" => {
                self.show_files_table(&specs, composed.source_count());
                println!();
                self.show_request_table(&composed, request.as_ref());
                if let Some(activation) = &activation {
                    println!();
                    self.show_environment_table(activation);
                }
            }
            other => {
                return Err(miette::miette!(
                    "Unknown format '{other}' (expected table, yaml or json)"
                ));
            }
        }

        Ok(0)
    }

    fn show_files_table(&self, specs: &[shellenv::EnvSpec], source_count: usize) {
        println!("{}", "Discovered Files:".bold());
        println!();

        for (i, spec) in specs.iter().enumerate() {
            let path = spec
                .source_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string());

            let inherit_marker = if spec.inherit { " [inherit]" } else { "" };
            let includes_marker = if !spec.includes.is_empty() {
                format!(" [includes: {}]", spec.includes.len())
            } else {
                String::new()
            };

            println!(
                "  {}. {}{}{}",
                i + 1,
                path.cyan(),
                inherit_marker.yellow(),
                includes_marker.blue()
            );

            if let Some(desc) = &spec.description {
                println!("     {}", desc.dimmed());
            }
        }

        println!();
        println!("Total: {} file(s)", source_count);
    }

    fn show_request_table(
        &self,
        composed: &shellenv::ComposedSpec,
        request: Option<&shellenv::ToolchainRequest>,
    ) {
        println!("{}", "Toolchain:".bold());
        match request {
            Some(request) => {
                println!("  {}", request.channel.green());
                if !request.extensions.is_empty() {
                    let extensions: Vec<&str> =
                        request.extensions.iter().map(String::as_str).collect();
                    println!("  extensions: {}", extensions.join(", "));
                }
                if !request.targets.is_empty() {
                    let targets: Vec<&str> = request.targets.iter().map(String::as_str).collect();
                    println!("  targets: {}", targets.join(", "));
                }
            }
            None => println!("  {}", "(none)".dimmed()),
        }

        println!();
        println!("{}", "Packages:".bold());
        if composed.packages.is_empty() {
            println!("  {}", "(no packages)".dimmed());
        }
        for (i, pkg) in composed.packages.iter().enumerate() {
            let version = pkg
                .version
                .as_deref()
                .map(|v| format!("/{v}"))
                .unwrap_or_default();
            let kind = match pkg.kind {
                shellenv::PackageKind::Library => "",
                shellenv::PackageKind::Tool => " [tool]",
            };
            println!("  {}. {}{}{}", i + 1, pkg.name.green(), version, kind.yellow());
        }

        println!();
        println!("{}", "Variables:".bold());
        for (key, value) in shellenv::session::fixed_vars(composed) {
            println!("  {} = {}", key.cyan(), value.green());
        }
    }

    fn show_environment_table(&self, activation: &shellenv::Activation) {
        println!("{}", "Executable Path:".bold());
        for dir in &activation.environment.path {
            println!("  {}", dir.display());
        }

        println!();
        println!(
            "{} {}",
            shellenv::environment::LIBRARY_PATH_VAR.bold(),
            "=".bold()
        );
        if activation.environment.library_path.is_empty() {
            println!("  {}", "(empty)".dimmed());
        }
        for dir in activation
            .environment
            .library_path
            .split(shellenv::environment::PATH_LIST_SEPARATOR)
            .filter(|d| !d.is_empty())
        {
            println!("  {dir}");
        }
    }
}
