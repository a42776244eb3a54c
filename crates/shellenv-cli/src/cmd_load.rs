// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `shellenv load` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Run a command inside the environment
#[derive(Debug, Args)]
pub struct CmdLoad {
    /// Manifest discovery flags
    #[clap(flatten)]
    pub discovery: crate::DiscoveryFlags,

    /// Resolver location flags
    #[clap(flatten)]
    pub resolver: crate::ResolverFlags,

    /// Show what would be loaded without running anything
    #[clap(long)]
    pub dry_run: bool,

    /// Command to run (default: $SHELL)
    #[clap(last = true)]
    pub command: Vec<String>,
}

/// The user's shell, falling back to bash.
pub fn default_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string())
}

impl CmdLoad {
    pub fn run(&mut self) -> Result<i32> {
        let (specs, composed) = self.discovery.compose()?;
        let activation = self.resolver.activate(&composed)?;

        // Dry run: just show what would be loaded
        if self.dry_run {
            println!("{}", "Discovered files:".bold());
            for spec in &specs {
                if let Some(path) = &spec.source_path {
                    println!("  - {}", path.display());
                }
            }
            println!();
            println!("{} dependencies:", activation.dependencies.len());
            for dep in &activation.dependencies {
                println!("  - {}", dep.name.green());
            }
            println!();
            print!("{}", shellenv::generate_startup_script(&activation.environment));
            return Ok(0);
        }

        // Determine command to run
        let (program, args) = match self.command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => (default_shell(), Vec::new()),
        };

        let mut cmd = activation.command(&program, &args)?;
        tracing::info!("Running {program} in environment");
        run_command(&mut cmd, &program)
    }
}

/// Replace the current process with `cmd`.
#[cfg(unix)]
fn run_command(cmd: &mut std::process::Command, program: &str) -> Result<i32> {
    use std::os::unix::process::CommandExt;

    // exec only returns on failure
    let err = cmd.exec();
    Err(miette::miette!("Failed to execute {program}: {err}"))
}

/// Run `cmd` to completion and forward its exit code.
#[cfg(not(unix))]
fn run_command(cmd: &mut std::process::Command, program: &str) -> Result<i32> {
    let status = cmd
        .status()
        .map_err(|e| miette::miette!("Failed to execute {program}: {e}"))?;
    Ok(status.code().unwrap_or(1))
}
