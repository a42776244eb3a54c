// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Verify that the resolved environment exists on disk.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Verify that every resolved path exists on disk
#[derive(Debug, Args)]
pub struct CmdCheck {
    /// Manifest discovery flags
    #[clap(flatten)]
    discovery: crate::DiscoveryFlags,

    /// Resolver location flags
    #[clap(flatten)]
    resolver: crate::ResolverFlags,

    /// Exit with error on any problem
    #[clap(long)]
    strict: bool,
}

impl CmdCheck {
    pub fn run(&mut self) -> Result<i32> {
        let (_, composed) = self.discovery.compose()?;
        let activation = self.resolver.activate(&composed)?;
        let problems = shellenv::verify_activation(&activation);

        if problems.is_empty() {
            println!(
                "{} Environment resolved: {} dependencies",
                "✓".green(),
                activation.dependencies.len()
            );
            return Ok(0);
        }

        if self.strict {
            eprintln!("Error: Environment has problems:");
        } else {
            println!("Warning: Environment has problems:");
        }

        for problem in &problems {
            let what = match problem.kind {
                shellenv::ProblemKind::CompilerMissing => "compiler executable missing",
                shellenv::ProblemKind::ExtensionExecutableMissing => {
                    "extension executable missing"
                }
                shellenv::ProblemKind::TargetMissing => "target standard library not installed",
                shellenv::ProblemKind::BinDirMissing => "executable directory missing",
                shellenv::ProblemKind::LibDirMissing => "library directory missing",
                shellenv::ProblemKind::NoSharedLibraries => "no shared libraries found",
            };
            println!(
                "  - {}: {} ({})",
                problem.subject.cyan(),
                what,
                problem.path.display()
            );
        }

        Ok(if self.strict { 1 } else { 0 })
    }
}
