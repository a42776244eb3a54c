// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `shellenv export` command.
//!
//! Intended for `eval "$(shellenv export)"` from an existing shell.

use clap::Args;
use miette::Result;

/// Print shell exports for the environment
#[derive(Debug, Args)]
pub struct CmdExport {
    /// Manifest discovery flags
    #[clap(flatten)]
    discovery: crate::DiscoveryFlags,

    /// Resolver location flags
    #[clap(flatten)]
    resolver: crate::ResolverFlags,
}

impl CmdExport {
    pub fn run(&mut self) -> Result<i32> {
        let (_, composed) = self.discovery.compose()?;
        let activation = self.resolver.activate(&composed)?;
        print!("{}", shellenv::generate_startup_script(&activation.environment));
        Ok(0)
    }
}
