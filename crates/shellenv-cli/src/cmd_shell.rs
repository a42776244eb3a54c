// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `shellenv shell` command.

use clap::Args;
use miette::Result;

/// Enter an interactive shell inside the environment
#[derive(Debug, Args)]
pub struct CmdShell {
    /// Manifest discovery flags
    #[clap(flatten)]
    discovery: crate::DiscoveryFlags,

    /// Resolver location flags
    #[clap(flatten)]
    resolver: crate::ResolverFlags,

    /// Shell to use
    #[clap(long)]
    shell: Option<String>,
}

impl CmdShell {
    pub fn run(&mut self) -> Result<i32> {
        let shell = self
            .shell
            .clone()
            .unwrap_or_else(super::cmd_load::default_shell);

        // Build load command with our settings
        let mut load_cmd = super::cmd_load::CmdLoad {
            discovery: self.discovery.clone(),
            resolver: self.resolver.clone(),
            dry_run: false,
            command: vec![shell],
        };

        load_cmd.run()
    }
}
