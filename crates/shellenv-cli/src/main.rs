// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! shellenv - Reproducible Native Development Shell CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_check;
mod cmd_export;
mod cmd_init;
mod cmd_load;
mod cmd_shell;
mod cmd_show;


use cmd_check::CmdCheck;
use cmd_export::CmdExport;
use cmd_init::CmdInit;
use cmd_load::CmdLoad;
use cmd_shell::CmdShell;
use cmd_show::CmdShow;

#[derive(Parser)]
#[clap(
    name = "shellenv",
    about = "Reproducible native development shells",
    version,
    long_about = "Pin a compiler toolchain and native libraries in .shellenv.yaml and run commands in the composed environment"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

/// Flags controlling which manifests are discovered.
#[derive(Parser, Clone, Debug, Default)]
pub struct DiscoveryFlags {
    /// Start discovery from PATH
    #[clap(short = 'f', long, default_value = ".")]
    pub file: PathBuf,

    /// Enable in-tree discovery
    #[clap(
        long,
        env = "SHELLENV_INHERIT",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub inherit: bool,

    /// Disable in-tree discovery
    #[clap(
        short = 'n',
        long,
        env = "SHELLENV_NO_INHERIT",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub no_inherit: bool,

    /// Additional .shellenv.yaml to include
    #[clap(
        short = 'i',
        long = "include",
        env = "SHELLENV_INCLUDE",
        value_delimiter = ':'
    )]
    pub includes: Vec<String>,
}

impl DiscoveryFlags {
    pub fn options(&self) -> shellenv::DiscoveryOptions {
        shellenv::DiscoveryOptions {
            no_inherit: self.no_inherit,
            force_inherit: self.inherit,
            includes: self
                .includes
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Discover and compose manifests.
    pub fn compose(&self) -> Result<(Vec<shellenv::EnvSpec>, shellenv::ComposedSpec)> {
        let specs = shellenv::discover_specs(&self.file, &self.options())?;
        if specs.is_empty() {
            return Err(miette::miette!(
                "No .shellenv.yaml files discovered. Run 'shellenv init' to create one."
            ));
        }
        let composed = shellenv::compose_specs(&specs);
        Ok((specs, composed))
    }
}

/// Flags overriding where toolchains and packages are resolved from.
#[derive(Parser, Clone, Debug, Default)]
pub struct ResolverFlags {
    /// Directory holding installed toolchains
    #[clap(long, env = "SHELLENV_TOOLCHAINS")]
    pub toolchains: Option<PathBuf>,

    /// Package installation root (repeatable, searched in order)
    #[clap(long = "package-root", env = "SHELLENV_PACKAGE_PATH", value_delimiter = ':')]
    pub package_roots: Vec<PathBuf>,
}

impl ResolverFlags {
    /// Effective configuration: defaults, manifest, then flags (or their
    /// environment fallbacks).
    pub fn config(&self, composed: &shellenv::ComposedSpec) -> Result<shellenv::ResolverConfig> {
        let config = shellenv::ResolverConfig::load(composed.resolver.as_ref())?
            .with_overrides(self.toolchains.as_deref(), &self.package_roots);
        tracing::debug!(?config, "resolver configuration");
        Ok(config)
    }

    /// Resolve and compose the environment for a composed manifest.
    pub fn activate(&self, composed: &shellenv::ComposedSpec) -> Result<shellenv::Activation> {
        let config = self.config(composed)?;
        let toolchains = shellenv::DirectoryToolchains::new(config.toolchains_dir);
        let packages = shellenv::PrefixResolver::new(config.package_roots);
        Ok(shellenv::activate(composed, &toolchains, &packages)?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a new .shellenv.yaml file
    Init(CmdInit),

    /// Display the composed environment configuration
    Show(CmdShow),

    /// Run a command inside the environment
    Load(CmdLoad),

    /// Enter an interactive shell inside the environment
    Shell(CmdShell),

    /// Print shell exports for the environment
    Export(CmdExport),

    /// Verify that every resolved path exists on disk
    Check(CmdCheck),
}

impl Opt {
    fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::Init(mut cmd) => cmd.run(),
            Command::Show(mut cmd) => cmd.run(),
            Command::Load(mut cmd) => cmd.run(),
            Command::Shell(mut cmd) => cmd.run(),
            Command::Export(mut cmd) => cmd.run(),
            Command::Check(mut cmd) => cmd.run(),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
