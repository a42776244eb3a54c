// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `shellenv init` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

#[cfg(test)]
#[path = "./cmd_init_test.rs"]
mod cmd_init_test;

/// Create a new .shellenv.yaml file
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create file in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Enable in-tree inheritance
    #[clap(long)]
    inherit: bool,

    /// Add an initial native library package
    #[clap(long = "package")]
    packages: Vec<String>,

    /// Template to use: minimal, standard, full
    #[clap(long, default_value = "standard")]
    template: String,
}

impl CmdInit {
    pub fn run(&mut self) -> Result<i32> {
        let spec_path = self.path.join(shellenv::SHELLENV_FILENAME);

        if spec_path.exists() {
            return Err(miette::miette!(
                ".shellenv.yaml already exists at {:?}",
                spec_path
            ));
        }

        let content = self.render()?;

        std::fs::write(&spec_path, content)
            .map_err(|e| miette::miette!("Failed to write .shellenv.yaml: {}", e))?;

        println!("Created .shellenv.yaml at {:?}", spec_path);
        println!();
        println!("Next steps:");
        println!("  1. Pin a toolchain and list the native libraries you need");
        println!("  2. Run 'shellenv show --resolve' to preview the environment");
        println!("  3. Run 'shellenv load' to enter the environment");

        Ok(0)
    }

    /// Template text for the selected template name.
    fn render(&self) -> Result<String> {
        match self.template.as_str() {
            "minimal" => Ok(self.generate_minimal_template()),
            "standard" => Ok(self.generate_standard_template()),
            "full" => Ok(self.generate_full_template()),
            other => Err(miette::miette!(
                "Unknown template '{other}' (expected minimal, standard or full)"
            )),
        }
    }

    fn packages_section(&self) -> Option<String> {
        if self.packages.is_empty() {
            return None;
        }
        let entries = self
            .packages
            .iter()
            .map(|p| format!("  - {}", p))
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!("packages:\n{}\n", entries))
    }

    fn generate_minimal_template(&self) -> String {
        format!(
            "api: shellenv/v0\n\
            inherit: {}\n\
            \n\
            {}",
            self.inherit,
            self.packages_section()
                .unwrap_or_else(|| "packages: []\n".to_string())
        )
    }

    fn generate_standard_template(&self) -> String {
        let packages_section = self.packages_section().unwrap_or_else(|| {
            "# packages:\n\
            #   - openssl\n\
            #   - name: protobuf\n\
            #     kind: tool\n"
                .to_string()
        });

        format!(
            "# shellenv environment manifest\n\
            \n\
            api: shellenv/v0\n\
            \n\
            # Optional: Human-readable description\n\
            # description: \"My project environment\"\n\
            \n\
            # In-tree inheritance (default: false)\n\
            # When true, walks up the directory tree loading parent .shellenv.yaml files\n\
            inherit: {}\n\
            \n\
            # Explicit includes (recommended over inherit: true)\n\
            # includes:\n\
            #   - ~/.config/shellenv/defaults.shellenv.yaml\n\
            #   - ../shared/common.shellenv.yaml\n\
            \n\
            # Compiler toolchain, pinned by rust-toolchain.toml or a channel\n\
            toolchain:\n\
            \x20 file: rust-toolchain.toml\n\
            \x20 extensions:\n\
            \x20   - rust-src\n\
            \x20   - clippy\n\
            \n\
            # Native libraries and tools\n\
            {}\
            \n\
            # Fixed variables exported into the shell\n\
            # env:\n\
            #   RUST_LOG: debug\n",
            self.inherit, packages_section,
        )
    }

    fn generate_full_template(&self) -> String {
        let packages_section = self.packages_section().unwrap_or_else(|| {
            "packages:\n\
            \x20 - openssl\n\
            \x20 - fontconfig\n\
            \x20 - name: protobuf\n\
            \x20   kind: tool\n\
            \x20 - alsa-lib\n\
            \x20 - wayland\n\
            \x20 - libxkbcommon\n\
            \x20 - name: vulkan-loader\n\
            \x20   version: \"1.3\"\n"
                .to_string()
        });

        format!(
            "# shellenv environment manifest\n\
            # Full example with all fields documented\n\
            \n\
            api: shellenv/v0\n\
            \n\
            description: \"Full example environment\"\n\
            \n\
            inherit: {}\n\
            \n\
            includes: []\n\
            #   - ~/.config/shellenv/defaults.shellenv.yaml\n\
            \n\
            toolchain:\n\
            \x20 channel: stable\n\
            \x20 extensions:\n\
            \x20   - cargo\n\
            \x20   - clippy\n\
            \x20   - rustfmt\n\
            \x20   - rust-src\n\
            \n\
            {}\
            \n\
            env:\n\
            \x20 RUST_LOG: info\n\
            \n\
            # Where toolchains and packages are installed. Overridden by\n\
            # SHELLENV_TOOLCHAINS, SHELLENV_PACKAGE_PATH and the CLI flags.\n\
            # resolver:\n\
            #   toolchains: ~/.rustup/toolchains\n\
            #   package_roots:\n\
            #     - /opt/shellenv/packages\n",
            self.inherit, packages_section,
        )
    }
}
