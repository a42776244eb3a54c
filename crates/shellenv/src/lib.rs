// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! shellenv - Reproducible Native Development Shells
//!
//! This crate provides the core library for declaring a development
//! environment in a `.shellenv.yaml` file: a pinned compiler toolchain, the
//! native libraries and tools a project needs, and a few fixed variables.
//!
//! # Overview
//!
//! Activation runs in two steps. The toolchain resolver matches the pinned
//! channel against installed releases and grants the requested extensions.
//! The environment composer then walks the ordered dependency set (toolchain
//! first) and derives `PATH`, the dynamic library search path and the fixed
//! variables as one immutable [`EnvironmentDescription`].
//!
//! # Example
//!
//! ```yaml
//! # .shellenv.yaml
//! api: shellenv/v0
//! description: "GPU app development shell"
//!
//! toolchain:
//!   file: rust-toolchain.toml
//!   extensions: [rust-src, clippy]
//!
//! packages:
//!   - openssl
//!   - fontconfig
//!   - name: protobuf
//!     kind: tool
//!   - alsa-lib
//!   - wayland
//!   - libxkbcommon
//!   - vulkan-loader
//!
//! env:
//!   RUST_BACKTRACE: "1"
//! ```

pub mod compose;
pub mod config;
pub mod discovery;
pub mod environment;
pub mod error;
pub mod package;
pub mod session;
pub mod spec;
pub mod toolchain;
pub mod verify;

pub use compose::{compose_specs, ComposedSpec};
pub use config::{ResolverConfig, ResolverOptions};
pub use discovery::{discover_specs, DiscoveryOptions};
pub use environment::{compose, generate_startup_script, EnvironmentDescription};
pub use error::{Error, Result};
pub use package::{
    Dependency, DependencyKind, PackageKind, PackageRequest, PackageResolver, PrefixResolver,
};
pub use session::{activate, Activation};
pub use spec::{ApiVersion, EnvSpec, ToolchainDecl};
pub use toolchain::{
    resolve, DirectoryToolchains, Toolchain, ToolchainFile, ToolchainRelease, ToolchainRequest,
    ToolchainSource,
};
pub use verify::{verify_activation, Problem, ProblemKind};

/// Well-known filename for environment manifests.
pub const SHELLENV_FILENAME: &str = ".shellenv.yaml";

/// Well-known filename for local overrides.
pub const SHELLENV_LOCAL_FILENAME: &str = ".shellenv.local.yaml";
