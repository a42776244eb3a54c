// Copyright (c) Contributors to the shellenv project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for shellenv operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with shellenv Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during shellenv operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// No .shellenv.yaml found in directory tree
    #[error("No .shellenv.yaml found in {0:?} or any parent directory")]
    #[diagnostic(
        code(shellenv::not_found_in_tree),
        help("Create a .shellenv.yaml file with 'shellenv init' or specify a path with -f")
    )]
    NotFoundInTree(PathBuf),

    /// .shellenv.yaml not found at specified path
    #[error(".shellenv.yaml not found at {0:?}")]
    #[diagnostic(code(shellenv::not_found_at_path))]
    NotFoundAtPath(PathBuf),

    /// Invalid YAML in manifest file
    #[error("Invalid .shellenv.yaml file: {error}")]
    #[diagnostic(
        code(shellenv::invalid_yaml),
        help("Check YAML syntax and ensure 'api: shellenv/v0' is present")
    )]
    InvalidYaml {
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Invalid toolchain declaration file
    #[error("Invalid toolchain file {path:?}: {error}")]
    #[diagnostic(
        code(shellenv::invalid_toolchain_file),
        help("Expected a [toolchain] table with a 'channel' key")
    )]
    InvalidToml {
        path: PathBuf,
        #[source]
        error: toml::de::Error,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(shellenv::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Include file not found
    #[error("Include file not found: {path:?}")]
    #[diagnostic(
        code(shellenv::include_not_found),
        help("Check that the include path is correct and the file exists")
    )]
    IncludeNotFound {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Circular include detected
    #[error("Circular include detected: {0:?}")]
    #[diagnostic(
        code(shellenv::circular_include),
        help("Remove the circular reference in your includes")
    )]
    CircularInclude(PathBuf),

    /// Validation error
    #[error("Validation failed: {0}")]
    #[diagnostic(code(shellenv::validation_failed))]
    ValidationFailed(String),

    /// The requested toolchain is not among the available releases
    #[error("Toolchain not found: {id}")]
    #[diagnostic(
        code(shellenv::toolchain_not_found),
        help("{}", suggestion_message(available))
    )]
    ToolchainNotFound { id: String, available: Vec<String> },

    /// An extension was requested that the toolchain release does not offer
    #[error("Toolchain {toolchain} does not offer extension '{extension}'")]
    #[diagnostic(
        code(shellenv::unsupported_extension),
        help("{}", offered_message(offered))
    )]
    UnsupportedExtension {
        extension: String,
        toolchain: String,
        offered: Vec<String>,
    },

    /// A dependency claims to provide libraries but has no library directory
    #[error("Dependency '{0}' provides libraries but no library directory was resolved")]
    #[diagnostic(
        code(shellenv::missing_library_directory),
        help("Check the package installation or declare it with 'kind: tool'")
    )]
    MissingLibraryDirectory(String),

    /// A package could not be located by the resolver
    #[error("Package not found: {name}")]
    #[diagnostic(
        code(shellenv::package_not_found),
        help("Searched: {}", format_searched(searched))
    )]
    PackageNotFound { name: String, searched: Vec<PathBuf> },

    /// A fixed variable collides with a derived one
    #[error("Environment variable {0} is derived from the dependency set and cannot be set directly")]
    #[diagnostic(code(shellenv::reserved_variable))]
    ReservedVariable(String),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(shellenv::io_error))]
    Io(#[from] std::io::Error),
}

fn suggestion_message(available: &[String]) -> String {
    if available.is_empty() {
        "No toolchains are installed in the configured toolchain directory".to_string()
    } else {
        format!("Available toolchains: {}", available.join(", "))
    }
}

fn offered_message(offered: &[String]) -> String {
    if offered.is_empty() {
        "This toolchain offers no extensions".to_string()
    } else {
        format!("Offered extensions: {}", offered.join(", "))
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return "(no package roots configured)".to_string();
    }
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
