// src/lib.rs

//! gopkg: dependency-aware package acquisition and installation
//!
//! Given import paths, gopkg walks their transitive import graph, fetches each
//! package's repository into the workspace, switches it to the tag chosen by
//! the command line or a `GOENV` manifest, and installs the resolved set into
//! a named environment.
//!
//! # Architecture
//!
//! - [`walker`]: import graph walk with an explicit traversal stack for cycles
//! - [`vcs`]: git, hg and svn backends behind one trait
//! - [`cache`]: derived package records, cleared wholesale after downloading
//! - [`orchestrator`]: download, invalidate, re-expand, install, gated on
//!   accumulated [`Diagnostics`]
//! - [`install`]: fail-forward build and install into an environment

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diagnostics;
mod error;
pub mod import_path;
pub mod install;
pub mod manifest;
pub mod orchestrator;
pub mod package;
pub mod process;
pub mod repository;
pub mod scan;
pub mod vcs;
pub mod walker;

pub use cache::PackageCache;
pub use config::{Config, Environment, Overrides, RepoRule};
pub use diagnostics::{Diagnostics, EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE};
pub use error::{Error, Result};
pub use import_path::ImportPath;
pub use install::{InstallReport, Installer, ToolchainInstaller};
pub use manifest::{Manifest, TagPolicy, TagSource};
pub use orchestrator::{GetOptions, GetOutcome, Orchestrator, Phase};
pub use package::Package;
pub use repository::{RepoResolver, RepoRoot};
pub use vcs::{Vcs, VcsRegistry};
pub use walker::{ImportStack, Walker};
