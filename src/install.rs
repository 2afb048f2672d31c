// src/install.rs

//! Build and install resolved packages into an environment
//!
//! Installation is fail-forward: a package that fails to build is recorded
//! and the remaining packages are still attempted. Nothing already installed
//! in the same run is rolled back.

use crate::config::{Config, Environment};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::import_path::ImportPath;
use crate::process::CommandRunner;
use tracing::{debug, info};

/// Builds and installs one package at a time
pub trait Installer {
    fn install(&mut self, env: &Environment, path: &ImportPath) -> Result<()>;
}

/// Installs through the toolchain driver (`go install <path>`)
#[derive(Debug, Clone)]
pub struct ToolchainInstaller {
    runner: CommandRunner,
}

impl ToolchainInstaller {
    pub fn from_config(config: &Config) -> Self {
        let mut runner = CommandRunner::new(config.build_command.clone(), config.build_timeout())
            .with_env("GOPATH", config.workspace.to_string_lossy());
        if let Some(root) = &config.toolchain_root {
            runner = runner.with_env("GOROOT", root.to_string_lossy());
        }
        Self { runner }
    }
}

impl Installer for ToolchainInstaller {
    fn install(&mut self, env: &Environment, path: &ImportPath) -> Result<()> {
        let bin = env.bin_dir();
        std::fs::create_dir_all(&bin).map_err(|e| Error::Install {
            path: path.to_string(),
            message: format!("cannot create {}: {}", bin.display(), e),
        })?;

        let runner = self
            .runner
            .clone()
            .with_env("GOBIN", bin.to_string_lossy());
        let output = runner
            .run(None, &["install", path.as_str()])
            .map_err(|e| Error::Install {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        if !output.trim().is_empty() {
            debug!("{}: {}", path, output.trim());
        }
        Ok(())
    }
}

/// Outcome of one install run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<ImportPath>,
    pub failed: Vec<ImportPath>,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Install every path in order, recording failures and carrying on
pub fn run_install(
    installer: &mut dyn Installer,
    env: &Environment,
    paths: &[ImportPath],
    diagnostics: &mut Diagnostics,
) -> InstallReport {
    info!(
        "Installing {} package(s) into environment '{}' ({})",
        paths.len(),
        env.name,
        env.root.display()
    );
    let mut report = InstallReport::default();
    for path in paths {
        debug!("Installing {}", path);
        match installer.install(env, path) {
            Ok(()) => report.installed.push(path.clone()),
            Err(err) => {
                diagnostics.record(err);
                report.failed.push(path.clone());
            }
        }
    }
    info!(
        "Installed {} of {} package(s)",
        report.installed.len(),
        paths.len()
    );
    report
}
