// src/config.rs

//! Tool configuration
//!
//! The core never reads environment variables. `main` assembles a [`Config`]
//! from the config file, `GOPATH`/`GOROOT` and command-line overrides, and
//! hands the finished value down. A toolchain root that none of those name is
//! asked of the build command (`go env GOROOT`).
//!
//! # Example config.toml
//!
//! ```toml
//! workspace = "/home/me/go"
//! toolchain_root = "/usr/lib/go"
//! default_environment = "default"
//! vcs_timeout_secs = 300
//!
//! [environments]
//! staging = "/srv/envs/staging"
//!
//! [[repo]]
//! prefix = "corp.example/tools"
//! vcs = "git"
//! url = "ssh://git@git.corp.example/tools.git"
//! ```

use crate::error::{Error, Result};
use crate::process::CommandRunner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Name of the environment used when `-e` is not given
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Static mapping from an import path prefix to a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRule {
    /// Import path of the repository root
    pub prefix: String,
    /// Backend name (`git`, `hg`, `svn`)
    pub vcs: String,
    /// Repository identifier handed to the backend
    pub url: String,
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source workspace; packages live under `<workspace>/src`
    pub workspace: PathBuf,

    /// Toolchain root; standard packages live under `<toolchain_root>/src`
    pub toolchain_root: Option<PathBuf>,

    /// Parent directory for environments without an explicit root
    pub environments_dir: PathBuf,

    /// Environment used when none is named
    pub default_environment: String,

    /// Named environments (name -> root)
    pub environments: BTreeMap<String, PathBuf>,

    /// Deadline for a single VCS command
    pub vcs_timeout_secs: u64,

    /// Deadline for building and installing one package
    pub build_timeout_secs: u64,

    /// Toolchain driver invoked as `<build_command> install <path>`
    pub build_command: String,

    /// Repository rules, longest prefix wins
    #[serde(rename = "repo")]
    pub repos: Vec<RepoRule>,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let data = dirs::data_local_dir().unwrap_or_else(|| home.join(".local/share"));
        Self {
            workspace: home.join("go"),
            toolchain_root: None,
            environments_dir: data.join("gopkg").join("envs"),
            default_environment: DEFAULT_ENVIRONMENT.to_string(),
            environments: BTreeMap::new(),
            vcs_timeout_secs: 300,
            build_timeout_secs: 600,
            build_command: "go".to_string(),
            repos: Vec::new(),
        }
    }
}

/// Values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workspace: Option<PathBuf>,
    pub toolchain_root: Option<PathBuf>,
}

/// A named installation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub root: PathBuf,
}

impl Environment {
    /// Directory receiving installed commands
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("gopkg").join("config.toml"))
    }

    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load an explicit config file, or the default one when it exists
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply overrides and validate the result
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(ws) = overrides.workspace {
            self.workspace = ws;
        }
        if let Some(root) = overrides.toolchain_root {
            self.toolchain_root = Some(root);
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject configurations the tool cannot work with
    pub fn validate(&self) -> Result<()> {
        let ws = self.workspace.to_string_lossy();
        if ws.starts_with('~') {
            return Err(Error::Config(format!(
                "workspace cannot start with shell metacharacter '~': {ws:?}"
            )));
        }
        if !self.workspace.is_absolute() {
            return Err(Error::Config(format!(
                "workspace is relative; must be absolute path: {ws:?}"
            )));
        }
        if let Some(root) = &self.toolchain_root {
            if root == &self.workspace {
                warn!(
                    "workspace set to toolchain root ({}) has no effect",
                    root.display()
                );
            }
            if !root.is_dir() {
                return Err(Error::Config(format!(
                    "cannot find toolchain root directory: {}",
                    root.display()
                )));
            }
        }
        for rule in &self.repos {
            if rule.prefix.trim_matches('/').is_empty() || rule.url.is_empty() {
                return Err(Error::Config(format!(
                    "repository rule needs a prefix and a url: {rule:?}"
                )));
            }
        }
        Ok(())
    }

    /// Ask the build command for its toolchain root when none is configured
    ///
    /// Leaves the root unset when the command is missing or gives no usable
    /// directory; standard packages are then recognized by their first
    /// path element alone.
    pub fn discover_toolchain_root(&mut self) {
        if self.toolchain_root.is_some() {
            return;
        }
        let runner = CommandRunner::new(self.build_command.as_str(), self.vcs_timeout());
        let Some(program) = runner.locate() else {
            debug!("'{}' not found on PATH; toolchain root unknown", self.build_command);
            return;
        };
        match runner.run(None, &["env", "GOROOT"]) {
            Ok(out) => {
                let root = PathBuf::from(out);
                if root.is_absolute() && root.is_dir() {
                    debug!("Toolchain root {} from {}", root.display(), program.display());
                    self.toolchain_root = Some(root);
                } else {
                    warn!("'{} env GOROOT' gave no usable directory", self.build_command);
                }
            }
            Err(err) => warn!("Cannot query toolchain root: {}", err),
        }
    }

    /// Root of the package source tree
    pub fn src_root(&self) -> PathBuf {
        self.workspace.join("src")
    }

    pub fn vcs_timeout(&self) -> Duration {
        Duration::from_secs(self.vcs_timeout_secs)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    /// Resolve an environment name, falling back to the default one
    pub fn environment(&self, name: Option<&str>) -> Result<Environment> {
        let name = name.unwrap_or(&self.default_environment);
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.chars().any(char::is_whitespace)
        {
            return Err(Error::Usage(format!("invalid environment name \"{name}\"")));
        }
        let root = self
            .environments
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.environments_dir.join(name));
        Ok(Environment {
            name: name.to_string(),
            root,
        })
    }
}
