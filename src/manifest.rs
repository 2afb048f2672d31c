// src/manifest.rs

//! Per-package version manifest and tag precedence
//!
//! A package may carry a `GOENV` file in its own directory pinning tags for
//! its direct dependencies:
//!
//! ```toml
//! "pkg/z" = "v1.0"
//! "github.com/user/lib" = "release-2"
//! ```
//!
//! The effective tag of a visited package is, highest first: the command-line
//! tag when the package was named on the command line, the pin in the parent
//! package's manifest, or nothing (the repository default).

use crate::error::{Error, Result};
use crate::import_path::ImportPath;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// File name of the per-package manifest
pub const MANIFEST_FILE: &str = "GOENV";

/// Pinned tags for a package's dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pins: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse manifest text
    ///
    /// The error string describes the first problem found.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let table: toml::Table = toml::from_str(text).map_err(|e| e.message().to_string())?;
        let mut pins = BTreeMap::new();
        for (key, value) in table {
            let path = ImportPath::parse(&key).map_err(|e| e.to_string())?;
            match value {
                toml::Value::String(tag) if !tag.trim().is_empty() => {
                    pins.insert(path.to_string(), tag.trim().to_string());
                }
                toml::Value::String(_) => {
                    return Err(format!("empty tag for \"{key}\""));
                }
                other => {
                    return Err(format!(
                        "tag for \"{key}\" must be a string, found {}",
                        other.type_str()
                    ));
                }
            }
        }
        Ok(Self { pins })
    }

    /// Load the manifest from a package directory
    ///
    /// A missing file is `Ok(None)`.
    pub fn load(dir: &Path, package: &ImportPath) -> Result<Option<Self>> {
        let file = dir.join(MANIFEST_FILE);
        if !file.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&file).map_err(|e| Error::ManifestParse {
            path: package.to_string(),
            message: format!("cannot read {}: {}", file.display(), e),
        })?;
        let manifest = Self::parse(&text).map_err(|message| Error::ManifestParse {
            path: package.to_string(),
            message,
        })?;
        debug!("{}: {} pin(s) from {}", package, manifest.len(), file.display());
        Ok(Some(manifest))
    }

    pub fn pin(&self, path: &str) -> Option<&str> {
        self.pins.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// Where an effective tag came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSource {
    CommandLine,
    Manifest { owner: String },
    Default,
    /// Read back from an existing checkout
    Checkout,
}

impl fmt::Display for TagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandLine => write!(f, "command line"),
            Self::Manifest { owner } => write!(f, "manifest of {owner}"),
            Self::Default => write!(f, "repository default"),
            Self::Checkout => write!(f, "checkout"),
        }
    }
}

/// Effective tag of one visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTag {
    /// `None` means the repository default branch or tip
    pub tag: Option<String>,
    pub source: TagSource,
}

/// Tag precedence for one invocation
#[derive(Debug, Clone, Default)]
pub struct TagPolicy {
    cli_tag: Option<String>,
    named: HashSet<ImportPath>,
}

impl TagPolicy {
    pub fn new(cli_tag: Option<String>) -> Self {
        Self {
            cli_tag: cli_tag.filter(|t| !t.trim().is_empty()),
            named: HashSet::new(),
        }
    }

    /// Mark a path as explicitly named on the command line
    pub fn name(&mut self, path: ImportPath) {
        self.named.insert(path);
    }

    pub fn is_named(&self, path: &ImportPath) -> bool {
        self.named.contains(path)
    }

    /// Effective tag for `path`, visited on behalf of `parent`
    pub fn resolve(&self, path: &ImportPath, parent: Option<(&ImportPath, &Manifest)>) -> ResolvedTag {
        if let Some(tag) = &self.cli_tag {
            if self.is_named(path) {
                return ResolvedTag {
                    tag: Some(tag.clone()),
                    source: TagSource::CommandLine,
                };
            }
        }
        if let Some((owner, manifest)) = parent {
            if let Some(tag) = manifest.pin(path.as_str()) {
                return ResolvedTag {
                    tag: Some(tag.to_string()),
                    source: TagSource::Manifest {
                        owner: owner.to_string(),
                    },
                };
            }
        }
        ResolvedTag {
            tag: None,
            source: TagSource::Default,
        }
    }
}
