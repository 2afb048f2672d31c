// src/vcs/mod.rs

//! Version-control backends
//!
//! The walker only sees the [`Vcs`] capability set and looks backends up by
//! name in a [`VcsRegistry`]; it never special-cases one. Shipped backends:
//!
//! - `git` and `hg` (distributed)
//! - `svn` (centralized, tags live under `^/tags/<tag>`)
//!
//! All of them shell out through [`crate::process::CommandRunner`], so every
//! call is bounded by the configured VCS timeout.

mod git;
mod hg;
mod svn;

pub use git::Git;
pub use hg::Mercurial;
pub use svn::Subversion;

use crate::process::CommandError;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Result of a backend operation
pub type VcsResult<T> = std::result::Result<T, CommandError>;

/// Capability set every backend provides
pub trait Vcs {
    /// Backend name as used in repository rules (`git`, `hg`, `svn`)
    fn name(&self) -> &str;

    /// Fetch `repo` into the not-yet-existing directory `dir`
    fn create(&self, dir: &Path, repo: &str) -> VcsResult<()>;

    /// Pull upstream changes into an existing checkout
    fn update(&self, dir: &Path) -> VcsResult<()>;

    /// Switch the checkout to `tag`; an empty tag means the default branch
    ///
    /// Must be idempotent: syncing to the current tag succeeds without change.
    fn tag_sync(&self, dir: &Path, tag: &str) -> VcsResult<()>;

    /// Tag (or branch/revision when untagged) the checkout is on
    fn info(&self, dir: &Path) -> VcsResult<String>;
}

/// Backends keyed by name
#[derive(Default)]
pub struct VcsRegistry {
    backends: BTreeMap<String, Box<dyn Vcs>>,
}

impl VcsRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the git, hg and svn backends
    pub fn with_defaults(timeout: Duration) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Git::new(timeout)));
        registry.register(Box::new(Mercurial::new(timeout)));
        registry.register(Box::new(Subversion::new(timeout)));
        registry
    }

    /// Add or replace a backend
    pub fn register(&mut self, backend: Box<dyn Vcs>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Vcs> {
        self.backends.get(name).map(|b| b.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for VcsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcsRegistry")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Backend name implied by a repository identifier
///
/// Used for `-r` overrides, where no rule says which backend to use.
pub fn detect_from_repo(repo: &str) -> &'static str {
    if let Ok(url) = url::Url::parse(repo) {
        match url.scheme() {
            "svn" | "svn+ssh" => return "svn",
            "hg" => return "hg",
            _ => {}
        }
    }
    let trimmed = repo.trim_end_matches('/');
    if trimmed.ends_with(".hg") {
        "hg"
    } else if trimmed.ends_with(".svn") || trimmed.ends_with("/trunk") {
        "svn"
    } else {
        "git"
    }
}

fn ensure_parent(dir: &Path) -> VcsResult<()> {
    if let Some(parent) = dir.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CommandError::Wait {
            command: format!("mkdir {}", parent.display()),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_names() {
        let registry = VcsRegistry::with_defaults(Duration::from_secs(1));
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["git", "hg", "svn"]);
        assert!(registry.get("git").is_some());
        assert!(registry.get("cvs").is_none());
    }

    #[test]
    fn test_detect_from_repo() {
        assert_eq!(detect_from_repo("https://github.com/u/r.git"), "git");
        assert_eq!(detect_from_repo("svn://svn.example.org/proj/trunk"), "svn");
        assert_eq!(detect_from_repo("https://example.org/proj/trunk/"), "svn");
        assert_eq!(detect_from_repo("https://hg.example.org/repo.hg"), "hg");
        assert_eq!(detect_from_repo("/srv/mirrors/repo"), "git");
    }
}
