// src/repository.rs

//! Import path to repository resolution
//!
//! # Resolution order
//!
//! 1. A `-r` override (only for packages named on the command line)
//! 2. Configured `[[repo]]` rules, longest prefix first
//! 3. Well-known hosting sites (`github.com/<user>/<repo>` and friends)
//! 4. A path element ending in `.git`, `.hg` or `.svn`
//!
//! The repository root is itself an import path; the checkout lives at
//! `<workspace>/src/<root>` and may hold several packages.

use crate::config::RepoRule;
use crate::import_path::ImportPath;
use crate::vcs;
use regex::Regex;
use std::sync::LazyLock;

static HOSTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(github\.com|gitlab\.com|bitbucket\.org)/[A-Za-z0-9_.\-]+/[A-Za-z0-9_.\-]+")
        .expect("static regex")
});

/// Where a package's source comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRoot {
    /// Backend name
    pub vcs: String,
    /// Repository identifier handed to the backend
    pub repo: String,
    /// Import path of the repository root
    pub root: String,
}

/// Resolves import paths against rules and known hosts
#[derive(Debug, Clone, Copy)]
pub struct RepoResolver<'a> {
    rules: &'a [RepoRule],
}

impl<'a> RepoResolver<'a> {
    pub fn new(rules: &'a [RepoRule]) -> Self {
        Self { rules }
    }

    /// Resolve the repository holding `path`
    ///
    /// The error string is suitable for a VCS error against `path`.
    pub fn resolve(&self, path: &ImportPath, override_repo: Option<&str>) -> Result<RepoRoot, String> {
        let found = self.from_rules(path).or_else(|| from_known_layout(path));

        if let Some(repo) = override_repo {
            let root = found
                .as_ref()
                .map(|r| r.root.clone())
                .unwrap_or_else(|| path.to_string());
            return Ok(RepoRoot {
                vcs: vcs::detect_from_repo(repo).to_string(),
                repo: repo.to_string(),
                root,
            });
        }

        found.ok_or_else(|| format!("unrecognized import path \"{path}\" (no repository rule matches)"))
    }

    fn from_rules(&self, path: &ImportPath) -> Option<RepoRoot> {
        self.rules
            .iter()
            .filter(|rule| path.has_prefix(&rule.prefix))
            .max_by_key(|rule| rule.prefix.trim_end_matches('/').len())
            .map(|rule| RepoRoot {
                vcs: rule.vcs.clone(),
                repo: rule.url.clone(),
                root: rule.prefix.trim_end_matches('/').to_string(),
            })
    }
}

fn from_known_layout(path: &ImportPath) -> Option<RepoRoot> {
    if let Some(m) = HOSTED.find(path.as_str()) {
        let root = m.as_str();
        if path.has_prefix(root) {
            return Some(RepoRoot {
                vcs: "git".to_string(),
                repo: format!("https://{root}"),
                root: root.to_string(),
            });
        }
    }

    let mut root = String::new();
    for elem in path.elements() {
        if !root.is_empty() {
            root.push('/');
        }
        root.push_str(elem);
        for (suffix, vcs) in [(".git", "git"), (".hg", "hg"), (".svn", "svn")] {
            if elem.len() > suffix.len() && elem.ends_with(suffix) {
                return Some(RepoRoot {
                    vcs: vcs.to_string(),
                    repo: format!("https://{root}"),
                    root,
                });
            }
        }
    }
    None
}
