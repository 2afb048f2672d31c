// src/vcs/svn.rs

//! Subversion backend
//!
//! Assumes the conventional layout: `^/trunk` for the default line and
//! `^/tags/<tag>` for tags. Tag sync is an `svn switch` inside the working
//! copy, which is a no-op when already switched.

use super::{Vcs, VcsResult, ensure_parent};
use crate::process::CommandRunner;
use std::path::Path;
use std::time::Duration;

/// Centralized backend driving the `svn` command
#[derive(Debug, Clone)]
pub struct Subversion {
    runner: CommandRunner,
}

impl Subversion {
    pub fn new(timeout: Duration) -> Self {
        Self {
            runner: CommandRunner::new("svn", timeout),
        }
    }
}

/// Map a repository-relative URL (`^/tags/v1/sub`) to the line it is on
fn line_of(relative_url: &str) -> String {
    let rest = relative_url.trim_start_matches('^').trim_start_matches('/');
    let mut parts = rest.split('/');
    match (parts.next(), parts.next()) {
        (Some("tags"), Some(tag)) | (Some("branches"), Some(tag)) => tag.to_string(),
        (Some(first), _) if !first.is_empty() => first.to_string(),
        _ => "trunk".to_string(),
    }
}

impl Vcs for Subversion {
    fn name(&self) -> &str {
        "svn"
    }

    fn create(&self, dir: &Path, repo: &str) -> VcsResult<()> {
        ensure_parent(dir)?;
        let target = dir.to_string_lossy().into_owned();
        self.runner
            .run(None, &["checkout", "--quiet", "--non-interactive", repo, target.as_str()])?;
        Ok(())
    }

    fn update(&self, dir: &Path) -> VcsResult<()> {
        self.runner
            .run(Some(dir), &["update", "--quiet", "--non-interactive"])?;
        Ok(())
    }

    fn tag_sync(&self, dir: &Path, tag: &str) -> VcsResult<()> {
        let target = if tag.is_empty() {
            "^/trunk".to_string()
        } else {
            format!("^/tags/{tag}")
        };
        self.runner
            .run(Some(dir), &["switch", "--quiet", "--non-interactive", target.as_str()])?;
        Ok(())
    }

    fn info(&self, dir: &Path) -> VcsResult<String> {
        let relative = self
            .runner
            .run(Some(dir), &["info", "--show-item", "relative-url"])?;
        Ok(line_of(&relative))
    }
}
