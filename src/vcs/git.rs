// src/vcs/git.rs

//! Git backend

use super::{Vcs, VcsResult, ensure_parent};
use crate::process::CommandRunner;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Distributed backend driving the `git` command
#[derive(Debug, Clone)]
pub struct Git {
    runner: CommandRunner,
}

impl Git {
    pub fn new(timeout: Duration) -> Self {
        Self {
            runner: CommandRunner::new("git", timeout).with_env("GIT_TERMINAL_PROMPT", "0"),
        }
    }

    /// Branch that `origin/HEAD` points at, `master` when unknown
    fn default_branch(&self, dir: &Path) -> String {
        self.runner
            .run(Some(dir), &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])
            .ok()
            .and_then(|r| r.strip_prefix("origin/").map(str::to_string))
            .unwrap_or_else(|| "master".to_string())
    }

    fn on_branch(&self, dir: &Path) -> bool {
        self.runner
            .run(Some(dir), &["symbolic-ref", "-q", "HEAD"])
            .is_ok()
    }
}

impl Vcs for Git {
    fn name(&self) -> &str {
        "git"
    }

    fn create(&self, dir: &Path, repo: &str) -> VcsResult<()> {
        ensure_parent(dir)?;
        let target = dir.to_string_lossy().into_owned();
        self.runner.run(None, &["clone", "--quiet", repo, target.as_str()])?;
        Ok(())
    }

    fn update(&self, dir: &Path) -> VcsResult<()> {
        self.runner.run(Some(dir), &["fetch", "--quiet", "--tags", "origin"])?;
        // A detached checkout (synced to a tag) has nothing to fast-forward.
        if self.on_branch(dir) {
            self.runner.run(Some(dir), &["pull", "--quiet", "--ff-only"])?;
        }
        Ok(())
    }

    fn tag_sync(&self, dir: &Path, tag: &str) -> VcsResult<()> {
        let target = if tag.is_empty() {
            self.default_branch(dir)
        } else {
            tag.to_string()
        };
        debug!("git: {} -> {}", dir.display(), target);
        self.runner.run(Some(dir), &["checkout", "--quiet", target.as_str()])?;
        Ok(())
    }

    fn info(&self, dir: &Path) -> VcsResult<String> {
        if let Ok(tag) = self
            .runner
            .run(Some(dir), &["describe", "--tags", "--exact-match", "HEAD"])
        {
            return Ok(tag);
        }
        let branch = self.runner.run(Some(dir), &["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch != "HEAD" {
            return Ok(branch);
        }
        self.runner.run(Some(dir), &["rev-parse", "--short", "HEAD"])
    }
}
