// src/vcs/hg.rs

//! Mercurial backend

use super::{Vcs, VcsResult, ensure_parent};
use crate::process::CommandRunner;
use std::path::Path;
use std::time::Duration;

/// Distributed backend driving the `hg` command
#[derive(Debug, Clone)]
pub struct Mercurial {
    runner: CommandRunner,
}

impl Mercurial {
    pub fn new(timeout: Duration) -> Self {
        Self {
            runner: CommandRunner::new("hg", timeout).with_env("HGPLAIN", "1"),
        }
    }
}

impl Vcs for Mercurial {
    fn name(&self) -> &str {
        "hg"
    }

    fn create(&self, dir: &Path, repo: &str) -> VcsResult<()> {
        ensure_parent(dir)?;
        let target = dir.to_string_lossy().into_owned();
        self.runner.run(None, &["clone", "--quiet", "-U", repo, target.as_str()])?;
        self.runner.run(Some(dir), &["update", "--quiet", "default"])?;
        Ok(())
    }

    fn update(&self, dir: &Path) -> VcsResult<()> {
        self.runner.run(Some(dir), &["pull", "--quiet"])?;
        Ok(())
    }

    fn tag_sync(&self, dir: &Path, tag: &str) -> VcsResult<()> {
        let rev = if tag.is_empty() { "default" } else { tag };
        self.runner.run(Some(dir), &["update", "--quiet", "-r", rev])?;
        Ok(())
    }

    fn info(&self, dir: &Path) -> VcsResult<String> {
        let tags = self.runner.run(Some(dir), &["log", "-r", ".", "--template", "{tags}"])?;
        if let Some(tag) = tags.split_whitespace().find(|t| *t != "tip") {
            return Ok(tag.to_string());
        }
        self.runner.run(Some(dir), &["identify", "--branch"])
    }
}
