// tests/common/mod.rs

//! Shared fixtures for integration tests.
//!
//! A [`Fixture`] lays out a workspace, a toolchain root with a couple of
//! standard packages, and a directory of "remote" repositories. The
//! [`FakeVcs`] backend materializes a remote by copying it, and logs every
//! call so tests can check what the walker asked for.

#![allow(dead_code)]

use gopkg::process::CommandError;
use gopkg::vcs::VcsResult;
use gopkg::{Config, Environment, Error, ImportPath, Installer, RepoRule, Vcs, VcsRegistry};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Everything the fake backend did
#[derive(Debug, Default)]
pub struct VcsLog {
    /// `create <root>`, `update <root>`, `tag <root> <tag>` in call order
    pub calls: Vec<String>,
    /// Current tag per checkout directory
    pub tags: HashMap<PathBuf, String>,
    /// Remote directories whose checkout fails
    pub failing: HashSet<PathBuf>,
}

/// Backend that copies a local directory tree
pub struct FakeVcs {
    name: &'static str,
    src_root: PathBuf,
    log: Rc<RefCell<VcsLog>>,
}

impl FakeVcs {
    fn rel(&self, dir: &Path) -> String {
        dir.strip_prefix(&self.src_root)
            .unwrap_or(dir)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl Vcs for FakeVcs {
    fn name(&self) -> &str {
        self.name
    }

    fn create(&self, dir: &Path, repo: &str) -> VcsResult<()> {
        let mut log = self.log.borrow_mut();
        log.calls.push(format!("create {}", self.rel(dir)));
        let remote = PathBuf::from(repo);
        if log.failing.contains(&remote) || !remote.is_dir() {
            return Err(CommandError::Failed {
                command: format!("fake clone {repo}"),
                code: 128,
                stderr: format!("repository '{repo}' not found"),
            });
        }
        copy_tree(&remote, dir);
        Ok(())
    }

    fn update(&self, dir: &Path) -> VcsResult<()> {
        self.log
            .borrow_mut()
            .calls
            .push(format!("update {}", self.rel(dir)));
        Ok(())
    }

    fn tag_sync(&self, dir: &Path, tag: &str) -> VcsResult<()> {
        let mut log = self.log.borrow_mut();
        log.calls.push(format!("tag {} {}", self.rel(dir), tag));
        log.tags.insert(dir.to_path_buf(), tag.to_string());
        Ok(())
    }

    fn info(&self, dir: &Path) -> VcsResult<String> {
        Ok(self.log.borrow().tags.get(dir).cloned().unwrap_or_default())
    }
}

fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Workspace, toolchain and remotes under one temp directory
pub struct Fixture {
    pub temp: TempDir,
    pub config: Config,
    pub remotes: PathBuf,
    pub log: Rc<RefCell<VcsLog>>,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();

        let toolchain = root.join("goroot");
        for std_pkg in ["fmt", "os", "net/http"] {
            fs::create_dir_all(toolchain.join("src").join(std_pkg)).unwrap();
        }

        let config = Config {
            workspace: root.join("ws"),
            toolchain_root: Some(toolchain),
            environments_dir: root.join("envs"),
            ..Config::default()
        };

        Self {
            temp,
            config,
            remotes: root.join("remotes"),
            log: Rc::new(RefCell::new(VcsLog::default())),
        }
    }

    /// Remote location of an import path
    pub fn remote(&self, path: &str) -> PathBuf {
        self.remotes.join(path)
    }

    /// Declare a repository rooted at `root`
    pub fn repo(&mut self, root: &str) -> PathBuf {
        let remote = self.remote(root);
        fs::create_dir_all(&remote).unwrap();
        if !self.config.repos.iter().any(|r| r.prefix == root) {
            self.config.repos.push(RepoRule {
                prefix: root.to_string(),
                vcs: "fake".to_string(),
                url: remote.display().to_string(),
            });
        }
        remote
    }

    /// Write a package importing `imports`
    ///
    /// The package gets its own repository unless an existing one covers it.
    pub fn package(&mut self, path: &str, imports: &[&str]) {
        let ip = ImportPath::parse(path).unwrap();
        if !self.config.repos.iter().any(|r| ip.has_prefix(&r.prefix)) {
            self.repo(path);
        }
        let dir = self.remote(path);
        fs::create_dir_all(&dir).unwrap();

        let name = path.rsplit('/').next().unwrap();
        let mut src = format!("// Package {name} is a fixture.\npackage {name}\n\n");
        match imports {
            [] => {}
            [one] => src.push_str(&format!("import \"{one}\"\n")),
            many => {
                src.push_str("import (\n");
                for import in many {
                    src.push_str(&format!("\t\"{import}\"\n"));
                }
                src.push_str(")\n");
            }
        }
        src.push_str("\nfunc Hello() {}\n");
        fs::write(dir.join(format!("{name}.go")), src).unwrap();
    }

    /// Write a `GOENV` manifest for a package
    pub fn manifest(&self, path: &str, text: &str) {
        fs::write(self.remote(path).join("GOENV"), text).unwrap();
    }

    /// Make checkouts of the repository at `root` fail
    pub fn fail_repo(&self, root: &str) {
        self.log.borrow_mut().failing.insert(self.remote(root));
    }

    /// Registry with the fake backend, also standing in for `git`
    pub fn registry(&self) -> VcsRegistry {
        let mut registry = VcsRegistry::new();
        for name in ["fake", "git"] {
            registry.register(Box::new(FakeVcs {
                name,
                src_root: self.config.src_root(),
                log: Rc::clone(&self.log),
            }));
        }
        registry
    }

    /// Workspace checkout of an import path
    pub fn checkout(&self, path: &str) -> PathBuf {
        ImportPath::parse(path).unwrap().to_dir(&self.config.src_root())
    }

    pub fn tag_of(&self, path: &str) -> Option<String> {
        self.log.borrow().tags.get(&self.checkout(path)).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().calls.clear();
    }

    pub fn environment(&self, name: &str) -> Environment {
        self.config.environment(Some(name)).unwrap()
    }
}

/// Installer that records paths and drops a marker file per package
#[derive(Debug, Default)]
pub struct FakeInstaller {
    pub installed: Vec<String>,
    pub failing: HashSet<String>,
}

impl FakeInstaller {
    pub fn failing_on(paths: &[&str]) -> Self {
        Self {
            installed: Vec::new(),
            failing: paths.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Installer for FakeInstaller {
    fn install(&mut self, env: &Environment, path: &ImportPath) -> gopkg::Result<()> {
        if self.failing.contains(path.as_str()) {
            return Err(Error::Install {
                path: path.to_string(),
                message: "exit status 2".to_string(),
            });
        }
        let bin = env.bin_dir();
        fs::create_dir_all(&bin)?;
        fs::write(bin.join(path.as_str().replace('/', "_")), b"")?;
        self.installed.push(path.to_string());
        Ok(())
    }
}

/// Owned argument list
pub fn args(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

pub fn ip(path: &str) -> ImportPath {
    ImportPath::parse(path).unwrap()
}
