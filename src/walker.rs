// src/walker.rs

//! Import graph walker
//!
//! Discovers a package's dependencies from its sources and visits each one
//! exactly once per phase. Two modes share the same traversal:
//!
//! - [`Walker::download`] materializes every visited repository through its
//!   VCS backend (create, optional update, tag sync) before scanning it.
//! - [`Walker::load`] only reads what is already on disk. It backs the
//!   re-expansion that runs after the package cache was cleared.
//!
//! Cycles are caught with an explicit [`ImportStack`]. Entering a package
//! returns a [`StackFrame`] guard that pops the path when dropped, so the
//! stack is balanced on every exit path including `?` returns.
//!
//! Errors do not unwind the walk. A failing dependency is recorded in the
//! [`Diagnostics`] accumulator and its siblings are still visited. A path that
//! already failed in this phase is not retried, so each failure is reported
//! once no matter how many packages import it.

use crate::cache::PackageCache;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::import_path::{self, ImportPath};
use crate::manifest::{Manifest, ResolvedTag, TagPolicy, TagSource};
use crate::package::Package;
use crate::repository::{RepoResolver, RepoRoot};
use crate::scan;
use crate::vcs::{Vcs, VcsRegistry, VcsResult};
use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Import paths on the active recursion path
#[derive(Debug, Default)]
pub struct ImportStack {
    paths: Vec<ImportPath>,
}

impl ImportStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &ImportPath) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn as_slice(&self) -> &[ImportPath] {
        &self.paths
    }

    /// The cycle closed by re-entering `path`, if it is on the stack
    ///
    /// Runs from the first occurrence of `path` to the top, then `path` again.
    pub fn cycle_through(&self, path: &ImportPath) -> Option<Vec<String>> {
        let start = self.paths.iter().position(|p| p == path)?;
        let mut cycle: Vec<String> = self.paths[start..].iter().map(|p| p.to_string()).collect();
        cycle.push(path.to_string());
        Some(cycle)
    }

    /// Push `path`, failing with [`Error::ImportCycle`] when already present
    pub fn enter(&mut self, path: &ImportPath) -> Result<StackFrame<'_>> {
        if let Some(cycle) = self.cycle_through(path) {
            return Err(Error::ImportCycle { cycle });
        }
        self.paths.push(path.clone());
        Ok(StackFrame { stack: self })
    }
}

/// Scoped stack entry; pops its path on drop
#[derive(Debug)]
pub struct StackFrame<'a> {
    stack: &'a mut ImportStack,
}

impl Deref for StackFrame<'_> {
    type Target = ImportStack;

    fn deref(&self) -> &ImportStack {
        self.stack
    }
}

impl DerefMut for StackFrame<'_> {
    fn deref_mut(&mut self) -> &mut ImportStack {
        self.stack
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.stack.paths.pop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Download,
    Load,
}

#[derive(Debug, Clone)]
enum RepoState {
    Synced { tag: Option<String> },
    Failed(String),
}

/// Walks the import graph for one phase
pub struct Walker<'a> {
    config: &'a Config,
    vcs: &'a VcsRegistry,
    cache: &'a mut PackageCache,
    diagnostics: &'a mut Diagnostics,
    policy: TagPolicy,
    repo_override: Option<String>,
    attempted: HashSet<ImportPath>,
    repos: HashMap<String, RepoState>,
    visited: Vec<ImportPath>,
}

impl<'a> Walker<'a> {
    pub fn new(
        config: &'a Config,
        vcs: &'a VcsRegistry,
        cache: &'a mut PackageCache,
        diagnostics: &'a mut Diagnostics,
        policy: TagPolicy,
        repo_override: Option<String>,
    ) -> Self {
        Self {
            config,
            vcs,
            cache,
            diagnostics,
            policy,
            repo_override: repo_override.filter(|r| !r.trim().is_empty()),
            attempted: HashSet::new(),
            repos: HashMap::new(),
            visited: Vec::new(),
        }
    }

    /// Mark a path as named on the command line
    pub fn name(&mut self, path: ImportPath) {
        self.policy.name(path);
    }

    /// Fetch `path` and everything it imports
    ///
    /// Cached dependencies are not revisited unless `force_update` is set.
    pub fn download(
        &mut self,
        path: &ImportPath,
        stack: &mut ImportStack,
        force_update: bool,
    ) -> Result<Package> {
        self.visit(path, stack, None, force_update, Mode::Download)
    }

    /// Resolve `path` and its imports from the workspace without fetching
    pub fn load(&mut self, path: &ImportPath, stack: &mut ImportStack) -> Result<Package> {
        self.visit(path, stack, None, false, Mode::Load)
    }

    /// Materialize the repository holding `path` without scanning it
    ///
    /// Used for wildcard arguments whose packages are only known once the
    /// repository is on disk.
    pub fn fetch(&mut self, path: &ImportPath, force_update: bool) -> Result<RepoRoot> {
        let resolved = self.policy.resolve(path, None);
        self.materialize(path, resolved.tag.as_deref(), force_update)
    }

    /// Record an error raised outside a visit
    pub fn report(&mut self, err: Error) {
        self.diagnostics.record(err);
    }

    /// Successfully visited packages in discovery order
    pub fn visited(&self) -> Vec<ImportPath> {
        self.visited
            .iter()
            .filter(|p| self.cache.contains(p))
            .cloned()
            .collect()
    }

    fn visit(
        &mut self,
        path: &ImportPath,
        stack: &mut ImportStack,
        parent: Option<(&ImportPath, &Manifest)>,
        force_update: bool,
        mode: Mode,
    ) -> Result<Package> {
        let mut frame = stack.enter(path)?;

        if !self.attempted.insert(path.clone()) {
            return match self.cache.get(path) {
                Some(pkg) => Ok(pkg.clone()),
                None => Err(Error::Unresolved {
                    path: path.to_string(),
                }),
            };
        }
        self.visited.push(path.clone());

        let (repo, resolved) = match mode {
            Mode::Download => {
                let resolved = self.policy.resolve(path, parent);
                let repo = self.materialize(path, resolved.tag.as_deref(), force_update)?;
                (Some(repo), resolved)
            }
            Mode::Load => self.inspect(path),
        };
        debug!(
            "Visiting {} (tag {} from {}, depth {})",
            path,
            resolved.tag.as_deref().unwrap_or("default"),
            resolved.source,
            frame.len()
        );

        let dir = path.to_dir(&self.config.src_root());
        if !dir.is_dir() {
            return Err(Error::PackageNotFound {
                path: path.to_string(),
                dir: dir.display().to_string(),
            });
        }

        let manifest = match Manifest::load(&dir, path) {
            Ok(found) => found.unwrap_or_default(),
            Err(err) => {
                self.diagnostics.record(err);
                Manifest::default()
            }
        };

        let sources = scan::scan_package(&dir)?;
        if sources.files.is_empty() {
            return Err(Error::NoSources {
                path: path.to_string(),
                dir: dir.display().to_string(),
            });
        }

        let imports = self.dependencies(path, &sources.imports);
        for dep in &imports {
            if !force_update && self.cache.contains(dep) {
                continue;
            }
            if let Err(err) = self.visit(dep, &mut frame, Some((path, &manifest)), force_update, mode) {
                self.diagnostics.record(err);
            }
        }

        let record = Package {
            import_path: path.clone(),
            repo,
            tag: resolved.tag,
            tag_source: resolved.source,
            dir,
            imports,
            manifest,
        };
        self.cache.put(path.clone(), record.clone());
        Ok(record)
    }

    /// Non-standard, non-local imports as import paths
    fn dependencies(&mut self, path: &ImportPath, raw: &[String]) -> Vec<ImportPath> {
        let toolchain = self.config.toolchain_root.as_deref();
        let mut deps = Vec::new();
        for import in raw {
            if import_path::is_local_import(import) || import_path::is_standard(import, toolchain) {
                continue;
            }
            match ImportPath::parse(import) {
                Ok(dep) => {
                    if !deps.contains(&dep) {
                        deps.push(dep);
                    }
                }
                Err(_) => self.diagnostics.record(Error::BadImport {
                    path: path.to_string(),
                    import: import.clone(),
                }),
            }
        }
        deps
    }

    /// Create, update and tag-sync the repository of `path`, once per phase
    fn materialize(
        &mut self,
        path: &ImportPath,
        tag: Option<&str>,
        force_update: bool,
    ) -> Result<RepoRoot> {
        let override_repo = if self.policy.is_named(path) {
            self.repo_override.as_deref()
        } else {
            None
        };
        let repo = RepoResolver::new(&self.config.repos)
            .resolve(path, override_repo)
            .map_err(|message| Error::Vcs {
                path: path.to_string(),
                message,
            })?;

        match self.repos.get(&repo.root) {
            Some(RepoState::Synced { tag: synced }) => {
                if synced.as_deref() != tag {
                    warn!(
                        "{}: repository {} already synced to {}; ignoring {}",
                        path,
                        repo.root,
                        synced.as_deref().unwrap_or("default"),
                        tag.unwrap_or("default")
                    );
                }
                return Ok(repo);
            }
            Some(RepoState::Failed(message)) => {
                return Err(Error::Vcs {
                    path: path.to_string(),
                    message: format!("repository {} unavailable: {}", repo.root, message),
                });
            }
            None => {}
        }

        let vcs: &'a VcsRegistry = self.vcs;
        let backend = vcs.get(&repo.vcs).ok_or_else(|| Error::Vcs {
            path: path.to_string(),
            message: format!("unknown version control system \"{}\"", repo.vcs),
        })?;

        let dir = root_dir(&self.config.src_root(), &repo.root);
        match sync_repo(backend, &dir, &repo, tag, force_update) {
            Ok(()) => {
                self.repos.insert(
                    repo.root.clone(),
                    RepoState::Synced {
                        tag: tag.map(str::to_string),
                    },
                );
                Ok(repo)
            }
            Err(err) => {
                let message = err.to_string();
                self.repos
                    .insert(repo.root.clone(), RepoState::Failed(message.clone()));
                Err(Error::Vcs {
                    path: path.to_string(),
                    message,
                })
            }
        }
    }

    /// Repository and current tag of an existing checkout
    fn inspect(&self, path: &ImportPath) -> (Option<RepoRoot>, ResolvedTag) {
        let override_repo = if self.policy.is_named(path) {
            self.repo_override.as_deref()
        } else {
            None
        };
        let repo = RepoResolver::new(&self.config.repos)
            .resolve(path, override_repo)
            .ok();

        let tag = repo.as_ref().and_then(|r| {
            let backend = self.vcs.get(&r.vcs)?;
            let dir = root_dir(&self.config.src_root(), &r.root);
            if !dir.is_dir() {
                return None;
            }
            match backend.info(&dir) {
                Ok(tag) if !tag.is_empty() => Some(tag),
                Ok(_) => None,
                Err(err) => {
                    debug!("{}: cannot read checkout state: {}", path, err);
                    None
                }
            }
        });

        let source = if tag.is_some() {
            TagSource::Checkout
        } else {
            TagSource::Default
        };
        (repo, ResolvedTag { tag, source })
    }
}

/// Checkout directory of a repository root
fn root_dir(src_root: &Path, root: &str) -> PathBuf {
    let mut dir = src_root.to_path_buf();
    for elem in root.split('/').filter(|e| !e.is_empty()) {
        dir.push(elem);
    }
    dir
}

fn is_checked_out(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn sync_repo(
    backend: &dyn Vcs,
    dir: &Path,
    repo: &RepoRoot,
    tag: Option<&str>,
    force_update: bool,
) -> VcsResult<()> {
    if is_checked_out(dir) {
        if force_update {
            info!("Updating {} ({})", repo.root, backend.name());
            backend.update(dir)?;
        }
    } else {
        info!("Fetching {} from {} ({})", repo.root, repo.repo, backend.name());
        backend.create(dir, &repo.repo)?;
    }
    if let Some(tag) = tag {
        info!("Switching {} to {}", repo.root, tag);
    }
    backend.tag_sync(dir, tag.unwrap_or(""))
}
