// src/orchestrator.rs

//! Phase sequencing for `get`
//!
//! ```text
//! Idle -> Downloading -> CacheInvalidated -> PathsReexpanded -> Installing -> Done
//!              |                                   |
//!              +-------------> Aborted <-----------+
//! ```
//!
//! Each gate checks the accumulated [`Diagnostics`]. A run that fails while
//! downloading never touches the install environment. The package cache is
//! cleared after downloading whether or not it succeeded, since records built
//! from a partial walk must not be served later. Download-only runs stop at
//! `PathsReexpanded`, after the re-expansion had its chance to report errors.

use crate::cache::PackageCache;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::import_path::{self, DownloadTarget, ImportPath};
use crate::install::{self, InstallReport, Installer};
use crate::manifest::TagPolicy;
use crate::vcs::VcsRegistry;
use crate::walker::{ImportStack, Walker};
use strum_macros::{Display, EnumIter};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Phase {
    Idle,
    Downloading,
    CacheInvalidated,
    PathsReexpanded,
    Installing,
    Done,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Options of one `get` invocation
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Repository override for the named packages (`-r`)
    pub repo: Option<String>,
    /// Target environment (`-e`); the configured default when `None`
    pub environment: Option<String>,
    /// Tag override for the named packages (`-t`)
    pub tag: Option<String>,
    /// Stop before installing (`-d`)
    pub download_only: bool,
    /// Re-sync checkouts that already exist (`-u`)
    pub update: bool,
}

/// Result of a run that got past argument validation
#[derive(Debug)]
pub struct GetOutcome {
    /// Phase the run stopped in
    pub phase: Phase,
    pub diagnostics: Diagnostics,
    /// Packages resolved while downloading, in discovery order
    pub downloaded: Vec<ImportPath>,
    /// Cache records dropped after downloading
    pub evicted: usize,
    /// Paths handed to the installer
    pub install_list: Vec<ImportPath>,
    pub report: InstallReport,
}

impl GetOutcome {
    pub fn exit_code(&self) -> u8 {
        self.diagnostics.exit_code()
    }
}

/// Runs the download, invalidate, re-expand and install phases
pub struct Orchestrator<'a> {
    config: &'a Config,
    vcs: &'a VcsRegistry,
    installer: &'a mut dyn Installer,
    cache: PackageCache,
    phase: Phase,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config, vcs: &'a VcsRegistry, installer: &'a mut dyn Installer) -> Self {
        Self {
            config,
            vcs,
            installer,
            cache: PackageCache::new(),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cache(&self) -> &PackageCache {
        &self.cache
    }

    /// Run `get` over `args`
    ///
    /// Returns `Err` only for usage problems found before any phase starts.
    /// Everything after that is reported through [`GetOutcome::diagnostics`].
    pub fn run(&mut self, args: &[String], opts: &GetOptions) -> Result<GetOutcome> {
        if args.is_empty() {
            return Err(Error::Usage("no import paths given".to_string()));
        }
        let env = self.config.environment(opts.environment.as_deref())?;
        let src_root = self.config.src_root();
        let targets = import_path::download_paths(args, &src_root)?;

        let mut diagnostics = Diagnostics::new();

        // Phase 1: download
        self.enter(Phase::Downloading);
        let downloaded = {
            let mut walker = Walker::new(
                self.config,
                self.vcs,
                &mut self.cache,
                &mut diagnostics,
                named_policy(opts.tag.clone(), targets.iter().map(|t| &t.path)),
                opts.repo.clone(),
            );
            for target in &targets {
                download_target(&mut walker, target, &src_root, opts.update);
            }
            walker.visited()
        };
        info!("Downloaded {} package(s)", downloaded.len());

        let evicted = self.cache.clean_all();
        if diagnostics.has_errors() {
            self.enter(Phase::Aborted);
            return Ok(GetOutcome {
                phase: self.phase,
                diagnostics,
                downloaded,
                evicted,
                install_list: Vec::new(),
                report: InstallReport::default(),
            });
        }
        self.enter(Phase::CacheInvalidated);

        // Phase 3: re-expand against the fresh tree
        let roots = match import_path::import_paths(args, &src_root) {
            Ok(roots) => roots,
            Err(err) => {
                diagnostics.record(err);
                Vec::new()
            }
        };
        let install_list = {
            let mut loader = Walker::new(
                self.config,
                self.vcs,
                &mut self.cache,
                &mut diagnostics,
                named_policy(opts.tag.clone(), roots.iter()),
                opts.repo.clone(),
            );
            for root in &roots {
                let mut stack = ImportStack::new();
                if let Err(err) = loader.load(root, &mut stack) {
                    loader.report(err);
                }
                debug_assert!(stack.is_empty());
            }
            loader.visited()
        };
        self.enter(Phase::PathsReexpanded);

        let mut report = InstallReport::default();
        if diagnostics.has_errors() {
            self.enter(Phase::Aborted);
        } else if opts.download_only {
            info!("Download only; environment '{}' left unchanged", env.name);
        } else {
            // Phase 4: install
            self.enter(Phase::Installing);
            report = install::run_install(&mut *self.installer, &env, &install_list, &mut diagnostics);
            self.enter(Phase::Done);
        }

        Ok(GetOutcome {
            phase: self.phase,
            diagnostics,
            downloaded,
            evicted,
            install_list,
            report,
        })
    }

    fn enter(&mut self, next: Phase) {
        debug!("Phase {} -> {}", self.phase, next);
        match next {
            Phase::Aborted => warn!("Aborting after {}: errors were reported", self.phase),
            _ => info!("Phase: {}", next),
        }
        self.phase = next;
    }
}

/// Tag policy with every command-line path marked as named
fn named_policy<'p>(tag: Option<String>, paths: impl Iterator<Item = &'p ImportPath>) -> TagPolicy {
    let mut policy = TagPolicy::new(tag);
    for path in paths {
        policy.name(path.clone());
    }
    policy
}

/// Download one command-line target with its own traversal stack
fn download_target(walker: &mut Walker<'_>, target: &DownloadTarget, src_root: &std::path::Path, update: bool) {
    let Some(pattern) = &target.pattern else {
        download_root(walker, &target.path, update);
        return;
    };

    // The pattern matched nothing locally: fetch its prefix, then expand it
    // against what arrived.
    if let Err(err) = walker.fetch(&target.path, update) {
        walker.report(err);
        return;
    }
    match import_path::match_packages(pattern, src_root) {
        Ok(matches) if matches.is_empty() => {
            warn!("\"{}\" matched no packages after fetching {}", pattern, target.path);
        }
        Ok(matches) => {
            for path in matches {
                walker.name(path.clone());
                download_root(walker, &path, update);
            }
        }
        Err(err) => walker.report(err),
    }
}

fn download_root(walker: &mut Walker<'_>, path: &ImportPath, update: bool) {
    let mut stack = ImportStack::new();
    if let Err(err) = walker.download(path, &mut stack, update) {
        walker.report(err);
    }
    debug_assert!(stack.is_empty());
}
