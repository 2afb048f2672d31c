// src/package.rs

//! Resolved package record

use crate::import_path::ImportPath;
use crate::manifest::{Manifest, TagSource};
use crate::repository::RepoRoot;
use std::path::PathBuf;

/// One resolved package
///
/// Built once at the end of a walker visit and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub import_path: ImportPath,
    /// `None` for packages loaded from disk whose repository is unknown
    pub repo: Option<RepoRoot>,
    /// `None` means the repository default branch or tip
    pub tag: Option<String>,
    pub tag_source: TagSource,
    /// Package directory
    pub dir: PathBuf,
    /// Direct, non-standard dependencies in source order
    pub imports: Vec<ImportPath>,
    /// Pins read from this package's own manifest
    pub manifest: Manifest,
}

impl Package {
    /// Tag for display, `default` when unpinned
    pub fn tag_or_default(&self) -> &str {
        self.tag.as_deref().unwrap_or("default")
    }
}
