// src/cache.rs

//! Process-lifetime package cache
//!
//! Maps import paths to resolved [`Package`] records. No reverse dependency
//! edges are kept, so after any phase that fetched sources the whole cache is
//! dropped with [`PackageCache::clean_all`] and refilled on demand. A targeted
//! eviction would have to know every package that depends on a refreshed one.

use crate::import_path::ImportPath;
use crate::package::Package;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PackageCache {
    entries: HashMap<ImportPath, Package>,
}

impl PackageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &ImportPath) -> Option<&Package> {
        self.entries.get(path)
    }

    /// Insert or replace the record for `path`
    pub fn put(&mut self, path: ImportPath, record: Package) {
        self.entries.insert(path, record);
    }

    pub fn contains(&self, path: &ImportPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every record, returning how many were evicted
    pub fn clean_all(&mut self) -> usize {
        let evicted = self.entries.len();
        self.entries.clear();
        debug!("Package cache cleared ({} entries evicted)", evicted);
        evicted
    }
}
