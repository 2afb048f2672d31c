// src/import_path.rs

//! Import paths and wildcard expansion
//!
//! An import path names one package, e.g. `github.com/user/repo/sub`. Packages
//! live at `<workspace>/src/<import path>`, so the path doubles as a relative
//! filesystem location.
//!
//! Arguments containing `...` are patterns. Before the walk they are matched
//! against packages already on disk ([`download_paths`]); after the walk they
//! are matched again against the freshly fetched tree ([`import_paths`]).

use crate::error::{Error, Result};
use crate::scan;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Validated package import path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportPath(String);

impl ImportPath {
    /// Parse and validate an import path
    ///
    /// Rejects empty paths, absolute paths, backslashes, whitespace and any
    /// empty, `.` or `..` element. A single trailing `/` is tolerated.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.strip_suffix('/').unwrap_or(raw);
        if trimmed.is_empty() {
            return Err(Error::Usage("empty import path".to_string()));
        }
        if trimmed.starts_with('/') {
            return Err(Error::Usage(format!(
                "import path \"{raw}\" must not be absolute"
            )));
        }
        if trimmed.contains('\\') || trimmed.chars().any(char::is_whitespace) {
            return Err(Error::Usage(format!(
                "invalid character in import path \"{raw}\""
            )));
        }
        if trimmed.contains("...") {
            return Err(Error::Usage(format!(
                "import path \"{raw}\" is a pattern, not a path"
            )));
        }
        for elem in trimmed.split('/') {
            if elem.is_empty() || elem == "." || elem == ".." {
                return Err(Error::Usage(format!(
                    "invalid import path \"{raw}\": bad element \"{elem}\""
                )));
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// True when `prefix` equals this path or is one of its parent paths
    pub fn has_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        self.0 == prefix
            || (self.0.starts_with(prefix) && self.0.as_bytes().get(prefix.len()) == Some(&b'/'))
    }

    /// Filesystem location of this path below `root`
    pub fn to_dir(&self, root: &Path) -> PathBuf {
        let mut dir = root.to_path_buf();
        for elem in self.elements() {
            dir.push(elem);
        }
        dir
    }
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImportPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True for `.`, `..`, `./x` and `../x` imports
pub fn is_local_import(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}

/// True when the argument is a wildcard pattern
pub fn is_pattern(arg: &str) -> bool {
    arg.contains("...")
}

/// True when the path names a standard-library package of the toolchain
///
/// Without a known toolchain root, a path whose first element has no `.` is
/// taken as standard; hosted import paths always start with a domain.
pub fn is_standard(path: &str, toolchain_root: Option<&Path>) -> bool {
    if path == "C" {
        return true;
    }
    match (toolchain_root, ImportPath::parse(path)) {
        (Some(root), Ok(ip)) => ip.to_dir(&root.join("src")).is_dir(),
        (None, Ok(ip)) => ip.as_str().split('/').next().is_some_and(|first| !first.contains('.')),
        (_, Err(_)) => false,
    }
}

/// Compile a `...` pattern into an anchored matcher
///
/// `...` matches any string, including `/`. A trailing `/...` also matches
/// the prefix itself, so `x/...` matches `x` and `x/y`.
pub fn pattern_matcher(pattern: &str) -> Result<Regex> {
    let mut re = regex::escape(pattern).replace(r"\.\.\.", ".*");
    if let Some(stripped) = re.strip_suffix("/.*") {
        re = format!("{stripped}(/.*)?");
    }
    Regex::new(&format!("^{re}$"))
        .map_err(|e| Error::Usage(format!("invalid pattern \"{pattern}\": {e}")))
}

/// Literal part of a pattern that identifies what to download
///
/// `github.com/u/r/...` yields `github.com/u/r`, `github.com/u/re...` yields
/// `github.com/u`.
pub fn pattern_prefix(pattern: &str) -> Option<&str> {
    let idx = pattern.find("...")?;
    let head = &pattern[..idx];
    let head = if head.ends_with('/') {
        head
    } else {
        match head.rfind('/') {
            Some(slash) => &head[..slash],
            None => "",
        }
    };
    let head = head.trim_end_matches('/');
    if head.is_empty() { None } else { Some(head) }
}

/// All packages present under `src_root`, sorted
///
/// A directory is a package when it holds at least one source file. Hidden
/// directories, `_`-prefixed directories and `testdata` are skipped.
pub fn local_packages(src_root: &Path) -> Vec<ImportPath> {
    let mut found = Vec::new();
    if !src_root.is_dir() {
        return found;
    }

    let walker = WalkDir::new(src_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return false;
            }
            let name = entry.file_name().to_string_lossy();
            !(name.starts_with('.') || name.starts_with('_') || name == "testdata")
        });

    for entry in walker.filter_map(|e| e.ok()) {
        let Ok(rel) = entry.path().strip_prefix(src_root) else {
            continue;
        };
        if !scan::has_source_files(entry.path()) {
            continue;
        }
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        match ImportPath::parse(&rel) {
            Ok(path) => found.push(path),
            Err(e) => debug!("Skipping {}: {}", entry.path().display(), e),
        }
    }
    found
}

/// Local packages matching a pattern
pub fn match_packages(pattern: &str, src_root: &Path) -> Result<Vec<ImportPath>> {
    let matcher = pattern_matcher(pattern)?;
    Ok(local_packages(src_root)
        .into_iter()
        .filter(|p| matcher.is_match(p.as_str()))
        .collect())
}

/// One unit of work for the download phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// What to fetch
    pub path: ImportPath,
    /// Set when `path` stands in for a pattern that matched nothing locally;
    /// the pattern is expanded again once the repository is on disk.
    pub pattern: Option<String>,
}

/// Expand command-line arguments into the paths to download
///
/// Patterns are matched against packages already present under `src_root`.
/// A pattern with no local match is replaced by its literal prefix. Touches
/// neither the network nor the contents of any package.
pub fn download_paths(args: &[String], src_root: &Path) -> Result<Vec<DownloadTarget>> {
    let mut out: Vec<DownloadTarget> = Vec::new();
    let mut push = |target: DownloadTarget| {
        if !out.iter().any(|t| t.path == target.path) {
            out.push(target);
        }
    };

    for arg in args {
        if !is_pattern(arg) {
            push(DownloadTarget {
                path: ImportPath::parse(arg)?,
                pattern: None,
            });
            continue;
        }

        let matches = match_packages(arg, src_root)?;
        if matches.is_empty() {
            let prefix = pattern_prefix(arg).ok_or_else(|| {
                Error::Usage(format!("pattern \"{arg}\" has no literal prefix to download"))
            })?;
            push(DownloadTarget {
                path: ImportPath::parse(prefix)?,
                pattern: Some(arg.clone()),
            });
        } else {
            for path in matches {
                push(DownloadTarget { path, pattern: None });
            }
        }
    }
    Ok(out)
}

/// Re-expand arguments against the workspace after downloading
///
/// Unmatched patterns only warn; the walk that follows reports missing
/// packages on its own.
pub fn import_paths(args: &[String], src_root: &Path) -> Result<Vec<ImportPath>> {
    let mut out: Vec<ImportPath> = Vec::new();
    for arg in args {
        let expanded = if is_pattern(arg) {
            let matches = match_packages(arg, src_root)?;
            if matches.is_empty() {
                warn!("\"{}\" matched no packages", arg);
            }
            matches
        } else {
            vec![ImportPath::parse(arg)?]
        };
        for path in expanded {
            if !out.contains(&path) {
                out.push(path);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_pkg(src: &Path, path: &str) {
        let dir = src.join(path);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.go"), "package main\n").unwrap();
    }

    #[test]
    fn test_parse_accepts_hosted_paths() {
        let p = ImportPath::parse("github.com/user/repo/sub/").unwrap();
        assert_eq!(p.as_str(), "github.com/user/repo/sub");
        assert_eq!(p.elements().count(), 4);
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        for bad in ["", "/abs/path", "a//b", "a/../b", "./a", "a b", "a\\b", "a/..."] {
            assert!(ImportPath::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_has_prefix_respects_element_boundaries() {
        let p = ImportPath::parse("pkg/shared/util").unwrap();
        assert!(p.has_prefix("pkg/shared"));
        assert!(p.has_prefix("pkg/shared/util"));
        assert!(!p.has_prefix("pkg/share"));
    }

    #[test]
    fn test_local_imports() {
        assert!(is_local_import("./x"));
        assert!(is_local_import(".."));
        assert!(!is_local_import("x/./y"));
    }

    #[test]
    fn test_standard_detection_uses_toolchain_tree() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/fmt")).unwrap();
        assert!(is_standard("fmt", Some(tmp.path())));
        assert!(is_standard("C", None));
        assert!(!is_standard("pkg/y", Some(tmp.path())));
    }

    #[test]
    fn test_standard_detection_without_toolchain_root() {
        assert!(is_standard("fmt", None));
        assert!(is_standard("net/http", None));
        assert!(!is_standard("example.org/y", None));
        assert!(!is_standard("github.com/u/r/sub", None));
    }

    #[test]
    fn test_pattern_matcher() {
        let m = pattern_matcher("pkg/x/...").unwrap();
        assert!(m.is_match("pkg/x"));
        assert!(m.is_match("pkg/x/y/z"));
        assert!(!m.is_match("pkg/xy"));

        let m = pattern_matcher("pkg/x...").unwrap();
        assert!(m.is_match("pkg/xy"));
        assert!(m.is_match("pkg/x/y"));
    }

    #[test]
    fn test_pattern_prefix() {
        assert_eq!(pattern_prefix("github.com/u/r/..."), Some("github.com/u/r"));
        assert_eq!(pattern_prefix("github.com/u/re..."), Some("github.com/u"));
        assert_eq!(pattern_prefix("..."), None);
    }

    #[test]
    fn test_local_packages_skips_hidden_and_testdata() {
        let tmp = TempDir::new().unwrap();
        write_pkg(tmp.path(), "pkg/a");
        write_pkg(tmp.path(), "pkg/a/inner");
        write_pkg(tmp.path(), "pkg/.git/hooks");
        write_pkg(tmp.path(), "pkg/a/testdata/fixture");
        fs::create_dir_all(tmp.path().join("pkg/empty")).unwrap();

        let found: Vec<String> = local_packages(tmp.path())
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(found, vec!["pkg/a", "pkg/a/inner"]);
    }

    #[test]
    fn test_download_paths_expands_local_matches() {
        let tmp = TempDir::new().unwrap();
        write_pkg(tmp.path(), "pkg/a");
        write_pkg(tmp.path(), "pkg/a/b");

        let args = vec!["pkg/a/...".to_string(), "pkg/a".to_string()];
        let targets = download_paths(&args, tmp.path()).unwrap();
        let paths: Vec<&str> = targets.iter().map(|t| t.path.as_str()).collect();
        assert_eq!(paths, vec!["pkg/a", "pkg/a/b"]);
        assert!(targets.iter().all(|t| t.pattern.is_none()));
    }

    #[test]
    fn test_download_paths_falls_back_to_prefix() {
        let tmp = TempDir::new().unwrap();
        let args = vec!["github.com/u/r/...".to_string()];
        let targets = download_paths(&args, tmp.path()).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].path.as_str(), "github.com/u/r");
        assert_eq!(targets[0].pattern.as_deref(), Some("github.com/u/r/..."));
    }

    #[test]
    fn test_download_paths_rejects_invalid_argument() {
        let tmp = TempDir::new().unwrap();
        let err = download_paths(&["/etc/passwd".to_string()], tmp.path()).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_import_paths_deduplicates() {
        let tmp = TempDir::new().unwrap();
        write_pkg(tmp.path(), "pkg/a");
        let args = vec!["pkg/a".to_string(), "pkg/...".to_string(), "pkg/none/...".to_string()];
        let paths = import_paths(&args, tmp.path()).unwrap();
        assert_eq!(paths, vec![ImportPath::parse("pkg/a").unwrap()]);
    }
}
