// src/scan.rs

//! Dependency discovery from package sources
//!
//! Reads the import declarations at the top of every source file in a
//! package directory. Scanning stops at the first top-level declaration, so
//! string literals further down a file are never mistaken for imports.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extension of package source files
pub const SOURCE_EXT: &str = "go";

static SINGLE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^import\s+(?:[A-Za-z_][A-Za-z0-9_]*\s+|[._]\s+)?"([^"]+)""#)
        .expect("static regex")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("static regex"));

static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(func|type|var|const)\b").expect("static regex"));

/// Sources and imports of one package directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSources {
    pub files: Vec<PathBuf>,
    /// Imports in first-seen order, without duplicates
    pub imports: Vec<String>,
}

/// True for files that belong to the package build
///
/// Test files and names starting with `_` or `.` are ignored.
pub fn is_source_file(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(&format!(".{SOURCE_EXT}")) else {
        return false;
    };
    !(stem.is_empty() || name.starts_with('_') || name.starts_with('.') || stem.ends_with("_test"))
}

/// Source files directly inside `dir`, sorted
pub fn source_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if is_source_file(&entry.file_name().to_string_lossy()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn has_source_files(dir: &Path) -> bool {
    source_files(dir).map(|f| !f.is_empty()).unwrap_or(false)
}

/// Extract import paths from one source text
pub fn scan_imports_in_text(src: &str) -> Vec<String> {
    let mut imports: Vec<String> = Vec::new();
    let mut in_block = false;
    let mut in_comment = false;

    for raw in src.lines() {
        let mut line = raw.trim();

        if in_comment {
            match line.find("*/") {
                Some(end) => {
                    in_comment = false;
                    line = line[end + 2..].trim();
                }
                None => continue,
            }
        }
        if let Some(start) = line.find("/*") {
            if !line[start..].contains("*/") {
                in_comment = true;
            }
            line = line[..start].trim();
        }
        if let Some(idx) = line.find("//") {
            line = line[..idx].trim();
        }
        if line.is_empty() {
            continue;
        }

        if in_block {
            let (body, closes) = match line.find(')') {
                Some(idx) => (&line[..idx], true),
                None => (line, false),
            };
            collect_quoted(body, &mut imports);
            if closes {
                in_block = false;
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("import") {
            let rest = rest.trim_start();
            if let Some(body) = rest.strip_prefix('(') {
                match body.find(')') {
                    Some(idx) => collect_quoted(&body[..idx], &mut imports),
                    None => {
                        collect_quoted(body, &mut imports);
                        in_block = true;
                    }
                }
                continue;
            }
            if let Some(caps) = SINGLE_IMPORT.captures(line) {
                push_unique(&mut imports, &caps[1]);
            }
            continue;
        }

        if DECLARATION.is_match(line) {
            break;
        }
    }
    imports
}

fn collect_quoted(body: &str, out: &mut Vec<String>) {
    for caps in QUOTED.captures_iter(body) {
        push_unique(out, &caps[1]);
    }
}

fn push_unique(out: &mut Vec<String>, import: &str) {
    if !out.iter().any(|i| i == import) {
        out.push(import.to_string());
    }
}

/// Scan every source file of a package directory
pub fn scan_package(dir: &Path) -> std::io::Result<PackageSources> {
    let files = source_files(dir)?;
    let mut imports: Vec<String> = Vec::new();
    for file in &files {
        let text = fs::read_to_string(file)?;
        for import in scan_imports_in_text(&text) {
            push_unique(&mut imports, &import);
        }
    }
    Ok(PackageSources { files, imports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_single_and_aliased_imports() {
        let src = r#"package main

import "fmt"
import str "strings"
import _ "pkg/plugin"
"#;
        assert_eq!(scan_imports_in_text(src), vec!["fmt", "strings", "pkg/plugin"]);
    }

    #[test]
    fn test_block_imports_with_comments() {
        let src = r#"// Package y does things.
package y

/* import "not/this" */
import (
    "fmt" // formatting
    z "pkg/z"
    // "pkg/commented"
    . "pkg/dot"
)

func main() {
    s := "import \"pkg/late\""
}
"#;
        assert_eq!(scan_imports_in_text(src), vec!["fmt", "pkg/z", "pkg/dot"]);
    }

    #[test]
    fn test_one_line_block() {
        let src = "package a\nimport ( \"pkg/b\"; \"pkg/c\" )\n";
        assert_eq!(scan_imports_in_text(src), vec!["pkg/b", "pkg/c"]);
    }

    #[test]
    fn test_scanning_stops_at_declarations() {
        let src = "package a\n\nvar x = 1\nimport \"pkg/never\"\n";
        assert!(scan_imports_in_text(src).is_empty());
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file("main.go"));
        assert!(!is_source_file("main_test.go"));
        assert!(!is_source_file("_skip.go"));
        assert!(!is_source_file(".hidden.go"));
        assert!(!is_source_file("README.md"));
        assert!(!is_source_file(".go"));
    }

    #[test]
    fn test_scan_package_merges_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.go"), "package p\nimport \"pkg/x\"\n").unwrap();
        fs::write(
            tmp.path().join("b.go"),
            "package p\nimport (\n\"pkg/x\"\n\"pkg/y\"\n)\n",
        )
        .unwrap();
        fs::write(tmp.path().join("b_test.go"), "package p\nimport \"pkg/test\"\n").unwrap();

        let sources = scan_package(tmp.path()).unwrap();
        assert_eq!(sources.files.len(), 2);
        assert_eq!(sources.imports, vec!["pkg/x", "pkg/y"]);
    }

    #[test]
    fn test_empty_dir_has_no_sources() {
        let tmp = TempDir::new().unwrap();
        assert!(!has_source_files(tmp.path()));
        assert!(!has_source_files(&tmp.path().join("missing")));
    }
}
