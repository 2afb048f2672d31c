// tests/git_backend.rs

//! Integration tests for the git backend against a real local repository.
//!
//! Skipped when no `git` binary is available.

use gopkg::process::CommandRunner;
use gopkg::vcs::Git;
use gopkg::Vcs;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) -> String {
    let mut full = vec![
        "-c",
        "user.name=gopkg",
        "-c",
        "user.email=gopkg@example.invalid",
        "-c",
        "commit.gpgsign=false",
        "-c",
        "tag.gpgsign=false",
    ];
    full.extend_from_slice(args);
    CommandRunner::new("git", Duration::from_secs(30))
        .run(Some(dir), &full)
        .unwrap()
}

/// Upstream repository on branch `main` with tag `v1` one commit behind
fn upstream(root: &Path) -> std::path::PathBuf {
    let dir = root.join("upstream");
    fs::create_dir_all(&dir).unwrap();
    git(&dir, &["init", "--quiet", "-b", "main"]);
    fs::write(dir.join("lib.go"), "package lib\n").unwrap();
    git(&dir, &["add", "."]);
    git(&dir, &["commit", "--quiet", "-m", "first"]);
    git(&dir, &["tag", "v1"]);
    fs::write(dir.join("extra.go"), "package lib\n").unwrap();
    git(&dir, &["add", "."]);
    git(&dir, &["commit", "--quiet", "-m", "second"]);
    dir
}

#[test]
fn test_git_create_tag_sync_and_info() {
    if which::which("git").is_err() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let remote = upstream(tmp.path());
    let checkout = tmp.path().join("ws/src/example.org/lib.git");

    let backend = Git::new(Duration::from_secs(60));
    backend
        .create(&checkout, &remote.display().to_string())
        .unwrap();
    assert!(checkout.join("extra.go").is_file());
    assert_eq!(backend.info(&checkout).unwrap(), "main");

    backend.tag_sync(&checkout, "v1").unwrap();
    assert_eq!(backend.info(&checkout).unwrap(), "v1");
    assert!(!checkout.join("extra.go").exists());

    // Syncing to the current tag again is a no-op.
    backend.tag_sync(&checkout, "v1").unwrap();
    assert_eq!(backend.info(&checkout).unwrap(), "v1");

    // An empty tag goes back to the default branch.
    backend.tag_sync(&checkout, "").unwrap();
    assert_eq!(backend.info(&checkout).unwrap(), "main");
    backend.update(&checkout).unwrap();
}

#[test]
fn test_git_bad_tag_fails() {
    if which::which("git").is_err() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let remote = upstream(tmp.path());
    let checkout = tmp.path().join("checkout");

    let backend = Git::new(Duration::from_secs(60));
    backend
        .create(&checkout, &remote.display().to_string())
        .unwrap();
    assert!(backend.tag_sync(&checkout, "no-such-tag").is_err());
}
