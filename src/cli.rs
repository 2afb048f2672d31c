// src/cli.rs
//! CLI definitions for gopkg
//!
//! The top-level parser only knows the global options; everything after the
//! command name is handed to the matching handler in the `commands` registry,
//! which parses its own flags.

use crate::orchestrator::GetOptions;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gopkg")]
#[command(version)]
#[command(about = "Download and install packages with their dependencies", long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Log every package visit and phase transition
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (default: <config dir>/gopkg/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Source workspace; overrides GOPATH and the config file
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Toolchain root; overrides GOROOT and the config file
    #[arg(long, value_name = "DIR")]
    pub toolchain_root: Option<PathBuf>,

    /// Command and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub args: Vec<String>,
}

/// Flags of `gopkg get`
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "get")]
pub struct GetArgs {
    /// Repository to fetch the named packages from
    #[arg(short = 'r', value_name = "repo")]
    pub repo: Option<String>,

    /// Environment to install into
    #[arg(short = 'e', value_name = "env")]
    pub environment: Option<String>,

    /// Tag to switch the named packages to
    #[arg(short = 't', value_name = "tag")]
    pub tag: Option<String>,

    /// Download only; do not install
    #[arg(short = 'd')]
    pub download_only: bool,

    /// Update checkouts that already exist
    #[arg(short = 'u')]
    pub update: bool,

    /// Import paths or `...` patterns
    #[arg(required = true, value_name = "packages")]
    pub paths: Vec<String>,
}

impl GetArgs {
    pub fn options(&self) -> GetOptions {
        GetOptions {
            repo: self.repo.clone(),
            environment: self.environment.clone(),
            tag: self.tag.clone(),
            download_only: self.download_only,
            update: self.update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args_are_passed_through() {
        let cli = Cli::try_parse_from(["gopkg", "-v", "get", "-d", "-t", "v1", "pkg/y"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.args, vec!["get", "-d", "-t", "v1", "pkg/y"]);
    }

    #[test]
    fn test_get_flags() {
        let args = GetArgs::try_parse_from(["get", "-e", "dev", "-u", "-r", "/srv/y", "pkg/y", "pkg/z"]).unwrap();
        assert_eq!(args.environment.as_deref(), Some("dev"));
        assert_eq!(args.repo.as_deref(), Some("/srv/y"));
        assert!(args.update);
        assert!(!args.download_only);
        assert_eq!(args.paths, vec!["pkg/y", "pkg/z"]);

        let opts = args.options();
        assert_eq!(opts.environment.as_deref(), Some("dev"));
    }

    #[test]
    fn test_get_requires_paths() {
        let err = GetArgs::try_parse_from(["get", "-d"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
