// src/commands/get.rs
//! `gopkg get`: download packages with their dependencies and install them

use super::{CommandHandler, Context};
use crate::cli::GetArgs;
use crate::diagnostics::{EXIT_SUCCESS, EXIT_USAGE};
use crate::install::ToolchainInstaller;
use crate::orchestrator::{Orchestrator, Phase};
use crate::vcs::VcsRegistry;
use anyhow::Context as _;
use clap::Parser;
use tracing::debug;

const LONG: &str = "
Get downloads the packages named by the import paths, along with their
dependencies, and installs them into an environment. Dependencies are read
from the import declarations of each package's source files.

The -t flag switches the named packages to a tag. A package may carry a
GOENV file pinning tags for the packages it imports; a tag given on the
command line wins over a pin for the packages named on the command line.

The -r flag fetches the named packages from another repository, such as a
mirror. The -e flag selects the environment to install into. The -d flag
stops after downloading and leaves the environment untouched. The -u flag
updates checkouts that already exist instead of reusing them.

An import path containing '...' is a pattern. It is matched against the
packages in the workspace; if nothing matches, the repository named by the
part before '...' is downloaded and the pattern is matched again.
";

pub struct GetCommand;

impl CommandHandler for GetCommand {
    fn name(&self) -> &'static str {
        "get"
    }

    fn usage_line(&self) -> &'static str {
        "get [-r <repo>] [-e <env>] [-t <tag>] [-d] [-u] <packages...>"
    }

    fn short(&self) -> &'static str {
        "download and install packages with their dependencies"
    }

    fn long(&self) -> &'static str {
        LONG
    }

    fn run(&self, ctx: &Context<'_>, args: &[String]) -> anyhow::Result<u8> {
        let parsed = match GetArgs::try_parse_from(
            std::iter::once("gopkg get".to_string()).chain(args.iter().cloned()),
        ) {
            Ok(parsed) => parsed,
            Err(err) => {
                err.print().context("Failed to print usage")?;
                return Ok(u8::try_from(err.exit_code()).unwrap_or(EXIT_USAGE));
            }
        };

        let config = match ctx.load_config() {
            Ok(config) => config,
            Err(err) => {
                eprintln!("gopkg: {err}");
                return Ok(EXIT_USAGE);
            }
        };
        debug!("Workspace: {}", config.workspace.display());

        let vcs = VcsRegistry::with_defaults(config.vcs_timeout());
        let mut installer = ToolchainInstaller::from_config(&config);
        let mut orchestrator = Orchestrator::new(&config, &vcs, &mut installer);

        let outcome = match orchestrator.run(&parsed.paths, &parsed.options()) {
            Ok(outcome) => outcome,
            Err(err) if err.is_usage() => {
                eprintln!("gopkg: {err}");
                eprintln!("Usage: gopkg {}\n\nRun 'gopkg help get' for help.", self.usage_line());
                return Ok(EXIT_USAGE);
            }
            Err(err) => return Err(err).context("get failed"),
        };

        for err in outcome.diagnostics.errors() {
            eprintln!("gopkg: {err}");
        }
        match outcome.phase {
            Phase::Done => {
                for path in &outcome.report.installed {
                    println!("installed {path}");
                }
            }
            Phase::PathsReexpanded => {
                println!("downloaded {} package(s)", outcome.install_list.len());
            }
            _ => {}
        }

        let code = outcome.exit_code();
        if code == EXIT_SUCCESS {
            debug!("get finished in phase {}", outcome.phase);
        }
        Ok(code)
    }
}
