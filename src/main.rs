// src/main.rs

use clap::Parser;
use gopkg::cli::Cli;
use gopkg::commands::{Context, Registry};
use gopkg::{EXIT_FAILURE, EXIT_USAGE, Overrides};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = Registry::new();
    let Some((name, args)) = cli.args.split_first() else {
        eprint!("{}", registry.usage());
        return ExitCode::from(EXIT_USAGE);
    };
    let Some(handler) = registry.find(name) else {
        eprintln!("gopkg: unknown command {name:?}");
        eprintln!("Run 'gopkg help' for usage.");
        return ExitCode::from(EXIT_USAGE);
    };

    let ctx = Context {
        registry: &registry,
        config_file: cli.config.clone(),
        overrides: overrides(&cli),
    };
    debug!("Running '{}' with {} argument(s)", handler.name(), args.len());

    match handler.run(&ctx, args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("gopkg: {err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Workspace and toolchain root from flags, falling back to GOPATH / GOROOT
fn overrides(cli: &Cli) -> Overrides {
    let workspace = cli.workspace.clone().or_else(|| {
        let gopath = env::var_os("GOPATH")?;
        env::split_paths(&gopath).find(|p| !p.as_os_str().is_empty())
    });
    let toolchain_root = cli
        .toolchain_root
        .clone()
        .or_else(|| env::var_os("GOROOT").filter(|v| !v.is_empty()).map(PathBuf::from));
    Overrides {
        workspace,
        toolchain_root,
    }
}
