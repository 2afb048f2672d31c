// src/commands/mod.rs
//! Command handlers for the gopkg CLI
//!
//! Each subcommand is one [`CommandHandler`] in the [`Registry`]. The
//! dispatcher in `main` looks the name up and hands over the remaining
//! arguments; handlers parse their own flags and return the exit status.

mod get;
mod help;

pub use get::GetCommand;
pub use help::HelpCommand;

use crate::config::{Config, Overrides};
use std::fmt::Write as _;
use std::path::PathBuf;

/// What a handler gets besides its arguments
pub struct Context<'a> {
    pub registry: &'a Registry,
    /// Explicit config file (`--config`)
    pub config_file: Option<PathBuf>,
    /// Workspace and toolchain values from flags or the environment
    pub overrides: Overrides,
}

impl Context<'_> {
    /// Load and validate the configuration
    ///
    /// Only commands that need it call this, so `help` works with a broken
    /// config.
    pub fn load_config(&self) -> crate::Result<Config> {
        let mut config = Config::load_or_default(self.config_file.as_deref())?
            .with_overrides(self.overrides.clone())?;
        config.discover_toolchain_root();
        Ok(config)
    }
}

/// One subcommand
pub trait CommandHandler {
    /// Name used on the command line
    fn name(&self) -> &'static str;

    /// One-line usage, without the program name
    fn usage_line(&self) -> &'static str;

    /// Short description for the command list
    fn short(&self) -> &'static str;

    /// Long description for `gopkg help <name>`
    fn long(&self) -> &'static str;

    /// Run with the arguments following the command name
    fn run(&self, ctx: &Context<'_>, args: &[String]) -> anyhow::Result<u8>;
}

/// Command name to handler
pub struct Registry {
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl Registry {
    /// Registry with every built-in command
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: Vec::new(),
        };
        registry.register(Box::new(GetCommand));
        registry.register(Box::new(HelpCommand));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        self.handlers.retain(|h| h.name() != handler.name());
        self.handlers.push(handler);
    }

    pub fn find(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.handlers
            .iter()
            .find(|h| h.name() == name)
            .map(|h| h.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn CommandHandler> {
        self.handlers.iter().map(|h| h.as_ref())
    }

    /// Top-level usage text
    pub fn usage(&self) -> String {
        let mut out = String::from(
            "gopkg downloads and installs packages with their dependencies.\n\n\
             Usage:\n\n\tgopkg [options] command [arguments]\n\nThe commands are:\n\n",
        );
        for handler in self.iter() {
            let _ = writeln!(out, "    {:<8} {}", handler.name(), handler.short());
        }
        out.push_str("\nUse \"gopkg help [command]\" for more information about a command.\n");
        out
    }

    /// Help text for one command
    pub fn help(&self, name: &str) -> Option<String> {
        self.find(name).map(|handler| {
            format!(
                "Usage: gopkg {}\n\n{}\n",
                handler.usage_line(),
                handler.long().trim()
            )
        })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
