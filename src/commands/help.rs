// src/commands/help.rs
//! `gopkg help [command]`

use super::{CommandHandler, Context};
use crate::diagnostics::{EXIT_SUCCESS, EXIT_USAGE};

pub struct HelpCommand;

impl CommandHandler for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn usage_line(&self) -> &'static str {
        "help [command]"
    }

    fn short(&self) -> &'static str {
        "show help for a command"
    }

    fn long(&self) -> &'static str {
        "Help prints the list of commands, or the usage and description of one command."
    }

    fn run(&self, ctx: &Context<'_>, args: &[String]) -> anyhow::Result<u8> {
        match args {
            [] => {
                print!("{}", ctx.registry.usage());
                Ok(EXIT_SUCCESS)
            }
            [topic] => match ctx.registry.help(topic) {
                Some(text) => {
                    print!("{text}");
                    Ok(EXIT_SUCCESS)
                }
                None => {
                    eprintln!("gopkg: unknown help topic {topic:?}. Run 'gopkg help'.");
                    Ok(EXIT_USAGE)
                }
            },
            _ => {
                eprintln!("usage: gopkg help command\n\nToo many arguments given.");
                Ok(EXIT_USAGE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Registry;
    use crate::config::Overrides;

    #[test]
    fn test_help_exit_codes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = Registry::new();
        let ctx = Context {
            registry: &registry,
            config_file: Some(tmp.path().join("absent.toml")),
            overrides: Overrides::default(),
        };
        let help = HelpCommand;
        assert_eq!(help.run(&ctx, &[]).unwrap(), EXIT_SUCCESS);
        assert_eq!(help.run(&ctx, &["get".to_string()]).unwrap(), EXIT_SUCCESS);
        assert_eq!(help.run(&ctx, &["nope".to_string()]).unwrap(), EXIT_USAGE);
        assert_eq!(
            help.run(&ctx, &["get".to_string(), "help".to_string()]).unwrap(),
            EXIT_USAGE
        );
    }
}
