// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn build_cli() -> Command {
    Command::new("gopkg")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Download and install packages with their dependencies")
        .disable_help_subcommand(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log every package visit and phase transition"),
        )
        .arg(Arg::new("config").long("config").value_name("FILE").help("Config file"))
        .arg(
            Arg::new("workspace")
                .long("workspace")
                .value_name("DIR")
                .help("Source workspace; overrides GOPATH and the config file"),
        )
        .arg(
            Arg::new("toolchain_root")
                .long("toolchain-root")
                .value_name("DIR")
                .help("Toolchain root; overrides GOROOT and the config file"),
        )
        .subcommand(
            Command::new("get")
                .about("Download and install packages with their dependencies")
                .arg(Arg::new("repo").short('r').value_name("repo").help("Repository to fetch the named packages from"))
                .arg(Arg::new("env").short('e').value_name("env").help("Environment to install into"))
                .arg(Arg::new("tag").short('t').value_name("tag").help("Tag to switch the named packages to"))
                .arg(
                    Arg::new("download_only")
                        .short('d')
                        .action(ArgAction::SetTrue)
                        .help("Download only; do not install"),
                )
                .arg(
                    Arg::new("update")
                        .short('u')
                        .action(ArgAction::SetTrue)
                        .help("Update checkouts that already exist"),
                )
                .arg(
                    Arg::new("packages")
                        .required(true)
                        .num_args(1..)
                        .help("Import paths or '...' patterns"),
                ),
        )
        .subcommand(
            Command::new("help")
                .about("Show help for a command")
                .arg(Arg::new("command").help("Command to describe")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("gopkg.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
