// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn offline_arg(help: &'static str) -> Arg {
    Arg::new("offline")
        .long("offline")
        .action(clap::ArgAction::SetTrue)
        .help(help)
}

fn build_cli() -> Command {
    Command::new("bindcook")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build, install and verify the BIND name server from a recipe")
        .subcommand_required(false)
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .global(true)
                .help("Prefix holding Cellar, opt, etc and var (overrides the config file)"),
        )
        .arg(
            Arg::new("recipe")
                .long("recipe")
                .global(true)
                .help("Recipe file to use instead of the built-in BIND recipe"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(clap::ArgAction::Count)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .subcommand(Command::new("info").about("Show recipe metadata"))
        .subcommand(Command::new("livecheck").about("Find the newest stable upstream release"))
        .subcommand(
            Command::new("fetch").about("Download and verify source archives without building"),
        )
        .subcommand(
            Command::new("install")
                .about("Build and install, then run post-install")
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help("Number of parallel make jobs"),
                )
                .arg(
                    Arg::new("keep_builddir")
                        .long("keep-builddir")
                        .action(clap::ArgAction::SetTrue)
                        .help("Keep the build directory after completion"),
                )
                .arg(
                    Arg::new("test")
                        .long("test")
                        .action(clap::ArgAction::SetTrue)
                        .help("Run the smoke test after installing"),
                )
                .arg(offline_arg("Skip the network probe of the smoke test")),
        )
        .subcommand(
            Command::new("post-install").about("Create log and zone directories under var if missing"),
        )
        .subcommand(
            Command::new("test")
                .about("Smoke test the installed binaries")
                .arg(offline_arg("Skip the name resolution probe")),
        )
        .subcommand(
            Command::new("service")
                .about("Print the launchd service descriptor")
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(clap::ArgAction::SetTrue)
                        .help("Write the descriptor to a directory instead of printing it"),
                )
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .requires("write")
                        .help("Directory to write into"),
                ),
        )
        .subcommand(Command::new("uninstall").about("Remove the installed keg and its opt link"))
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

    let man_path = man_dir.join("bindcook.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
