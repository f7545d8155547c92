// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.global.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let global = &cli.global;
    match cli.command {
        Some(Commands::Info) => commands::cmd_info(global),
        Some(Commands::Livecheck) => commands::cmd_livecheck(global),
        Some(Commands::Fetch) => commands::cmd_fetch(global),
        Some(Commands::Install {
            jobs,
            keep_builddir,
            test,
            offline,
        }) => commands::cmd_install(global, jobs, keep_builddir, test, offline),
        Some(Commands::PostInstall) => commands::cmd_post_install(global),
        Some(Commands::Test { offline }) => commands::cmd_test(global, offline),
        Some(Commands::Service { write, dir }) => {
            commands::cmd_service(global, write, dir.as_deref())
        }
        Some(Commands::Uninstall) => commands::cmd_uninstall(global),
        None => {
            println!("bindcook {}", env!("CARGO_PKG_VERSION"));
            println!("Run 'bindcook --help' for usage information");
            Ok(())
        }
    }
}
