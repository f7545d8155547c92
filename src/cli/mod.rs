// src/cli/mod.rs
//! CLI definitions for bindcook
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Pipeline commands, in the order an install runs them:
//! - `fetch` - Download and verify archives into the source cache
//! - `install` - Build, install and run post-install
//! - `post-install` - Seed log and zone directories (idempotent)
//! - `test` - Smoke test the installed binaries
//!
//! Inspection and maintenance:
//! - `info` - Show recipe metadata
//! - `livecheck` - Find the newest stable upstream release
//! - `service` - Print or write the launchd descriptor
//! - `uninstall` - Remove the keg and opt link

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bindcook")]
#[command(version)]
#[command(about = "Build, install and verify the BIND name server from a recipe", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Prefix holding Cellar, opt, etc and var (overrides the config file)
    #[arg(short, long, global = true)]
    pub root: Option<String>,

    /// Recipe file to use instead of the built-in BIND recipe
    #[arg(long, global = true)]
    pub recipe: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show recipe metadata
    Info,

    /// Find the newest stable upstream release
    Livecheck,

    /// Download and verify source archives without building
    Fetch,

    /// Build and install, then run post-install
    Install {
        /// Number of parallel make jobs
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Keep the build directory after completion
        #[arg(long)]
        keep_builddir: bool,

        /// Run the smoke test after installing
        #[arg(long)]
        test: bool,

        /// Skip the network probe of the smoke test
        #[arg(long)]
        offline: bool,
    },

    /// Create log and zone directories under var if missing
    PostInstall,

    /// Smoke test the installed binaries
    Test {
        /// Skip the name resolution probe
        #[arg(long)]
        offline: bool,
    },

    /// Print the launchd service descriptor
    Service {
        /// Write the descriptor to a directory instead of printing it
        #[arg(long)]
        write: bool,

        /// Directory to write into (default: the launchd directory for the service)
        #[arg(long, requires = "write")]
        dir: Option<String>,
    },

    /// Remove the installed keg and its opt link
    Uninstall,
}
