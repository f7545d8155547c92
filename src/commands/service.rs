// src/commands/service.rs
//! Service command - print or write the launchd descriptor

use super::open_kitchen;
use crate::cli::GlobalArgs;
use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

pub fn cmd_service(global: &GlobalArgs, write: bool, dir: Option<&str>) -> Result<()> {
    let (recipe, kitchen) = open_kitchen(global)?;
    let ctx = kitchen.context(&recipe)?;
    let descriptor = kitchen.service_descriptor(&recipe, &ctx)?;

    if !write {
        print!("{}", descriptor.to_plist());
        return Ok(());
    }

    let dir = match dir {
        Some(d) => PathBuf::from(d),
        None => descriptor
            .default_dir()
            .ok_or_else(|| anyhow!("Cannot determine the launchd directory, pass --dir"))?,
    };
    let path = descriptor
        .write_to(&dir)
        .with_context(|| format!("Failed to write service descriptor to {}", dir.display()))?;

    println!("Wrote {}", path.display());
    if descriptor.startup {
        println!("Load with: sudo launchctl load {}", path.display());
    } else {
        println!("Load with: launchctl load {}", path.display());
    }
    Ok(())
}
