// src/commands/livecheck.rs
//! Livecheck command - compare the recipe with upstream

use super::open_kitchen;
use crate::cli::GlobalArgs;
use anyhow::{Context, Result};
use bindcook::livecheck;

pub fn cmd_livecheck(global: &GlobalArgs) -> Result<()> {
    let (recipe, kitchen) = open_kitchen(global)?;

    let report = livecheck::check(kitchen.fetcher(), &recipe)
        .with_context(|| format!("Livecheck failed for {}", recipe.package.name))?;

    println!(
        "{}: {} ==> {}{}",
        report.name,
        report.current,
        report.latest,
        if report.outdated { " (outdated)" } else { "" }
    );
    Ok(())
}
