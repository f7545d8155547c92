// src/commands/install.rs
//! Install pipeline commands: fetch, install, post-install, test, uninstall

use super::{load_config, load_recipe, open_kitchen};
use crate::cli::GlobalArgs;
use anyhow::{Context, Result};
use bindcook::recipe::{EtcOutcome, Kitchen};
use tracing::info;

/// Download and verify every archive the recipe needs
pub fn cmd_fetch(global: &GlobalArgs) -> Result<()> {
    let (recipe, kitchen) = open_kitchen(global)?;

    let sources = kitchen
        .fetch(&recipe)
        .with_context(|| format!("Failed to fetch sources for {}", recipe.package.name))?;

    println!("[COMPLETE] Fetched {} source file(s):", sources.len());
    for source in &sources {
        println!("  - {}", source.display());
    }
    if kitchen.sources_cached(&recipe) {
        println!("[OK] All sources are cached. Ready for offline build.");
    }
    Ok(())
}

/// Build, install and run post-install
pub fn cmd_install(
    global: &GlobalArgs,
    jobs: Option<u32>,
    keep_builddir: bool,
    test: bool,
    offline: bool,
) -> Result<()> {
    let recipe = load_recipe(global)?;
    let mut config = load_config(global)?;
    config.keep_builddir |= keep_builddir;
    if jobs.is_some() {
        config.jobs = jobs;
    }
    let kitchen = Kitchen::with_system(config).context("Failed to set up the kitchen")?;

    println!(
        "Installing {} {} with {} parallel jobs...",
        recipe.package.name,
        recipe.pkg_version()?,
        kitchen.config().make_jobs(recipe.build.jobs)
    );
    if kitchen.sources_cached(&recipe) {
        println!("  - Sources already cached");
    }

    let result = kitchen
        .install(&recipe)
        .with_context(|| format!("Failed to install {}", recipe.package.name))?;

    for outcome in &result.etc_files {
        if let EtcOutcome::Preserved { existing, default } = outcome {
            println!("  - Kept {}, new version at {}", existing.display(), default.display());
        }
    }
    if !result.warnings.is_empty() {
        println!("\nBuild warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }
    println!(
        "\n[COMPLETE] {} {} installed to {}",
        recipe.package.name,
        result.pkg_version,
        result.prefix.display()
    );

    if test {
        let ctx = kitchen.context(&recipe)?;
        kitchen
            .smoke_test(&recipe, &ctx, offline)
            .with_context(|| format!("Smoke test failed for {}", recipe.package.name))?;
        println!("[OK] Smoke test passed");
    }

    info!("Installed {} to {}", recipe.package.name, result.prefix.display());
    Ok(())
}

/// Seed runtime state under var
pub fn cmd_post_install(global: &GlobalArgs) -> Result<()> {
    let (recipe, kitchen) = open_kitchen(global)?;
    let ctx = kitchen.context(&recipe)?;

    let report = kitchen.post_install(&ctx).context("Post-install failed")?;
    if report.zone_files_written {
        println!("Created zone data in {}", ctx.var.join("named").display());
    } else {
        println!("Zone data already present, left unchanged");
    }
    Ok(())
}

/// Smoke test the installed binaries
pub fn cmd_test(global: &GlobalArgs, offline: bool) -> Result<()> {
    let (recipe, kitchen) = open_kitchen(global)?;
    let ctx = kitchen.context(&recipe)?;

    let report = kitchen
        .smoke_test(&recipe, &ctx, offline)
        .with_context(|| format!("Smoke test failed for {}", recipe.package.name))?;

    for command in &report.commands {
        println!("  - {}", command);
    }
    if report.probe_skipped {
        println!("  - name resolution probe skipped");
    }
    println!("[OK] Smoke test passed");
    Ok(())
}

/// Remove the keg and opt link
pub fn cmd_uninstall(global: &GlobalArgs) -> Result<()> {
    let (recipe, kitchen) = open_kitchen(global)?;

    let removed = kitchen
        .uninstall(&recipe)
        .with_context(|| format!("Failed to uninstall {}", recipe.package.name))?;
    for path in &removed {
        println!("Removed {}", path.display());
    }
    println!("Configuration in etc and data in var were kept");
    Ok(())
}
