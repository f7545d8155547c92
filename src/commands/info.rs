// src/commands/info.rs
//! Info command - show recipe metadata

use super::{load_config, load_recipe};
use crate::cli::GlobalArgs;
use anyhow::Result;
use bindcook::recipe::InstallContext;
use bindcook::recipe::kitchen::receipt::InstallReceipt;

pub fn cmd_info(global: &GlobalArgs) -> Result<()> {
    let recipe = load_recipe(global)?;
    let config = load_config(global)?;
    let ctx = InstallContext::for_recipe(&config.root, &recipe)?;
    let package = &recipe.package;

    println!("{}: stable {}", package.name, recipe.pkg_version()?);
    if let Some(desc) = &package.desc {
        println!("{}", desc);
    }
    if let Some(homepage) = &package.homepage {
        println!("{}", homepage);
    }
    if let Some(license) = &package.license {
        println!("License: {}", license);
    }
    println!("Source: {}", recipe.source_url());
    println!("  sha256: {}", recipe.source.sha256);
    if let Some(head) = &package.head {
        println!("Head: {}", head);
    }
    if package.version_scheme > 0 {
        println!("Version scheme: {}", package.version_scheme);
    }

    let build: Vec<_> = recipe.build_deps().map(|d| d.install_name()).collect();
    let runtime: Vec<_> = recipe.runtime_deps().map(|d| d.install_name()).collect();
    if !build.is_empty() {
        println!("Build: {}", build.join(", "));
    }
    if !runtime.is_empty() {
        println!("Required: {}", runtime.join(", "));
    }
    for resource in &recipe.resources {
        println!("Resource: {} ({})", resource.name, resource.url);
    }

    match InstallReceipt::load(&ctx.prefix) {
        Ok(receipt) => println!(
            "Installed: {} ({})",
            ctx.prefix.display(),
            receipt.installed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        Err(_) => println!("Not installed"),
    }

    Ok(())
}
