// src/commands/mod.rs
//! Command handlers for the bindcook CLI

mod info;
mod install;
mod livecheck;
mod service;

pub use info::cmd_info;
pub use install::{cmd_fetch, cmd_install, cmd_post_install, cmd_test, cmd_uninstall};
pub use livecheck::cmd_livecheck;
pub use service::cmd_service;

use crate::cli::GlobalArgs;
use anyhow::{Context, Result};
use bindcook::recipe::{
    Kitchen, KitchenConfig, Recipe, builtin_recipe, parse_recipe_file, validate_recipe,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Load the configuration, applying `--root` on top of the file
pub fn load_config(global: &GlobalArgs) -> Result<KitchenConfig> {
    let mut config = match &global.config {
        Some(path) => KitchenConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => KitchenConfig::default(),
    };

    if let Some(root) = &global.root {
        config.root = PathBuf::from(root);
    }
    debug!("Using root {}", config.root.display());
    Ok(config)
}

/// Load and validate the recipe selected on the command line
pub fn load_recipe(global: &GlobalArgs) -> Result<Recipe> {
    let recipe = match &global.recipe {
        Some(path) => parse_recipe_file(Path::new(path))
            .with_context(|| format!("Failed to parse recipe: {}", path))?,
        None => builtin_recipe().context("Built-in recipe is invalid")?,
    };

    let warnings = validate_recipe(&recipe).context("Recipe validation failed")?;
    for warning in &warnings {
        warn!("{}", warning);
    }
    Ok(recipe)
}

/// Recipe plus a kitchen wired to the real system
pub fn open_kitchen(global: &GlobalArgs) -> Result<(Recipe, Kitchen)> {
    let recipe = load_recipe(global)?;
    let config = load_config(global)?;
    let kitchen = Kitchen::with_system(config).context("Failed to set up the kitchen")?;
    Ok((recipe, kitchen))
}
