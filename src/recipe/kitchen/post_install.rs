// src/recipe/kitchen/post_install.rs

//! Post-install materialization of runtime state under `var`
//!
//! Safe to run any number of times: the log directory is created if needed,
//! and zone data is seeded only when the zone directory does not exist yet.
//! An existing zone directory is never touched.

use crate::error::{Error, Result};
use crate::recipe::kitchen::context::InstallContext;
use crate::templates::{self, LOCALHOST_ZONE_FILE, NAMED_LOCAL_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a post-install run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostInstallReport {
    pub log_dir_created: bool,
    pub zone_files_written: bool,
}

/// `<var>/log/named`
pub fn log_dir(ctx: &InstallContext) -> PathBuf {
    ctx.var.join("log").join("named")
}

/// `<var>/named`
pub fn zone_dir(ctx: &InstallContext) -> PathBuf {
    ctx.var.join("named")
}

pub fn run(ctx: &InstallContext) -> Result<PostInstallReport> {
    let mut report = PostInstallReport::default();

    let log_dir = log_dir(ctx);
    if !log_dir.is_dir() {
        create_dir(&log_dir)?;
        report.log_dir_created = true;
    }

    let zone_dir = zone_dir(ctx);
    if zone_dir.exists() {
        debug!("{} exists, leaving zone data alone", zone_dir.display());
    } else {
        create_dir(&zone_dir)?;
        write_file(&zone_dir.join(LOCALHOST_ZONE_FILE), &templates::localhost_zone())?;
        write_file(&zone_dir.join(NAMED_LOCAL_FILE), &templates::named_local())?;
        info!("Seeded zone data in {}", zone_dir.display());
        report.zone_files_written = true;
    }

    Ok(report)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {}", path.display(), e)))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))
}
