// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::error::{Error, Result};
use crate::platform::QuirkId;
use crate::recipe::kitchen::post_install::PostInstallReport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for the Kitchen
///
/// Every field has a default, so a config file only needs the keys it wants
/// to change:
///
/// ```toml
/// root = "/opt/homebrew"
/// jobs = 8
///
/// [smoke]
/// resolve_name = ""   # skip the network probe
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitchenConfig {
    /// Prefix under which Cellar, opt, etc and var live
    pub root: PathBuf,
    /// Directory for cached source archives
    pub source_cache: PathBuf,
    /// Number of parallel make jobs; overrides the recipe when set
    pub jobs: Option<u32>,
    /// Keep the build directory after cooking (for debugging)
    pub keep_builddir: bool,
    /// Show download progress bars
    pub show_progress: bool,
    pub service: ServiceConfig,
    pub smoke: SmokeConfig,
}

/// Service descriptor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Label is `<label_prefix>.<name>`
    pub label_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            label_prefix: "homebrew.mxcl".to_string(),
        }
    }
}

/// Smoke test settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeConfig {
    /// Name resolved by the probe step; empty disables the probe
    pub resolve_name: String,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            resolve_name: "brew.sh".to_string(),
        }
    }
}

impl SmokeConfig {
    pub fn probe_name(&self) -> Option<&str> {
        let name = self.resolve_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/usr/local"),
            source_cache: default_source_cache(),
            jobs: None,
            keep_builddir: false,
            show_progress: true,
            service: ServiceConfig::default(),
            smoke: SmokeConfig::default(),
        }
    }
}

fn default_source_cache() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("bindcook").join("sources"))
        .unwrap_or_else(|| PathBuf::from("/var/cache/bindcook/sources"))
}

impl KitchenConfig {
    /// Parse a TOML config, filling unset keys from the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::ParseError(format!("Invalid config: {}", e)))
    }

    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parallel jobs for make
    ///
    /// An explicit setting wins over the recipe's hint, which wins over the
    /// host's available parallelism.
    pub fn make_jobs(&self, recipe_jobs: Option<u32>) -> u32 {
        self.jobs.or(recipe_jobs).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get() as u32)
                .unwrap_or(4)
        })
    }

    /// A configuration rooted at `root` with its own source cache
    ///
    /// Everything the pipeline writes stays under `root`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            source_cache: root.join("cache").join("sources"),
            show_progress: false,
            ..Self::default()
        }
    }
}

/// Outcome of installing one file into `etc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EtcOutcome {
    /// File did not exist and was written
    Installed(PathBuf),
    /// Existing file already had the same contents
    Unchanged(PathBuf),
    /// Existing file differs; the new one was written beside it
    Preserved { existing: PathBuf, default: PathBuf },
}

/// Result of installing a recipe
#[derive(Debug)]
pub struct InstallResult {
    /// Keg the package was installed into
    pub prefix: PathBuf,
    /// Version string of the keg (`9.16.7_1`)
    pub pkg_version: String,
    /// Build log
    pub log: String,
    /// Warnings generated during the install
    pub warnings: Vec<String>,
    /// Final configure arguments, after substitution
    pub configure_args: Vec<String>,
    /// Platform quirks applied to the build environment
    pub quirks: Vec<QuirkId>,
    /// What happened to each configuration file
    pub etc_files: Vec<EtcOutcome>,
    /// Where the install receipt was written
    pub receipt_path: PathBuf,
    /// What post-install changed under `var`
    pub post_install: PostInstallReport,
}
