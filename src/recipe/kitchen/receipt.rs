// src/recipe/kitchen/receipt.rs

//! Install receipt written into every keg
//!
//! The receipt accumulates facts through each phase of an install (source,
//! resolved dependencies, staged resources, configure arguments, quirks) and
//! is written as `INSTALL_RECEIPT.json` once the install has succeeded.

use crate::dependencies::DependencyGraph;
use crate::error::{Error, Result};
use crate::platform::{Platform, QuirkId};
use crate::recipe::Recipe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the receipt inside the keg
pub const RECEIPT_FILE: &str = "INSTALL_RECEIPT.json";

/// Record of one completed install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub name: String,
    pub pkg_version: String,
    pub version_scheme: u32,
    pub source: ReceiptSource,
    pub dependencies: Vec<ReceiptDependency>,
    pub resources: Vec<String>,
    pub configure_args: Vec<String>,
    pub quirks: Vec<String>,
    pub platform: ReceiptPlatform,
    pub installed_at: DateTime<Utc>,
    /// Tool version that produced the keg
    pub built_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSource {
    pub url: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptDependency {
    pub name: String,
    pub kind: String,
    pub prefix: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptPlatform {
    pub os: String,
    pub release: Option<String>,
    pub arch: String,
}

impl InstallReceipt {
    /// Start a receipt for `recipe`
    pub fn new(recipe: &Recipe, platform: &Platform) -> Result<Self> {
        Ok(Self {
            name: recipe.package.name.clone(),
            pkg_version: recipe.pkg_version()?.to_string(),
            version_scheme: recipe.package.version_scheme,
            source: ReceiptSource {
                url: recipe.source_url(),
                sha256: recipe.source.sha256.to_prefixed_string(),
            },
            dependencies: Vec::new(),
            resources: Vec::new(),
            configure_args: Vec::new(),
            quirks: Vec::new(),
            platform: ReceiptPlatform {
                os: platform.os.to_string(),
                release: platform.macos.map(|r| r.to_string()),
                arch: platform.arch.clone(),
            },
            installed_at: Utc::now(),
            built_by: concat!("bindcook ", env!("CARGO_PKG_VERSION")).to_string(),
        })
    }

    /// Record the resolved dependencies
    pub fn record_dependencies(&mut self, graph: &DependencyGraph) {
        self.dependencies = graph
            .resolved_all()
            .map(|d| ReceiptDependency {
                name: d.name.clone(),
                kind: d.kind.as_str().to_string(),
                prefix: d.prefix.clone(),
            })
            .collect();
    }

    pub fn record_resources(&mut self, names: &[String]) {
        self.resources = names.to_vec();
    }

    pub fn record_build(&mut self, configure_args: &[String], quirks: &[QuirkId]) {
        self.configure_args = configure_args.to_vec();
        self.quirks = quirks.iter().map(|q| q.to_string()).collect();
    }

    /// Write the receipt into `prefix`, stamping the completion time
    pub fn write(&mut self, prefix: &Path) -> Result<PathBuf> {
        self.installed_at = Utc::now();
        let path = prefix.join(RECEIPT_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ParseError(format!("Failed to serialize receipt: {}", e)))?;
        fs::write(&path, json + "\n")
            .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(path)
    }

    /// Read the receipt of an installed keg
    pub fn load(prefix: &Path) -> Result<Self> {
        let path = prefix.join(RECEIPT_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|_| Error::NotFound(format!("No install receipt at {}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::ParseError(format!("Invalid receipt {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MacosRelease;
    use crate::recipe::parser::builtin_recipe;

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = builtin_recipe().unwrap();
        let platform = Platform::macos(MacosRelease::Sierra, None);

        let mut receipt = InstallReceipt::new(&recipe, &platform).unwrap();
        receipt.record_resources(&["ply".to_string()]);
        receipt.record_build(&["--prefix=/k".to_string()], &[QuirkId::XmlConfigSdkRoot]);
        let path = receipt.write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(RECEIPT_FILE));

        let loaded = InstallReceipt::load(dir.path()).unwrap();
        assert_eq!(loaded, receipt);
        assert_eq!(loaded.pkg_version, "9.16.7_1");
        assert_eq!(loaded.version_scheme, 1);
        assert_eq!(loaded.quirks, vec!["xml-config-sdkroot"]);
        assert_eq!(loaded.platform.release.as_deref(), Some("sierra"));
        assert!(loaded.source.sha256.starts_with("sha256:"));
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(InstallReceipt::load(dir.path()), Err(Error::NotFound(_))));
    }
}
