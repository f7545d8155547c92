// src/recipe/kitchen/context.rs

//! Install context: every filesystem location the pipeline touches
//!
//! Locations are computed once from a root directory and the recipe, then
//! passed explicitly to each phase. Nothing in the pipeline looks paths up
//! ambiently, which keeps every phase runnable against a scratch root.
//!
//! Layout under `root`:
//!
//! ```text
//! <root>/Cellar/<name>/<pkg_version>   keg (prefix): bin, sbin, libexec, ...
//! <root>/opt/<name>                    stable link to the current keg
//! <root>/etc                           configuration and key file
//! <root>/var                           log and zone data
//! ```

use crate::error::Result;
use crate::recipe::format::Recipe;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolved paths for one package install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    pub root: PathBuf,
    /// Versioned install prefix (keg)
    pub prefix: PathBuf,
    /// Version-independent prefix used by anything that outlives an upgrade
    pub opt_prefix: PathBuf,
    pub etc: PathBuf,
    pub var: PathBuf,
}

impl InstallContext {
    /// Compute the standard layout for `recipe` under `root`
    pub fn for_recipe(root: &Path, recipe: &Recipe) -> Result<Self> {
        let pkg_version = recipe.pkg_version()?;
        Ok(Self {
            root: root.to_path_buf(),
            prefix: root
                .join("Cellar")
                .join(&recipe.package.name)
                .join(pkg_version.to_string()),
            opt_prefix: root.join("opt").join(&recipe.package.name),
            etc: root.join("etc"),
            var: root.join("var"),
        })
    }

    /// A flat layout where the keg is also the opt prefix
    pub fn flat(prefix: &Path, etc: &Path, var: &Path) -> Self {
        Self {
            root: prefix.to_path_buf(),
            prefix: prefix.to_path_buf(),
            opt_prefix: prefix.to_path_buf(),
            etc: etc.to_path_buf(),
            var: var.to_path_buf(),
        }
    }

    pub fn bin(&self) -> PathBuf {
        self.prefix.join("bin")
    }

    pub fn sbin(&self) -> PathBuf {
        self.prefix.join("sbin")
    }

    pub fn libexec(&self) -> PathBuf {
        self.prefix.join("libexec")
    }

    pub fn opt_sbin(&self) -> PathBuf {
        self.opt_prefix.join("sbin")
    }

    /// Private prefix for vendored resources
    pub fn vendor_dir(&self) -> PathBuf {
        self.libexec().join("vendor")
    }

    /// site-packages inside the vendor dir for a `X.Y` interpreter
    pub fn vendor_site_packages(&self, python_xy: &str) -> PathBuf {
        self.vendor_dir()
            .join("lib")
            .join(format!("python{}", python_xy))
            .join("site-packages")
    }
}

/// `%(name)s` substitution table for build flags and service arguments
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    /// Base variables derived from the recipe and context
    pub fn new(recipe: &Recipe, ctx: &InstallContext) -> Self {
        let mut vars = Self::default();
        vars.set("name", &recipe.package.name);
        vars.set("version", &recipe.package.version);
        vars.set_path("prefix", &ctx.prefix);
        vars.set_path("opt_prefix", &ctx.opt_prefix);
        vars.set_path("bin", &ctx.bin());
        vars.set_path("sbin", &ctx.sbin());
        vars.set_path("libexec", &ctx.libexec());
        vars.set_path("etc", &ctx.etc);
        vars.set_path("var", &ctx.var);
        vars
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn set_path(&mut self, key: &str, value: &Path) {
        self.set(key, &value.to_string_lossy());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Replace every known `%(key)s` in `template`
    pub fn apply(&self, template: &str) -> String {
        let mut result = template.to_string();
        for (key, value) in &self.values {
            result = result.replace(&format!("%({})s", key), value);
        }
        result
    }
}
