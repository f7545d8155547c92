// src/dependencies/mod.rs

//! Dependency declaration and resolution
//!
//! A recipe declares its dependencies as data. Before a build starts, the
//! [`DependencyGraph`] asks a [`DependencyResolver`] where each one is
//! installed and records the resolved prefix. Configure flags that point at
//! a dependency are rendered from those prefixes.
//!
//! # Example
//!
//! ```ignore
//! use bindcook::dependencies::{DependencyGraph, OptPrefixResolver};
//!
//! let mut graph = DependencyGraph::from_recipe(&recipe);
//! graph.resolve(&OptPrefixResolver::new(Path::new("/usr/local/opt")))?;
//! let flags = graph.configure_flags();
//! // ["--with-libjson=/usr/local/opt/json-c", "--with-openssl=/usr/local/opt/openssl@1.1", ...]
//! ```

use crate::error::{Error, Result};
use crate::recipe::{Dependency, DependencyKind, Recipe};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locates installed dependencies
///
/// Keeps the graph independent of how packages are actually installed.
pub trait DependencyResolver: Send + Sync {
    /// Prefix of the installed dependency, or `None` if it is not available
    fn locate(&self, dep: &Dependency) -> Result<Option<PathBuf>>;
}

/// Resolves dependencies through `<opt_root>/<install name>` links
///
/// Build-only tools that are not linked under `opt` are also accepted from
/// `PATH`, with the prefix taken as the parent of the binary's directory.
pub struct OptPrefixResolver {
    opt_root: PathBuf,
}

impl OptPrefixResolver {
    pub fn new(opt_root: &Path) -> Self {
        Self {
            opt_root: opt_root.to_path_buf(),
        }
    }
}

impl DependencyResolver for OptPrefixResolver {
    fn locate(&self, dep: &Dependency) -> Result<Option<PathBuf>> {
        let opt = self.opt_root.join(dep.install_name());
        if opt.exists() {
            return Ok(Some(opt));
        }

        if dep.kind == DependencyKind::Build
            && let Ok(binary) = which::which(&dep.name)
        {
            debug!("Found build tool {} at {}", dep.name, binary.display());
            let prefix = binary
                .parent()
                .and_then(|bin| bin.parent())
                .map(Path::to_path_buf)
                .unwrap_or(binary);
            return Ok(Some(prefix));
        }

        Ok(None)
    }
}

/// A dependency with its install location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub name: String,
    pub kind: DependencyKind,
    pub prefix: PathBuf,
    /// Configure flag with `%(opt)s` replaced by `prefix`
    pub configure_flag: Option<String>,
}

/// Declared dependencies of one recipe and their resolved locations
#[derive(Debug, Default)]
pub struct DependencyGraph {
    inputs: Vec<Dependency>,
    resolved: BTreeMap<String, ResolvedDependency>,
}

impl DependencyGraph {
    pub fn new(inputs: Vec<Dependency>) -> Self {
        Self {
            inputs,
            resolved: BTreeMap::new(),
        }
    }

    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self::new(recipe.depends.clone())
    }

    /// Declared dependencies, in recipe order
    pub fn inputs(&self) -> &[Dependency] {
        &self.inputs
    }

    /// Resolve every declared dependency
    ///
    /// Fails with [`Error::ResolutionError`] naming every dependency that
    /// could not be located. Nothing is recorded in that case.
    pub fn resolve(&mut self, resolver: &dyn DependencyResolver) -> Result<()> {
        let mut resolved = BTreeMap::new();
        let mut missing = Vec::new();

        for dep in &self.inputs {
            match resolver.locate(dep)? {
                Some(prefix) => {
                    debug!("Resolved {} ({}) to {}", dep.name, dep.kind.as_str(), prefix.display());
                    let configure_flag = dep
                        .configure_flag
                        .as_ref()
                        .map(|flag| flag.replace("%(opt)s", &prefix.to_string_lossy()));
                    resolved.insert(
                        dep.name.clone(),
                        ResolvedDependency {
                            name: dep.name.clone(),
                            kind: dep.kind,
                            prefix,
                            configure_flag,
                        },
                    );
                }
                None => missing.push(dep.install_name()),
            }
        }

        if !missing.is_empty() {
            return Err(Error::ResolutionError(format!(
                "Unresolved dependencies: {}",
                missing.join(", ")
            )));
        }

        info!("Resolved {} dependencies", resolved.len());
        self.resolved = resolved;
        Ok(())
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.len() == self.inputs.len()
    }

    pub fn resolved(&self, name: &str) -> Option<&ResolvedDependency> {
        self.resolved.get(name)
    }

    /// Resolved dependencies in declaration order
    pub fn resolved_all(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.inputs.iter().filter_map(|d| self.resolved.get(&d.name))
    }

    /// Dependency-derived configure flags, in declaration order
    pub fn configure_flags(&self) -> Vec<String> {
        self.resolved_all()
            .filter_map(|d| d.configure_flag.clone())
            .collect()
    }
}
