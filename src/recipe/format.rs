// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files that declare everything needed to build a package:
//! identity and version policy, where upstream publishes releases, what must
//! be present before building, which auxiliary sources get vendored, and how
//! to drive the upstream build system.

use crate::error::Result;
use crate::hash::Checksum;
use crate::version::{PkgVersion, UpstreamVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete recipe for building a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Primary source archive
    pub source: SourceSection,

    /// Upstream version discovery (optional)
    #[serde(default)]
    pub livecheck: Option<LivecheckSection>,

    /// Build- and run-time prerequisites
    #[serde(default)]
    pub depends: Vec<Dependency>,

    /// Auxiliary sources installed into the package's private vendor dir
    #[serde(default)]
    pub resources: Vec<ResourceSection>,

    /// Build instructions
    #[serde(default)]
    pub build: BuildSection,

    /// Service supervisor descriptor (optional)
    #[serde(default)]
    pub service: Option<ServiceSection>,

    /// Post-install verification
    #[serde(default)]
    pub smoke: SmokeSection,
}

impl Recipe {
    /// Substitute the built-in `%(name)s` and `%(version)s` variables
    pub fn substitute(&self, template: &str) -> String {
        template
            .replace("%(version)s", &self.package.version)
            .replace("%(name)s", &self.package.name)
    }

    /// Get the archive URL with variables substituted
    pub fn source_url(&self) -> String {
        self.substitute(&self.source.url)
    }

    /// Get the archive filename from the URL
    pub fn archive_filename(&self) -> String {
        filename_from_url(&self.source_url(), "source.tar.gz")
    }

    /// Parsed upstream version
    pub fn upstream_version(&self) -> Result<UpstreamVersion> {
        UpstreamVersion::parse(&self.package.version)
    }

    /// Full package version including scheme and revision
    pub fn pkg_version(&self) -> Result<PkgVersion> {
        Ok(PkgVersion::new(
            self.package.version_scheme,
            self.upstream_version()?,
            self.package.revision,
        ))
    }

    /// Dependencies needed only while building
    pub fn build_deps(&self) -> impl Iterator<Item = &Dependency> {
        self.depends.iter().filter(|d| d.kind == DependencyKind::Build)
    }

    /// Dependencies needed at run time (and while building)
    pub fn runtime_deps(&self) -> impl Iterator<Item = &Dependency> {
        self.depends.iter().filter(|d| d.kind == DependencyKind::Runtime)
    }

    /// Find a declared dependency by its plain name
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.depends.iter().find(|d| d.name == name)
    }
}

/// Last path segment of a URL, or `fallback` when there is none
pub(crate) fn filename_from_url(url: &str, fallback: &str) -> String {
    url.split('/')
        .next_back()
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Upstream version
    pub version: String,

    /// Short description
    #[serde(default)]
    pub desc: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Rebuild counter for the same upstream version
    #[serde(default)]
    pub revision: u32,

    /// Bumped to force ordering when upstream numbering went backwards
    #[serde(default)]
    pub version_scheme: u32,

    /// Development repository URL
    #[serde(default)]
    pub head: Option<String>,
}

/// Source archive section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Archive URL
    ///
    /// Supports `%(version)s` substitution.
    pub url: String,

    /// Expected SHA-256 of the archive
    pub sha256: Checksum,
}

/// How newer stable upstream releases are discovered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivecheckSection {
    /// Listing page to scan
    pub url: String,

    /// Extraction pattern; the first capture group is the version
    pub regex: String,

    /// Filter applied to every candidate before picking the greatest
    #[serde(default)]
    pub stability: Stability,
}

/// Which upstream releases count as stable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Stability {
    /// Every matched version qualifies
    #[default]
    Any,
    /// Only versions whose minor component is even
    EvenMinor,
}

impl Stability {
    pub fn accepts(&self, version: &UpstreamVersion) -> bool {
        match self {
            Stability::Any => true,
            Stability::EvenMinor => version.has_even_minor(),
        }
    }
}

/// Scope of a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Needed only to build (e.g. pkg-config)
    Build,
    /// Needed to build and to run
    #[default]
    Runtime,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Build => "build",
            DependencyKind::Runtime => "runtime",
        }
    }
}

/// A build- or run-time prerequisite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name
    pub name: String,

    /// Scope (defaults to runtime)
    #[serde(default)]
    pub kind: DependencyKind,

    /// Versioned package line, e.g. `1.1` for `openssl@1.1`
    #[serde(default)]
    pub version: Option<String>,

    /// Configure flag contributed once resolved
    ///
    /// `%(opt)s` expands to the dependency's resolved prefix.
    #[serde(default)]
    pub configure_flag: Option<String>,
}

impl Dependency {
    pub fn new(name: &str, kind: DependencyKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            version: None,
            configure_flag: None,
        }
    }

    /// Installed name: `openssl@1.1` when pinned, else just the name
    pub fn install_name(&self) -> String {
        match &self.version {
            Some(v) => format!("{}@{}", self.name, v),
            None => self.name.clone(),
        }
    }
}

/// How a vendored resource is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceInstaller {
    /// `setup.py install` with the interpreter of the `python` dependency
    #[default]
    Python,
}

/// A secondary source archive installed into the vendor dir
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSection {
    /// Resource name
    pub name: String,

    /// Archive URL
    pub url: String,

    /// Expected SHA-256 of the archive
    pub sha256: Checksum,

    /// Packaging mechanism used to install it
    #[serde(default)]
    pub installer: ResourceInstaller,
}

impl ResourceSection {
    pub fn archive_filename(&self) -> String {
        filename_from_url(&self.url, &format!("{}.tar.gz", self.name))
    }
}

/// Build instructions section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Static configure flags
    ///
    /// Supports path variables such as `%(prefix)s` and
    /// `%(vendor_site_packages)s`. Flags contributed by dependencies are
    /// appended after these.
    #[serde(default)]
    pub configure: Vec<String>,

    /// Targets for the compile step (empty = default target)
    #[serde(default)]
    pub make: Vec<String>,

    /// Targets for the install step
    #[serde(default = "default_install_targets")]
    pub install: Vec<String>,

    /// Environment variables set for every build step
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Number of parallel jobs (default: kitchen setting)
    #[serde(default)]
    pub jobs: Option<u32>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            configure: Vec::new(),
            make: Vec::new(),
            install: default_install_targets(),
            environment: BTreeMap::new(),
            jobs: None,
        }
    }
}

fn default_install_targets() -> Vec<String> {
    vec!["install".to_string()]
}

/// Service supervisor descriptor section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSection {
    /// Program path relative to the opt prefix
    pub program: String,

    /// Program arguments; supports `%(etc)s` and friends
    #[serde(default)]
    pub args: Vec<String>,

    /// Start as soon as the descriptor is loaded
    #[serde(default = "default_true")]
    pub run_at_load: bool,

    /// Install as a system daemon rather than a per-user agent
    #[serde(default)]
    pub startup: bool,
}

fn default_true() -> bool {
    true
}

/// Smoke test section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SmokeSection {
    /// Command proving the binary launches, relative to the keg
    #[serde(default)]
    pub version_check: Vec<String>,

    /// Command that resolves a name; the probe name is appended
    #[serde(default)]
    pub resolve: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RECIPE: &str = r#"
[package]
name = "nginx"
version = "1.24.0"
license = "BSD-2-Clause"
homepage = "https://nginx.org"
revision = 2

[source]
url = "https://nginx.org/download/nginx-%(version)s.tar.gz"
sha256 = "77a2541637b92a621e3ee76571f6e9af0b4e6a6a1f5b0fd3d5c9cf6c8c55e301"

[[depends]]
name = "pkg-config"
kind = "build"

[[depends]]
name = "openssl"
version = "3"
configure_flag = "--with-openssl=%(opt)s"

[build]
configure = ["--prefix=%(prefix)s", "--with-http_ssl_module"]
"#;

    #[test]
    fn test_parse_recipe() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();
        assert_eq!(recipe.package.name, "nginx");
        assert_eq!(recipe.package.revision, 2);
        assert_eq!(recipe.package.version_scheme, 0);
        assert_eq!(recipe.build.configure.len(), 2);
        assert_eq!(recipe.build.install, vec!["install"]);
        assert!(recipe.livecheck.is_none());
        assert!(recipe.service.is_none());
    }

    #[test]
    fn test_source_url_substitution() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();
        assert_eq!(
            recipe.source_url(),
            "https://nginx.org/download/nginx-1.24.0.tar.gz"
        );
        assert_eq!(recipe.archive_filename(), "nginx-1.24.0.tar.gz");
    }

    #[test]
    fn test_dependency_scopes() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();
        let build: Vec<_> = recipe.build_deps().map(|d| d.name.as_str()).collect();
        let runtime: Vec<_> = recipe.runtime_deps().map(|d| d.name.as_str()).collect();
        assert_eq!(build, vec!["pkg-config"]);
        assert_eq!(runtime, vec!["openssl"]);
    }

    #[test]
    fn test_install_name_uses_version_pin() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();
        assert_eq!(recipe.dependency("openssl").unwrap().install_name(), "openssl@3");
        assert_eq!(recipe.dependency("pkg-config").unwrap().install_name(), "pkg-config");
    }

    #[test]
    fn test_pkg_version() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();
        assert_eq!(recipe.pkg_version().unwrap().to_string(), "1.24.0_2");
    }

    #[test]
    fn test_even_minor_stability() {
        let stable = UpstreamVersion::parse("9.16.7").unwrap();
        let dev = UpstreamVersion::parse("9.17.3").unwrap();
        assert!(Stability::EvenMinor.accepts(&stable));
        assert!(!Stability::EvenMinor.accepts(&dev));
        assert!(Stability::Any.accepts(&dev));
    }

    #[test]
    fn test_filename_from_url_fallback() {
        assert_eq!(filename_from_url("https://example.com/", "x.tar.gz"), "x.tar.gz");
        assert_eq!(filename_from_url("https://example.com/a.tgz", "x"), "a.tgz");
    }
}
