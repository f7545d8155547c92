// src/recipe/mod.rs

//! Recipe system for building packages from source
//!
//! A recipe declares:
//! - Package identity and version policy (revision, version scheme)
//! - Where upstream publishes stable releases (livecheck)
//! - Build and runtime dependencies
//! - Vendored resources staged into a private directory
//! - Configure flags and build targets
//! - The service descriptor and smoke test
//!
//! # Culinary Terminology
//!
//! - **Recipe**: The build specification
//! - **Kitchen**: Runs the install pipeline for a recipe
//! - **Cook**: One install run (prep, stage resources, simmer, plate)
//! - **Ingredients**: Source archive and vendored resources
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "bind"
//! version = "9.16.7"
//! revision = 1
//!
//! [source]
//! url = "https://downloads.isc.org/isc/bind9/%(version)s/bind-%(version)s.tar.xz"
//! sha256 = "9f7d1812ebbd26a699f62b6fa8522d5dec57e4bf43af0042a0d60d39ed8314d1"
//!
//! [[depends]]
//! name = "openssl"
//! version = "1.1"
//! configure_flag = "--with-openssl=%(opt)s"
//!
//! [build]
//! configure = ["--prefix=%(prefix)s", "--without-lmdb"]
//! ```

mod format;
pub mod kitchen;
pub mod parser;

pub use format::{
    BuildSection, Dependency, DependencyKind, LivecheckSection, PackageSection, Recipe,
    ResourceInstaller, ResourceSection, ServiceSection, SmokeSection, SourceSection, Stability,
};
pub use kitchen::{EtcOutcome, InstallContext, InstallResult, Kitchen, KitchenConfig};
pub use parser::{builtin_recipe, parse_recipe, parse_recipe_file, validate_recipe};
