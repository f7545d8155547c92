// src/lib.rs

//! bindcook: build, install and verify the BIND name server from a recipe
//!
//! The install pipeline is driven by a TOML recipe (a built-in one for
//! BIND ships with the crate) and runs against an explicit prefix layout:
//!
//! - Dependencies are located before anything is fetched
//! - Source and vendored resources are verified by SHA-256
//! - configure, make and make install run through an injectable runner
//! - Configuration lands in `etc` without clobbering local edits
//! - Post-install seeds log and zone data under `var`, idempotently
//!
//! Livecheck, the launchd service descriptor and the smoke test operate on
//! the same recipe.

pub mod dependencies;
mod error;
pub mod hash;
pub mod livecheck;
pub mod platform;
pub mod recipe;
pub mod service;
pub mod smoke;
pub mod templates;
pub mod version;

pub use error::{Error, Result};
pub use hash::Checksum;
pub use platform::{MacosRelease, Platform};
pub use recipe::{InstallContext, Kitchen, KitchenConfig, Recipe};
pub use version::{PkgVersion, UpstreamVersion};
