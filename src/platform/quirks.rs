// src/platform/quirks.rs

//! Platform quirk table
//!
//! Each entry names a known toolchain defect, the releases it affects and the
//! environment override that works around it. Lookup is by structured
//! release, never by comparing version strings.

use super::{MacosRelease, Platform};
use std::fmt;
use tracing::{info, warn};

/// Identifier of a known build workaround
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuirkId {
    /// configure fails with "xml2-config returns badness" unless SDKROOT
    /// points at the active SDK
    XmlConfigSdkRoot,
}

impl fmt::Display for QuirkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuirkId::XmlConfigSdkRoot => write!(f, "xml-config-sdkroot"),
        }
    }
}

/// Environment change a quirk applies to every build step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvOverride {
    /// `SDKROOT=<platform sdk path>`
    SdkRoot,
}

impl EnvOverride {
    /// Variable this override controls
    pub fn key(&self) -> &'static str {
        match self {
            EnvOverride::SdkRoot => "SDKROOT",
        }
    }
}

/// One row of the quirk table
#[derive(Debug, Clone, Copy)]
pub struct PlatformQuirk {
    pub id: QuirkId,
    pub releases: &'static [MacosRelease],
    pub env: EnvOverride,
}

impl PlatformQuirk {
    pub fn applies_to(&self, platform: &Platform) -> bool {
        platform
            .macos
            .is_some_and(|release| self.releases.contains(&release))
    }
}

/// Known workarounds
pub const QUIRKS: &[PlatformQuirk] = &[PlatformQuirk {
    id: QuirkId::XmlConfigSdkRoot,
    releases: &[MacosRelease::ElCapitan, MacosRelease::Sierra],
    env: EnvOverride::SdkRoot,
}];

/// Quirks selected for a platform and the environment they produce
///
/// Every variable the table controls ends up either in `env` or in `unset`,
/// so a value inherited from the caller never reaches a build step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedQuirks {
    pub ids: Vec<QuirkId>,
    pub env: Vec<(String, String)>,
    /// Controlled variables no applied quirk set
    pub unset: Vec<String>,
}

impl AppliedQuirks {
    /// Look up every quirk in `table` that applies to `platform`
    pub fn select(platform: &Platform, table: &[PlatformQuirk]) -> Self {
        let mut applied = Self::default();

        for quirk in table.iter().filter(|q| q.applies_to(platform)) {
            match quirk.env {
                EnvOverride::SdkRoot => match &platform.sdk_path {
                    Some(sdk) => {
                        info!("Applying quirk {}: SDKROOT={}", quirk.id, sdk.display());
                        applied.env.push((
                            quirk.env.key().to_string(),
                            sdk.to_string_lossy().to_string(),
                        ));
                        applied.ids.push(quirk.id);
                    }
                    None => {
                        warn!("Quirk {} applies but no SDK path was found, skipping", quirk.id);
                    }
                },
            }
        }

        for key in table.iter().map(|q| q.env.key()) {
            if applied.get(key).is_none() && !applied.unset.iter().any(|k| k == key) {
                applied.unset.push(key.to_string());
            }
        }

        applied
    }

    /// Value set for `key`, if any quirk set it
    pub fn get(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
