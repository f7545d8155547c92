// src/platform/mod.rs

//! Host platform description
//!
//! The build host is described by a structured [`Platform`] value instead of
//! raw version strings. Build workarounds key off named [`MacosRelease`]
//! variants through the table in [`quirks`].

pub mod quirks;

pub use quirks::{AppliedQuirks, EnvOverride, PlatformQuirk, QUIRKS, QuirkId};

use crate::error::{Error, Result};
use crate::recipe::kitchen::runner::{Step, StepRunner};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    MacOs,
    Other,
}

impl Os {
    /// Detect the current operating system at compile target level
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "darwin",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named macOS releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacosRelease {
    Yosemite,
    ElCapitan,
    Sierra,
    HighSierra,
    Mojave,
    Catalina,
    BigSur,
    Monterey,
    Ventura,
    Sonoma,
    Sequoia,
    /// Anything not listed, kept as numbers
    Other { major: u64, minor: u64 },
}

impl MacosRelease {
    /// Map a numeric product version to a release
    ///
    /// Up to 10.15 the minor number names the release; from 11 on the major
    /// number does.
    pub fn from_numbers(major: u64, minor: u64) -> Self {
        match (major, minor) {
            (10, 10) => Self::Yosemite,
            (10, 11) => Self::ElCapitan,
            (10, 12) => Self::Sierra,
            (10, 13) => Self::HighSierra,
            (10, 14) => Self::Mojave,
            (10, 15) => Self::Catalina,
            (11, _) => Self::BigSur,
            (12, _) => Self::Monterey,
            (13, _) => Self::Ventura,
            (14, _) => Self::Sonoma,
            (15, _) => Self::Sequoia,
            (major, minor) => Self::Other { major, minor },
        }
    }

    /// Parse `sw_vers -productVersion` output such as `10.12.6`
    pub fn parse_product_version(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('.').map(|p| p.parse::<u64>());
        let major = parts
            .next()
            .and_then(|p| p.ok())
            .ok_or_else(|| Error::ParseError(format!("Invalid macOS version: {}", s.trim())))?;
        let minor = match parts.next() {
            Some(Ok(minor)) => minor,
            Some(Err(_)) => {
                return Err(Error::ParseError(format!("Invalid macOS version: {}", s.trim())));
            }
            None => 0,
        };
        Ok(Self::from_numbers(major, minor))
    }
}

impl fmt::Display for MacosRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yosemite => write!(f, "yosemite"),
            Self::ElCapitan => write!(f, "el_capitan"),
            Self::Sierra => write!(f, "sierra"),
            Self::HighSierra => write!(f, "high_sierra"),
            Self::Mojave => write!(f, "mojave"),
            Self::Catalina => write!(f, "catalina"),
            Self::BigSur => write!(f, "big_sur"),
            Self::Monterey => write!(f, "monterey"),
            Self::Ventura => write!(f, "ventura"),
            Self::Sonoma => write!(f, "sonoma"),
            Self::Sequoia => write!(f, "sequoia"),
            Self::Other { major, minor } => write!(f, "macos-{}.{}", major, minor),
        }
    }
}

/// Structured description of the build host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    /// Set only on macOS
    pub macos: Option<MacosRelease>,
    pub arch: String,
    /// Active SDK, when one could be located
    pub sdk_path: Option<PathBuf>,
}

impl Platform {
    /// Detect the running host
    ///
    /// On macOS this asks `sw_vers` for the release and `xcrun` for the SDK.
    /// A missing SDK is not an error; quirks that need one are skipped.
    pub fn detect(runner: &dyn StepRunner) -> Result<Self> {
        let os = Os::current();
        let mut platform = Self {
            os,
            macos: None,
            arch: std::env::consts::ARCH.to_string(),
            sdk_path: None,
        };

        if os == Os::MacOs {
            let output = runner.run(&Step::new("detect", "sw_vers").arg("-productVersion"))?;
            if output.success() {
                platform.macos = Some(MacosRelease::parse_product_version(&output.stdout)?);
            }

            let sdk = runner.run(&Step::new("detect", "xcrun").arg("--show-sdk-path"))?;
            if sdk.success() && !sdk.stdout.trim().is_empty() {
                platform.sdk_path = Some(PathBuf::from(sdk.stdout.trim()));
            }
        }

        debug!(
            "Detected platform: {} {} ({})",
            platform.os,
            platform
                .macos
                .map(|r| r.to_string())
                .unwrap_or_default(),
            platform.arch
        );
        Ok(platform)
    }

    /// A macOS host on a given release
    pub fn macos(release: MacosRelease, sdk_path: Option<PathBuf>) -> Self {
        Self {
            os: Os::MacOs,
            macos: Some(release),
            arch: std::env::consts::ARCH.to_string(),
            sdk_path,
        }
    }

    /// A Linux host
    pub fn linux() -> Self {
        Self {
            os: Os::Linux,
            macos: None,
            arch: std::env::consts::ARCH.to_string(),
            sdk_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_from_product_version() {
        assert_eq!(MacosRelease::parse_product_version("10.12.6\n").unwrap(), MacosRelease::Sierra);
        assert_eq!(MacosRelease::parse_product_version("10.11").unwrap(), MacosRelease::ElCapitan);
        assert_eq!(MacosRelease::parse_product_version("11.7.1").unwrap(), MacosRelease::BigSur);
        assert_eq!(MacosRelease::parse_product_version("14").unwrap(), MacosRelease::Sonoma);
        assert_eq!(
            MacosRelease::parse_product_version("10.9.5").unwrap(),
            MacosRelease::Other { major: 10, minor: 9 }
        );
    }

    #[test]
    fn test_release_rejects_garbage() {
        assert!(MacosRelease::parse_product_version("").is_err());
        assert!(MacosRelease::parse_product_version("ten.12").is_err());
        assert!(MacosRelease::parse_product_version("10.x").is_err());
    }

    #[test]
    fn test_macos_uses_darwin_identifier() {
        assert_eq!(Os::MacOs.as_str(), "darwin");
    }

    #[test]
    fn test_release_display() {
        assert_eq!(MacosRelease::ElCapitan.to_string(), "el_capitan");
        assert_eq!(MacosRelease::Other { major: 10, minor: 9 }.to_string(), "macos-10.9");
    }
}
