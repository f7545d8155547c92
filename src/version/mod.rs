// src/version/mod.rs

//! Upstream version parsing and package version ordering
//!
//! Upstream releases are dotted numeric strings (`9.16.7`). A package version
//! adds two recipe-controlled markers around it:
//! - `version_scheme`: bumped when upstream numbering went backwards, so a
//!   lower upstream version can still sort as newer
//! - `revision`: rebuild counter for the same upstream version
//!
//! Ordering compares `(version_scheme, upstream, revision)` in that order.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A dotted numeric upstream version such as `9.16.7`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpstreamVersion {
    raw: String,
    components: Vec<u64>,
}

impl UpstreamVersion {
    /// Parse a version string
    ///
    /// Examples:
    /// - "9.16.7" → [9, 16, 7]
    /// - "9.16" → [9, 16]
    /// - "9.16.7-S1" → rejected, only numeric components are accepted
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::ParseError("Empty version string".to_string()));
        }

        let components = s
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|e| {
                    Error::ParseError(format!("Invalid version component '{}' in '{}': {}", part, s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: s.to_string(),
            components,
        })
    }

    /// The version exactly as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u64 {
        self.components[0]
    }

    pub fn minor(&self) -> Option<u64> {
        self.components.get(1).copied()
    }

    /// Even minor versions are production releases, odd ones are development
    pub fn has_even_minor(&self) -> bool {
        self.minor().is_some_and(|m| m % 2 == 0)
    }

    /// Compare component-wise; missing trailing components count as zero
    pub fn compare(&self, other: &UpstreamVersion) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl FromStr for UpstreamVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for UpstreamVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Ord for UpstreamVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for UpstreamVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Full package version: upstream version plus scheme and revision markers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PkgVersion {
    pub scheme: u32,
    pub upstream: UpstreamVersion,
    pub revision: u32,
}

impl PkgVersion {
    pub fn new(scheme: u32, upstream: UpstreamVersion, revision: u32) -> Self {
        Self {
            scheme,
            upstream,
            revision,
        }
    }
}

impl fmt::Display for PkgVersion {
    /// Keg directory name: `9.16.7` or `9.16.7_1` when rebuilt
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.upstream)?;
        if self.revision > 0 {
            write!(f, "_{}", self.revision)?;
        }
        Ok(())
    }
}

impl Ord for PkgVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scheme
            .cmp(&other.scheme)
            .then_with(|| self.upstream.cmp(&other.upstream))
            .then_with(|| self.revision.cmp(&other.revision))
    }
}

impl PartialOrd for PkgVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
