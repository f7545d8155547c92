// src/livecheck.rs

//! Upstream version discovery
//!
//! Fetches the project's download listing, pulls every version out of it
//! with the recipe's regex, drops the ones the stability rule rejects and
//! reports the greatest survivor.

use crate::error::{Error, Result};
use crate::recipe::kitchen::fetch::Fetcher;
use crate::recipe::{LivecheckSection, Recipe, Stability};
use crate::version::{PkgVersion, UpstreamVersion};
use regex::Regex;
use tracing::{debug, info};

/// Result of checking a recipe against upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivecheckReport {
    pub name: String,
    pub current: PkgVersion,
    pub latest: UpstreamVersion,
    /// Versions extracted from the page, before filtering
    pub candidates: usize,
    /// Upstream is newer than the recipe
    pub outdated: bool,
}

/// Compile a livecheck regex, requiring a capture group for the version
pub fn compile_regex(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern)
        .map_err(|e| Error::ParseError(format!("Invalid livecheck regex: {}", e)))?;
    if regex.captures_len() < 2 {
        return Err(Error::ParseError(
            "Livecheck regex has no capture group".to_string(),
        ));
    }
    Ok(regex)
}

/// Every version captured by the first group of `regex` in `page`
///
/// Captures that do not parse as dotted numeric versions are skipped.
pub fn extract_versions(page: &str, regex: &Regex) -> Vec<UpstreamVersion> {
    regex
        .captures_iter(page)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| UpstreamVersion::parse(m.as_str()).ok())
        .collect()
}

/// Greatest candidate accepted by `stability`
pub fn select_latest(
    candidates: impl IntoIterator<Item = UpstreamVersion>,
    stability: Stability,
) -> Option<UpstreamVersion> {
    candidates
        .into_iter()
        .filter(|v| stability.accepts(v))
        .max()
}

/// Find the latest acceptable upstream version for a rule
pub fn latest_version(fetcher: &dyn Fetcher, rule: &LivecheckSection) -> Result<(UpstreamVersion, usize)> {
    let regex = compile_regex(&rule.regex)?;
    let page = fetcher.fetch_text(&rule.url)?;

    let candidates = extract_versions(&page, &regex);
    debug!(
        "Found {} candidate versions at {}: {}",
        candidates.len(),
        rule.url,
        candidates
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let count = candidates.len();
    let latest = select_latest(candidates, rule.stability).ok_or_else(|| Error::VersionNotFound {
        url: rule.url.clone(),
    })?;
    Ok((latest, count))
}

/// Check a recipe against its upstream listing
pub fn check(fetcher: &dyn Fetcher, recipe: &Recipe) -> Result<LivecheckReport> {
    let rule = recipe.livecheck.as_ref().ok_or_else(|| {
        Error::NotFound(format!("No livecheck rule for {}", recipe.package.name))
    })?;

    let current = recipe.pkg_version()?;
    let (latest, candidates) = latest_version(fetcher, rule)?;

    // Listings carry no scheme or revision, so only the upstream part compares
    let outdated = latest > current.upstream;

    info!(
        "{}: current {}, latest {}{}",
        recipe.package.name,
        current,
        latest,
        if outdated { " (outdated)" } else { "" }
    );

    Ok(LivecheckReport {
        name: recipe.package.name.clone(),
        current,
        latest,
        candidates,
        outdated,
    })
}
