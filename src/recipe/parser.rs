// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::recipe::format::{Recipe, ResourceInstaller};
use crate::version::UpstreamVersion;
use crate::livecheck::compile_regex;
use std::path::Path;

/// The BIND recipe shipped with the binary
const BIND_RECIPE: &str = include_str!("../../recipes/bind.toml");

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read recipe file: {}", e)))?;

    parse_recipe(&content)
}

/// The embedded BIND recipe
pub fn builtin_recipe() -> Result<Recipe> {
    parse_recipe(BIND_RECIPE)
}

/// Validate a recipe for completeness and correctness
///
/// Hard problems are errors; soft problems come back as warnings.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(Error::ParseError("Recipe package name cannot be empty".to_string()));
    }
    UpstreamVersion::parse(&recipe.package.version)?;

    if let Some(livecheck) = &recipe.livecheck {
        compile_regex(&livecheck.regex)?;
    }

    for resource in &recipe.resources {
        match resource.installer {
            ResourceInstaller::Python => {
                if recipe.dependency("python").is_none() {
                    return Err(Error::ParseError(format!(
                        "Resource {} is installed with python but python is not a dependency",
                        resource.name
                    )));
                }
            }
        }
    }

    for dep in &recipe.depends {
        if let Some(flag) = &dep.configure_flag
            && !flag.contains("%(opt)s")
        {
            warnings.push(format!(
                "Configure flag for {} does not reference %(opt)s",
                dep.name
            ));
        }
    }

    if recipe.package.desc.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if recipe.build.install.is_empty() {
        warnings.push("No install targets specified".to_string());
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::format::{DependencyKind, Stability};

    const SHA: &str = "9f7d1812ebbd26a699f62b6fa8522d5dec57e4bf43af0042a0d60d39ed8314d1";

    fn minimal(extra: &str) -> String {
        format!(
            r#"
[package]
name = "test"
version = "1.0"

[source]
url = "https://example.com/test-1.0.tar.gz"
sha256 = "{SHA}"
{extra}
"#
        )
    }

    #[test]
    fn test_builtin_recipe_is_valid() {
        let recipe = builtin_recipe().unwrap();
        assert_eq!(recipe.package.name, "bind");
        assert_eq!(recipe.pkg_version().unwrap().to_string(), "9.16.7_1");
        assert_eq!(recipe.package.version_scheme, 1);
        assert_eq!(
            recipe.livecheck.as_ref().unwrap().stability,
            Stability::EvenMinor
        );
        assert_eq!(recipe.dependency("pkg-config").unwrap().kind, DependencyKind::Build);
        assert_eq!(recipe.resources.len(), 1);
        assert!(validate_recipe(&recipe).unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_recipe() {
        assert!(parse_recipe("this is not valid toml at all {}").is_err());
    }

    #[test]
    fn test_validate_empty_name() {
        let recipe = parse_recipe(&minimal("").replace("name = \"test\"", "name = \"\"")).unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_validate_bad_version() {
        let recipe = parse_recipe(&minimal("").replace("\"1.0\"", "\"1.0-beta\"")).unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_bad_checksum_fails_to_parse() {
        let content = minimal("").replace(SHA, "md5:abc123");
        assert!(parse_recipe(&content).is_err());
    }

    #[test]
    fn test_validate_livecheck_needs_group() {
        let recipe = parse_recipe(&minimal(
            "[livecheck]\nurl = \"https://example.com\"\nregex = 'test-\\d+'\n",
        ))
        .unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_validate_python_resource_needs_python() {
        let recipe = parse_recipe(&minimal(&format!(
            "[[resources]]\nname = \"ply\"\nurl = \"https://example.com/ply.tar.gz\"\nsha256 = \"{SHA}\"\n"
        )))
        .unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let recipe = parse_recipe(&minimal(
            "[[depends]]\nname = \"zlib\"\nconfigure_flag = \"--with-zlib\"\n",
        ))
        .unwrap();
        let warnings = validate_recipe(&recipe).unwrap();
        assert!(warnings.iter().any(|w| w.contains("description")));
        assert!(warnings.iter().any(|w| w.contains("license")));
        assert!(warnings.iter().any(|w| w.contains("zlib")));
    }
}
