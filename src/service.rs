// src/service.rs

//! launchd service descriptor generation
//!
//! The descriptor is data ([`ServiceDescriptor`]); [`ServiceDescriptor::to_plist`]
//! renders it as an Apple property list in the layout launchd tooling expects.

use crate::error::{Error, Result};
use crate::recipe::kitchen::context::{InstallContext, Variables};
use crate::recipe::Recipe;
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const PLIST_HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" ",
    "\"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
    "<plist version=\"1.0\">\n",
);

/// Directory for system daemons
pub const LAUNCH_DAEMONS_DIR: &str = "/Library/LaunchDaemons";

/// A service supervisor descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub label: String,
    /// Absolute program path followed by its arguments
    pub program_arguments: Vec<String>,
    pub run_at_load: bool,
    pub enable_transactions: bool,
    pub service_ipc: bool,
    /// Load at boot as a daemon instead of at login as an agent
    pub startup: bool,
}

impl ServiceDescriptor {
    /// Build the descriptor for `recipe` installed at `ctx`
    ///
    /// The program is resolved against the opt prefix so the descriptor
    /// survives upgrades.
    pub fn for_recipe(recipe: &Recipe, ctx: &InstallContext, label_prefix: &str) -> Result<Self> {
        let service = recipe.service.as_ref().ok_or_else(|| {
            Error::NotFound(format!("{} does not define a service", recipe.package.name))
        })?;

        let vars = Variables::new(recipe, ctx);
        let program = ctx.opt_prefix.join(&service.program);
        let mut program_arguments = vec![program.to_string_lossy().to_string()];
        program_arguments.extend(service.args.iter().map(|a| vars.apply(a)));

        Ok(Self {
            label: format!("{}.{}", label_prefix, recipe.package.name),
            program_arguments,
            run_at_load: service.run_at_load,
            enable_transactions: true,
            service_ipc: false,
            startup: service.startup,
        })
    }

    /// Render as an XML property list
    pub fn to_plist(&self) -> String {
        let mut out = String::from(PLIST_HEADER);
        out.push_str("<dict>\n");
        push_bool(&mut out, "EnableTransactions", self.enable_transactions);
        push_string(&mut out, "Label", &self.label);
        push_bool(&mut out, "RunAtLoad", self.run_at_load);
        out.push_str("  <key>ProgramArguments</key>\n  <array>\n");
        for arg in &self.program_arguments {
            let _ = writeln!(out, "    <string>{}</string>", escape(arg.as_str()));
        }
        out.push_str("  </array>\n");
        push_bool(&mut out, "ServiceIPC", self.service_ipc);
        out.push_str("</dict>\n</plist>\n");
        out
    }

    /// File name launchd expects for this label
    pub fn file_name(&self) -> String {
        format!("{}.plist", self.label)
    }

    /// Where the descriptor would normally be loaded from
    pub fn default_dir(&self) -> Option<PathBuf> {
        if self.startup {
            Some(PathBuf::from(LAUNCH_DAEMONS_DIR))
        } else {
            dirs::home_dir().map(|home| home.join("Library").join("LaunchAgents"))
        }
    }

    /// Write the rendered plist into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_plist())
            .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
        info!("Wrote service descriptor {}", path.display());
        Ok(path)
    }
}

fn push_bool(out: &mut String, key: &str, value: bool) {
    let _ = writeln!(out, "  <key>{}</key>", key);
    out.push_str(if value { "  <true/>\n" } else { "  <false/>\n" });
}

fn push_string(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "  <key>{}</key>", key);
    let _ = writeln!(out, "  <string>{}</string>", escape(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::builtin_recipe;

    fn flat_descriptor() -> ServiceDescriptor {
        let recipe = builtin_recipe().unwrap();
        let ctx = InstallContext::flat(
            Path::new("/opt/x"),
            Path::new("/opt/x/etc"),
            Path::new("/opt/x/var"),
        );
        ServiceDescriptor::for_recipe(&recipe, &ctx, "homebrew.mxcl").unwrap()
    }

    #[test]
    fn test_program_arguments() {
        let descriptor = flat_descriptor();
        assert_eq!(
            descriptor.program_arguments,
            vec!["/opt/x/sbin/named", "-f", "-c", "/opt/x/etc/named.conf"]
        );
        assert_eq!(descriptor.label, "homebrew.mxcl.bind");
        assert!(descriptor.run_at_load);
        assert!(descriptor.enable_transactions);
        assert!(!descriptor.service_ipc);
    }

    #[test]
    fn test_plist_layout() {
        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
            "<plist version=\"1.0\">\n",
            "<dict>\n",
            "  <key>EnableTransactions</key>\n",
            "  <true/>\n",
            "  <key>Label</key>\n",
            "  <string>homebrew.mxcl.bind</string>\n",
            "  <key>RunAtLoad</key>\n",
            "  <true/>\n",
            "  <key>ProgramArguments</key>\n",
            "  <array>\n",
            "    <string>/opt/x/sbin/named</string>\n",
            "    <string>-f</string>\n",
            "    <string>-c</string>\n",
            "    <string>/opt/x/etc/named.conf</string>\n",
            "  </array>\n",
            "  <key>ServiceIPC</key>\n",
            "  <false/>\n",
            "</dict>\n",
            "</plist>\n",
        );
        assert_eq!(flat_descriptor().to_plist(), expected);
    }

    #[test]
    fn test_opt_prefix_used_for_keg_layout() {
        let recipe = builtin_recipe().unwrap();
        let ctx = InstallContext::for_recipe(Path::new("/usr/local"), &recipe).unwrap();
        let descriptor = ServiceDescriptor::for_recipe(&recipe, &ctx, "homebrew.mxcl").unwrap();
        assert_eq!(descriptor.program_arguments[0], "/usr/local/opt/bind/sbin/named");
        assert_eq!(descriptor.program_arguments[3], "/usr/local/etc/named.conf");
    }

    #[test]
    fn test_values_are_escaped() {
        let mut descriptor = flat_descriptor();
        descriptor.program_arguments = vec!["/a&b/<named>".to_string()];
        assert!(descriptor.to_plist().contains("<string>/a&amp;b/&lt;named&gt;</string>"));
    }

    #[test]
    fn test_startup_selects_daemon_dir() {
        let descriptor = flat_descriptor();
        assert!(descriptor.startup);
        assert_eq!(descriptor.default_dir(), Some(PathBuf::from(LAUNCH_DAEMONS_DIR)));
        assert_eq!(descriptor.file_name(), "homebrew.mxcl.bind.plist");
    }

    #[test]
    fn test_missing_service_section() {
        let mut recipe = builtin_recipe().unwrap();
        recipe.service = None;
        let ctx = InstallContext::flat(Path::new("/p"), Path::new("/p/etc"), Path::new("/p/var"));
        assert!(matches!(
            ServiceDescriptor::for_recipe(&recipe, &ctx, "homebrew.mxcl"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = flat_descriptor().write_to(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("homebrew.mxcl.bind.plist"));
        assert!(fs::read_to_string(path).unwrap().starts_with("<?xml"));
    }
}
