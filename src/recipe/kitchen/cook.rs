// src/recipe/kitchen/cook.rs

//! Cook: the build and install of a single recipe
//!
//! Phases run strictly in order and every failure is fatal:
//! prep (fetch and verify every archive), unpack, season (build
//! environment), stage resources, simmer (configure, make, make install)
//! and plate (configuration files into `etc`).

use crate::dependencies::DependencyGraph;
use crate::error::{Error, Result};
use crate::platform::{AppliedQuirks, QUIRKS, QuirkId};
use crate::recipe::format::Recipe;
use crate::templates::{self, NAMED_CONF_FILE, NamedConfParams, RNDC_KEY_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::archive::{extract_archive, source_root};
use super::config::EtcOutcome;
use super::context::{InstallContext, Variables};
use super::resources::{self, FetchedResource, StagingPlan};
use super::runner::{Step, run_checked};
use super::Kitchen;

/// A single cook operation
pub struct Cook<'a> {
    pub(super) kitchen: &'a Kitchen,
    pub(super) recipe: &'a Recipe,
    pub(super) ctx: &'a InstallContext,
    pub(super) graph: &'a DependencyGraph,
    /// Temporary build directory
    pub(super) build_dir: TempDir,
    /// Unpacked upstream source (the build path)
    pub(super) source_dir: PathBuf,
    /// Verified resource archives, in recipe order
    pub(super) fetched_resources: Vec<FetchedResource>,
    /// `%(name)s` values for flags and arguments
    pub(super) vars: Variables,
    /// Environment for every build step
    pub(super) env: Vec<(String, String)>,
    /// Inherited variables cleared for every build step
    pub(super) env_remove: Vec<String>,
    pub(super) python: Option<PathBuf>,
    /// Build log accumulator
    pub(super) log: String,
    pub(super) warnings: Vec<String>,
    pub(super) configure_args: Vec<String>,
    pub(super) quirks: Vec<QuirkId>,
    pub(super) staged_resources: Vec<String>,
    pub(super) etc_files: Vec<EtcOutcome>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(
        kitchen: &'a Kitchen,
        recipe: &'a Recipe,
        ctx: &'a InstallContext,
        graph: &'a DependencyGraph,
    ) -> Result<Self> {
        if !graph.is_resolved() {
            return Err(Error::ResolutionError(format!(
                "Dependencies of {} must be resolved before cooking",
                recipe.package.name
            )));
        }

        let build_dir = tempfile::Builder::new()
            .prefix(&format!("{}-", recipe.package.name))
            .tempdir()
            .map_err(|e| Error::IoError(format!("Failed to create build directory: {}", e)))?;
        let source_dir = build_dir.path().join("source");
        fs::create_dir_all(&source_dir)?;

        Ok(Self {
            kitchen,
            recipe,
            ctx,
            graph,
            build_dir,
            source_dir,
            fetched_resources: Vec::new(),
            vars: Variables::new(recipe, ctx),
            env: Vec::new(),
            env_remove: Vec::new(),
            python: None,
            log: String::new(),
            warnings: Vec::new(),
            configure_args: Vec::new(),
            quirks: Vec::new(),
            staged_resources: Vec::new(),
            etc_files: Vec::new(),
        })
    }

    /// Phase 1: Prep - fetch and verify the source and every resource
    ///
    /// Nothing is installed until all checksums have been verified.
    pub(super) fn prep(&mut self) -> Result<()> {
        let url = self.recipe.source_url();
        let cached = self.kitchen.fetch_source(&url, &self.recipe.source.sha256)?;
        let local = self.build_dir.path().join(self.recipe.archive_filename());
        fs::copy(&cached, &local)?;
        self.log_line(&format!("Fetched source: {}", url));

        let resource_dir = self.build_dir.path().join("resources");
        fs::create_dir_all(&resource_dir)?;
        for resource in &self.recipe.resources {
            let url = self.recipe.substitute(&resource.url);
            let cached = self.kitchen.fetch_source(&url, &resource.sha256)?;
            let local = resource_dir.join(resource.archive_filename());
            fs::copy(&cached, &local)?;
            self.fetched_resources.push(FetchedResource::new(resource, local));
            self.log_line(&format!("Fetched resource {}: {}", resource.name, url));
        }

        Ok(())
    }

    /// Phase 2: Unpack the upstream source
    pub(super) fn unpack(&mut self) -> Result<()> {
        let archive = self.build_dir.path().join(self.recipe.archive_filename());
        let extract_dir = self.source_dir.clone();
        extract_archive(&archive, &extract_dir)?;
        self.source_dir = source_root(&extract_dir)?;
        debug!("Source directory: {}", self.source_dir.display());
        self.log_line(&format!("Extracted source to {}", self.source_dir.display()));
        Ok(())
    }

    /// Phase 3: Season - assemble the build environment
    ///
    /// Applies platform quirks and the recipe environment, and locates the
    /// python interpreter when the recipe depends on one.
    pub(super) fn season(&mut self) -> Result<()> {
        let jobs = self.kitchen.config.make_jobs(self.recipe.build.jobs);
        self.env.push(("MAKEFLAGS".to_string(), format!("-j{}", jobs)));

        for (key, value) in &self.recipe.build.environment {
            self.env.push((key.clone(), self.vars.apply(value)));
        }

        let applied = AppliedQuirks::select(&self.kitchen.platform, QUIRKS);
        for quirk in &applied.ids {
            self.log_line(&format!("Applied platform quirk: {}", quirk));
        }
        self.env.extend(applied.env);
        self.env_remove = applied.unset;
        self.quirks = applied.ids;

        if let Some(python) = self.graph.resolved("python") {
            let interpreter = python.prefix.join("bin").join("python3");
            let xy = resources::detect_python_xy(self.kitchen.runner(), &interpreter)?;
            let site_packages = self.ctx.vendor_site_packages(&xy);
            self.vars.set_path("vendor_site_packages", &site_packages);
            self.vars.set_path("vendor", &self.ctx.vendor_dir());
            self.python = Some(interpreter);
        }

        Ok(())
    }

    /// Phase 4: Stage vendored resources into `libexec/vendor`
    pub(super) fn stage_resources(&mut self) -> Result<()> {
        if self.fetched_resources.is_empty() {
            return Ok(());
        }

        let python = self.python.clone().ok_or_else(|| {
            Error::ResolutionError("Resources need python but it was not resolved".to_string())
        })?;
        let site_packages = self
            .vars
            .get("vendor_site_packages")
            .map(PathBuf::from)
            .ok_or_else(|| Error::ResolutionError("Python version unknown".to_string()))?;

        fs::create_dir_all(&site_packages)?;
        let existing = std::env::var("PYTHONPATH").ok();
        let pythonpath = resources::prepend_path(&site_packages, existing.as_deref());
        self.env.retain(|(k, _)| k != "PYTHONPATH");
        self.env.push(("PYTHONPATH".to_string(), pythonpath));

        let vendor = self.ctx.vendor_dir();
        let work_dir = self.build_dir.path().join("resources").join("src");
        let plan = StagingPlan {
            python: &python,
            vendor: &vendor,
            work_dir: &work_dir,
            env: &self.env,
        };
        let staged = resources::install_all(self.kitchen.runner(), &plan, &self.fetched_resources)?;

        for name in &staged {
            self.log_line(&format!("Staged resource {}", name));
        }
        self.staged_resources = staged;
        Ok(())
    }

    /// Final configure arguments: static flags, then dependency flags
    pub(super) fn configure_args(&self) -> Vec<String> {
        self.recipe
            .build
            .configure
            .iter()
            .map(|flag| self.vars.apply(flag))
            .chain(self.graph.configure_flags())
            .collect()
    }

    /// Phase 5: Simmer - configure, make, make install
    pub(super) fn simmer(&mut self) -> Result<()> {
        self.configure_args = self.configure_args();
        for arg in &self.configure_args {
            if arg.contains("%(") {
                warn!("Unsubstituted variable in configure argument: {}", arg);
                self.warnings.push(format!("Unsubstituted variable in {}", arg));
            }
        }

        let configure = Step::new("configure", self.source_dir.join("configure"))
            .args(self.configure_args.iter().cloned());
        self.run_build_step(configure)?;

        let make = Step::new("make", "make").args(self.recipe.build.make.iter().cloned());
        self.run_build_step(make)?;

        let install = Step::new("install", "make").args(self.recipe.build.install.iter().cloned());
        self.run_build_step(install)?;

        Ok(())
    }

    /// Phase 6: Plate - generate configuration and install it into `etc`
    pub(super) fn plate(&mut self) -> Result<()> {
        let conf = templates::named_conf(&NamedConfParams {
            etc: &self.ctx.etc,
            var: &self.ctx.var,
        });
        fs::write(self.source_dir.join(NAMED_CONF_FILE), conf)?;

        let key_path = self.source_dir.join(RNDC_KEY_FILE);
        let keygen = Step::new("keygen", self.ctx.sbin().join("rndc-confgen"))
            .arg("-a")
            .arg("-c")
            .arg(key_path.to_string_lossy());
        self.run_build_step(keygen)?;

        fs::create_dir_all(&self.ctx.etc)?;
        for name in [NAMED_CONF_FILE, RNDC_KEY_FILE] {
            let outcome = install_etc_file(&self.source_dir.join(name), &self.ctx.etc)?;
            if let EtcOutcome::Preserved { existing, default } = &outcome {
                let msg = format!(
                    "{} exists and differs, new version written to {}",
                    existing.display(),
                    default.display()
                );
                warn!("{}", msg);
                self.warnings.push(msg);
            }
            self.etc_files.push(outcome);
        }

        Ok(())
    }

    /// Run one external step in the source directory
    fn run_build_step(&mut self, step: Step) -> Result<()> {
        info!("Running {} phase", step.phase);
        let step = step
            .current_dir(&self.source_dir)
            .env_removes(&self.env_remove)
            .envs(&self.env);
        self.log_line(&format!("[{}] {}", step.phase, step));

        let output = run_checked(self.kitchen.runner(), &step)?;
        if !output.stdout.is_empty() {
            self.log.push_str(&output.stdout);
            if !output.stdout.ends_with('\n') {
                self.log.push('\n');
            }
        }
        Ok(())
    }

    pub(super) fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }
}

/// Install `src` into `etc` without clobbering a modified copy
///
/// An existing file with different contents is kept; the new file is
/// written beside it as `<name>.default`.
pub(crate) fn install_etc_file(src: &Path, etc: &Path) -> Result<EtcOutcome> {
    let name = src
        .file_name()
        .ok_or_else(|| Error::InvalidPath(src.to_path_buf()))?;
    let dest = etc.join(name);
    let contents = fs::read(src)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {}", src.display(), e)))?;

    if dest.exists() {
        if fs::read(&dest)? == contents {
            return Ok(EtcOutcome::Unchanged(dest));
        }
        let mut default_name = name.to_os_string();
        default_name.push(".default");
        let default = etc.join(default_name);
        fs::write(&default, &contents)?;
        return Ok(EtcOutcome::Preserved {
            existing: dest,
            default,
        });
    }

    fs::write(&dest, &contents)?;
    Ok(EtcOutcome::Installed(dest))
}
