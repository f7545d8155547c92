// src/recipe/kitchen/mod.rs

//! Kitchen: where recipes are cooked and installed
//!
//! The Kitchen owns the collaborators an install needs and drives the
//! pipeline for one recipe:
//! - Resolving declared dependencies
//! - Fetching and verifying the source and vendored resources
//! - Running configure, make and make install
//! - Installing configuration into `etc` and linking the keg into `opt`
//! - Seeding runtime state under `var` (post-install)
//!
//! External effects go through injected traits ([`Fetcher`],
//! [`StepRunner`], [`DependencyResolver`]) so every phase can run against a
//! scratch root.

pub(crate) mod archive;
mod config;
pub mod context;
mod cook;
pub mod fetch;
pub mod post_install;
pub mod receipt;
pub mod resources;
pub mod runner;
#[cfg(test)]
pub(crate) mod testutil;

pub use config::{EtcOutcome, InstallResult, KitchenConfig, ServiceConfig, SmokeConfig};
pub use context::{InstallContext, Variables};
pub use cook::Cook;
pub use fetch::{Fetcher, HttpFetcher};
pub use post_install::PostInstallReport;
pub use receipt::InstallReceipt;
pub use runner::{Step, StepOutput, StepRunner, SystemRunner};

use crate::dependencies::{DependencyGraph, DependencyResolver, OptPrefixResolver};
use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::platform::{Platform, QuirkId};
use crate::recipe::format::Recipe;
use crate::service::ServiceDescriptor;
use crate::smoke::{self, SmokeReport};
use archive::verify_file_checksum;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    fetcher: Arc<dyn Fetcher>,
    runner: Arc<dyn StepRunner>,
    resolver: Arc<dyn DependencyResolver>,
    pub(crate) platform: Platform,
}

impl Kitchen {
    /// Create a Kitchen from explicit collaborators
    pub fn new(
        config: KitchenConfig,
        fetcher: Arc<dyn Fetcher>,
        runner: Arc<dyn StepRunner>,
        resolver: Arc<dyn DependencyResolver>,
        platform: Platform,
    ) -> Self {
        Self {
            config,
            fetcher,
            runner,
            resolver,
            platform,
        }
    }

    /// Create a Kitchen that talks to the real network, processes and host
    pub fn with_system(config: KitchenConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.show_progress)?);
        let runner = Arc::new(SystemRunner);
        let resolver = Arc::new(OptPrefixResolver::new(&config.root.join("opt")));
        let platform = Platform::detect(runner.as_ref())?;
        Ok(Self::new(config, fetcher, runner, resolver, platform))
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    pub fn runner(&self) -> &dyn StepRunner {
        self.runner.as_ref()
    }

    /// Standard install layout for `recipe` under the configured root
    pub fn context(&self, recipe: &Recipe) -> Result<InstallContext> {
        InstallContext::for_recipe(&self.config.root, recipe)
    }

    /// Resolve the recipe's dependencies
    ///
    /// Any unresolved dependency aborts before anything is fetched or built.
    pub fn resolve_dependencies(&self, recipe: &Recipe) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::from_recipe(recipe);
        if graph.inputs().is_empty() {
            debug!("No dependencies declared");
            return Ok(graph);
        }

        info!(
            "Resolving dependencies: {}",
            graph
                .inputs()
                .iter()
                .map(|d| d.install_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        graph.resolve(self.resolver.as_ref())?;
        Ok(graph)
    }

    /// Build and install a recipe into the standard layout, then run
    /// post-install
    pub fn install(&self, recipe: &Recipe) -> Result<InstallResult> {
        let ctx = self.context(recipe)?;
        self.install_into(recipe, &ctx)
    }

    /// Build and install a recipe into an explicit layout
    ///
    /// ## Install Process
    /// 1. **Resolve**: locate every declared dependency
    /// 2. **Prep**: fetch the source and resources, verifying checksums
    /// 3. **Unpack**: extract the source
    /// 4. **Season**: build environment, platform quirks, python version
    /// 5. **Stage**: install vendored resources into `libexec/vendor`
    /// 6. **Simmer**: configure, make, make install
    /// 7. **Plate**: generate `named.conf` and the control key into `etc`
    /// 8. **Link**: point the opt prefix at the keg and write the receipt
    /// 9. **Post-install**: seed log and zone directories under `var`
    ///
    /// The first failure stops the pipeline; nothing already written is
    /// rolled back.
    pub fn install_into(&self, recipe: &Recipe, ctx: &InstallContext) -> Result<InstallResult> {
        let pkg_version = recipe.pkg_version()?;
        info!("Installing {} {}", recipe.package.name, pkg_version);

        let graph = self.resolve_dependencies(recipe)?;

        let mut cook = Cook::new(self, recipe, ctx, &graph)?;
        let built = (|| {
            info!("Prep: fetching ingredients...");
            cook.prep()?;
            info!("Unpacking sources...");
            cook.unpack()?;
            cook.season()?;
            cook.stage_resources()?;
            info!("Simmering: running build...");
            cook.simmer()?;
            info!("Plating: installing configuration...");
            cook.plate()
        })();

        let Cook {
            build_dir,
            log,
            warnings,
            configure_args,
            quirks,
            staged_resources,
            etc_files,
            ..
        } = cook;
        if self.config.keep_builddir {
            let kept = build_dir.keep();
            match &built {
                Ok(()) => info!("Build directory kept at {}", kept.display()),
                Err(e) => warn!("Build failed, keeping {} for inspection: {}", kept.display(), e),
            }
        }
        built?;

        self.finish(
            recipe,
            ctx,
            &graph,
            Finished {
                log,
                warnings,
                configure_args,
                quirks,
                staged_resources,
                etc_files,
            },
        )
    }

    /// Link, write the receipt and run post-install
    fn finish(
        &self,
        recipe: &Recipe,
        ctx: &InstallContext,
        graph: &DependencyGraph,
        built: Finished,
    ) -> Result<InstallResult> {
        fs::create_dir_all(&ctx.prefix)?;
        link_opt(ctx)?;

        let mut receipt = InstallReceipt::new(recipe, &self.platform)?;
        receipt.record_dependencies(graph);
        receipt.record_resources(&built.staged_resources);
        receipt.record_build(&built.configure_args, &built.quirks);
        let receipt_path = receipt.write(&ctx.prefix)?;

        let post_install = self.post_install(ctx)?;

        info!("Installed {} {} to {}", recipe.package.name, receipt.pkg_version, ctx.prefix.display());
        Ok(InstallResult {
            prefix: ctx.prefix.clone(),
            pkg_version: receipt.pkg_version,
            log: built.log,
            warnings: built.warnings,
            configure_args: built.configure_args,
            quirks: built.quirks,
            etc_files: built.etc_files,
            receipt_path,
            post_install,
        })
    }

    /// Seed runtime state under `var`; safe to repeat
    pub fn post_install(&self, ctx: &InstallContext) -> Result<PostInstallReport> {
        info!("Running post-install");
        post_install::run(ctx)
    }

    /// Run the smoke test against an installed keg
    ///
    /// `offline` skips the name resolution probe, as does an empty probe
    /// name in the configuration.
    pub fn smoke_test(&self, recipe: &Recipe, ctx: &InstallContext, offline: bool) -> Result<SmokeReport> {
        let probe = if offline {
            None
        } else {
            self.config.smoke.probe_name()
        };
        smoke::run(self.runner(), recipe, ctx, probe)
    }

    /// Service descriptor for an installed recipe
    pub fn service_descriptor(&self, recipe: &Recipe, ctx: &InstallContext) -> Result<ServiceDescriptor> {
        ServiceDescriptor::for_recipe(recipe, ctx, &self.config.service.label_prefix)
    }

    /// Remove the keg and its opt link
    ///
    /// Configuration under `etc` and state under `var` are never removed.
    pub fn uninstall(&self, recipe: &Recipe) -> Result<Vec<PathBuf>> {
        let ctx = self.context(recipe)?;
        let mut removed = Vec::new();

        if let Ok(target) = fs::read_link(&ctx.opt_prefix) {
            if target == ctx.prefix {
                fs::remove_file(&ctx.opt_prefix)?;
                removed.push(ctx.opt_prefix.clone());
            } else {
                debug!(
                    "{} points at {}, leaving it",
                    ctx.opt_prefix.display(),
                    target.display()
                );
            }
        }

        if ctx.prefix.is_dir() {
            fs::remove_dir_all(&ctx.prefix)?;
            removed.push(ctx.prefix.clone());
        }

        // Drop the now-empty Cellar/<name> directory
        if let Some(rack) = ctx.prefix.parent()
            && rack.is_dir()
            && fs::read_dir(rack)?.next().is_none()
        {
            fs::remove_dir(rack)?;
        }

        if removed.is_empty() {
            return Err(Error::NotFound(format!(
                "{} is not installed under {}",
                recipe.package.name,
                self.config.root.display()
            )));
        }

        info!("Uninstalled {}", recipe.package.name);
        Ok(removed)
    }

    /// Fetch the source and resources into the cache without building
    ///
    /// Returns the cached paths; a later install can run without network.
    pub fn fetch(&self, recipe: &Recipe) -> Result<Vec<PathBuf>> {
        info!(
            "Fetching sources for {} version {}",
            recipe.package.name, recipe.package.version
        );

        let mut fetched = vec![self.fetch_source(&recipe.source_url(), &recipe.source.sha256)?];
        for resource in &recipe.resources {
            info!("Fetching resource: {}", resource.name);
            fetched.push(self.fetch_source(&recipe.substitute(&resource.url), &resource.sha256)?);
        }

        info!(
            "Fetched {} source file(s) for {}",
            fetched.len(),
            recipe.package.name
        );
        Ok(fetched)
    }

    /// Check if every archive for a recipe is already cached
    pub fn sources_cached(&self, recipe: &Recipe) -> bool {
        std::iter::once(&recipe.source.sha256)
            .chain(recipe.resources.iter().map(|r| &r.sha256))
            .all(|sum| self.config.source_cache.join(sum.cache_key()).exists())
    }

    /// Fetch an archive through the checksum-keyed cache
    ///
    /// Cached files are re-verified before reuse. Downloads land in a
    /// temporary file and are moved into place only after verification.
    pub(crate) fn fetch_source(&self, url: &str, checksum: &Checksum) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.source_cache)?;

        let cache_key = checksum.cache_key();
        let cached_path = self.config.source_cache.join(&cache_key);

        if cached_path.exists() {
            debug!("Using cached source: {}", cached_path.display());
            match verify_file_checksum(&cached_path, checksum, url) {
                Ok(()) => return Ok(cached_path),
                Err(Error::ChecksumMismatch { .. }) => {
                    warn!("Cached file checksum mismatch, re-downloading");
                    fs::remove_file(&cached_path)?;
                }
                Err(e) => return Err(e),
            }
        }

        info!("Downloading: {}", url);
        let temp_path = self.config.source_cache.join(format!("{}.tmp", cache_key));
        self.fetcher.download(url, &temp_path)?;

        if let Err(e) = verify_file_checksum(&temp_path, checksum, url) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, &cached_path)?;
        Ok(cached_path)
    }
}

/// Outputs of a successful cook, carried into the final steps
struct Finished {
    log: String,
    warnings: Vec<String>,
    configure_args: Vec<String>,
    quirks: Vec<QuirkId>,
    staged_resources: Vec<String>,
    etc_files: Vec<EtcOutcome>,
}

/// Point `opt_prefix` at the keg
///
/// A flat layout (opt prefix is the keg) needs no link.
fn link_opt(ctx: &InstallContext) -> Result<()> {
    if ctx.opt_prefix == ctx.prefix {
        return Ok(());
    }

    if let Some(parent) = ctx.opt_prefix.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::symlink_metadata(&ctx.opt_prefix) {
        Ok(meta) if meta.file_type().is_symlink() => fs::remove_file(&ctx.opt_prefix)?,
        Ok(_) => {
            return Err(Error::IoError(format!(
                "{} exists and is not a link",
                ctx.opt_prefix.display()
            )));
        }
        Err(_) => {}
    }

    std::os::unix::fs::symlink(&ctx.prefix, &ctx.opt_prefix)?;
    debug!("Linked {} -> {}", ctx.opt_prefix.display(), ctx.prefix.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::DependencyResolver;
    use crate::platform::MacosRelease;
    use crate::recipe::format::Dependency;
    use crate::recipe::parser::builtin_recipe;
    use crate::recipe::kitchen::testutil::{FakeRunner, file_url, make_tarball};
    use std::path::Path;

    /// Resolves everything to `<root>/opt/<install name>`
    struct AllPresent(PathBuf);

    impl DependencyResolver for AllPresent {
        fn locate(&self, dep: &Dependency) -> Result<Option<PathBuf>> {
            Ok(Some(self.0.join(dep.install_name())))
        }
    }

    /// Resolves nothing
    struct NonePresent;

    impl DependencyResolver for NonePresent {
        fn locate(&self, _dep: &Dependency) -> Result<Option<PathBuf>> {
            Ok(None)
        }
    }

    /// Recipe whose archives are local tarballs under `dir`
    fn local_recipe(dir: &Path) -> Recipe {
        let source = make_tarball(
            dir,
            "bind-9.16.7.tar.gz",
            "bind-9.16.7",
            &[("configure", "#!/bin/sh\n")],
        );
        let ply = make_tarball(dir, "ply-3.11.tar.gz", "ply-3.11", &[("setup.py", "")]);

        let mut recipe = builtin_recipe().unwrap();
        recipe.source.url = file_url(&source);
        recipe.source.sha256 = crate::hash::sha256_file(&source).unwrap().parse().unwrap();
        recipe.resources[0].url = file_url(&ply);
        recipe.resources[0].sha256 = crate::hash::sha256_file(&ply).unwrap().parse().unwrap();
        recipe
    }

    fn kitchen(root: &Path, runner: Arc<FakeRunner>, platform: Platform) -> Kitchen {
        Kitchen::new(
            KitchenConfig::for_root(root),
            Arc::new(HttpFetcher::new(false).unwrap()),
            runner,
            Arc::new(AllPresent(root.join("opt"))),
            platform,
        )
    }

    #[test]
    fn test_install_runs_phases_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = local_recipe(dir.path());
        let root = dir.path().join("root");
        let runner = Arc::new(FakeRunner::new());
        let kitchen = kitchen(&root, runner.clone(), Platform::linux());

        let result = kitchen.install(&recipe).unwrap();

        assert_eq!(
            runner.phases(),
            vec!["detect", "resource", "configure", "make", "install", "keygen"]
        );
        assert_eq!(result.pkg_version, "9.16.7_1");
        assert_eq!(result.prefix, root.join("Cellar/bind/9.16.7_1"));
        assert!(result.receipt_path.exists());
        assert!(result.quirks.is_empty());
        assert!(result.post_install.zone_files_written);

        let etc = root.join("etc");
        assert!(etc.join("named.conf").exists());
        assert!(etc.join("rndc.key").exists());
        assert_eq!(fs::read_link(root.join("opt/bind")).unwrap(), result.prefix);
    }

    #[test]
    fn test_configure_args_include_dependency_paths() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = local_recipe(dir.path());
        let root = dir.path().join("root");
        let runner = Arc::new(FakeRunner::new());
        let kitchen = kitchen(&root, runner.clone(), Platform::linux());

        let result = kitchen.install(&recipe).unwrap();
        let keg = root.join("Cellar/bind/9.16.7_1");
        let opt = root.join("opt");

        assert_eq!(
            result.configure_args,
            vec![
                format!("--prefix={}", keg.display()),
                "--with-json-c".to_string(),
                format!(
                    "--with-python-install-dir={}",
                    keg.join("libexec/vendor/lib/python3.9/site-packages").display()
                ),
                "--without-lmdb".to_string(),
                format!("--with-libjson={}", opt.join("json-c").display()),
                format!("--with-openssl={}", opt.join("openssl@1.1").display()),
                format!("--with-python={}", opt.join("python@3.9/bin/python3").display()),
            ]
        );
    }

    #[test]
    fn test_quirk_env_reaches_build_steps() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = local_recipe(dir.path());
        let root = dir.path().join("root");
        let runner = Arc::new(FakeRunner::new());
        let sdk = PathBuf::from("/Library/Developer/CommandLineTools/SDKs/MacOSX10.12.sdk");
        let kitchen = kitchen(
            &root,
            runner.clone(),
            Platform::macos(MacosRelease::Sierra, Some(sdk.clone())),
        );

        let result = kitchen.install(&recipe).unwrap();
        assert_eq!(result.quirks, vec![QuirkId::XmlConfigSdkRoot]);

        let configure = runner
            .steps()
            .into_iter()
            .find(|s| s.phase == "configure")
            .unwrap();
        assert!(configure
            .env
            .contains(&("SDKROOT".to_string(), sdk.to_string_lossy().to_string())));
        assert!(configure.env_remove.is_empty());
    }

    #[test]
    fn test_inherited_sdkroot_cleared_without_quirk() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = local_recipe(dir.path());
        let root = dir.path().join("root");
        let runner = Arc::new(FakeRunner::new());
        let kitchen = kitchen(&root, runner.clone(), Platform::linux());

        kitchen.install(&recipe).unwrap();
        for step in runner.steps() {
            if matches!(step.phase.as_str(), "configure" | "make" | "install" | "keygen") {
                assert_eq!(step.env_remove, vec!["SDKROOT"], "{}", step.phase);
                assert!(step.env.iter().all(|(k, _)| k != "SDKROOT"));
            }
        }
    }

    #[test]
    fn test_configured_jobs_override_recipe() {
        let dir = tempfile::tempdir().unwrap();
        let mut recipe = local_recipe(dir.path());
        recipe.build.jobs = Some(16);
        let root = dir.path().join("root");
        let runner = Arc::new(FakeRunner::new());
        let mut config = KitchenConfig::for_root(&root);
        config.jobs = Some(2);
        let kitchen = Kitchen::new(
            config,
            Arc::new(HttpFetcher::new(false).unwrap()),
            runner.clone(),
            Arc::new(AllPresent(root.join("opt"))),
            Platform::linux(),
        );

        kitchen.install(&recipe).unwrap();
        let make = runner.steps().into_iter().find(|s| s.phase == "make").unwrap();
        assert!(make.env.contains(&("MAKEFLAGS".to_string(), "-j2".to_string())));
    }

    #[test]
    fn test_unresolved_dependency_stops_before_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = local_recipe(dir.path());
        let root = dir.path().join("root");
        let runner = Arc::new(FakeRunner::new());
        let kitchen = Kitchen::new(
            KitchenConfig::for_root(&root),
            Arc::new(HttpFetcher::new(false).unwrap()),
            runner.clone(),
            Arc::new(NonePresent),
            Platform::linux(),
        );

        let result = kitchen.install(&recipe);
        assert!(matches!(result, Err(Error::ResolutionError(_))));
        assert!(runner.steps().is_empty());
        assert!(!kitchen.sources_cached(&recipe));
    }

    #[test]
    fn test_fetch_populates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = local_recipe(dir.path());
        let root = dir.path().join("root");
        let kitchen = kitchen(&root, Arc::new(FakeRunner::new()), Platform::linux());

        assert!(!kitchen.sources_cached(&recipe));
        let fetched = kitchen.fetch(&recipe).unwrap();
        assert_eq!(fetched.len(), 2);
        assert!(kitchen.sources_cached(&recipe));

        // A second fetch reuses the verified cache entries
        assert_eq!(kitchen.fetch(&recipe).unwrap(), fetched);
    }

    #[test]
    fn test_corrupt_cache_entry_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = local_recipe(dir.path());
        let root = dir.path().join("root");
        let kitchen = kitchen(&root, Arc::new(FakeRunner::new()), Platform::linux());

        let cached = kitchen
            .fetch_source(&recipe.source_url(), &recipe.source.sha256)
            .unwrap();
        fs::write(&cached, b"corrupt").unwrap();

        let again = kitchen
            .fetch_source(&recipe.source_url(), &recipe.source.sha256)
            .unwrap();
        assert_eq!(again, cached);
        verify_file_checksum(&again, &recipe.source.sha256, "cache").unwrap();
    }

    #[test]
    fn test_uninstall_keeps_etc_and_var() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = local_recipe(dir.path());
        let root = dir.path().join("root");
        let kitchen = kitchen(&root, Arc::new(FakeRunner::new()), Platform::linux());
        kitchen.install(&recipe).unwrap();

        let removed = kitchen.uninstall(&recipe).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!root.join("opt/bind").exists());
        assert!(!root.join("Cellar/bind").exists());
        assert!(root.join("etc/named.conf").exists());
        assert!(root.join("var/named/localhost.zone").exists());

        assert!(matches!(kitchen.uninstall(&recipe), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_smoke_test_offline() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let runner = Arc::new(FakeRunner::new());
        let kitchen = kitchen(&root, runner.clone(), Platform::linux());
        let recipe = builtin_recipe().unwrap();
        let ctx = kitchen.context(&recipe).unwrap();

        let report = kitchen.smoke_test(&recipe, &ctx, true).unwrap();
        assert!(report.probe_skipped);
        let report = kitchen.smoke_test(&recipe, &ctx, false).unwrap();
        assert!(report.commands[1].ends_with("bin/dig brew.sh"));
    }
}
