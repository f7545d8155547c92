// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use bindcook::dependencies::DependencyResolver;
use bindcook::recipe::kitchen::{HttpFetcher, Step, StepOutput, StepRunner};
use bindcook::recipe::{Dependency, Kitchen, KitchenConfig, Recipe, builtin_recipe};
use bindcook::{Platform, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Build a gzipped tarball `dir/name` with every file under `top/`
pub fn make_tarball(dir: &Path, name: &str, top: &str, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for (rel, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", top, rel), contents.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
    path
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// The built-in recipe with its archives replaced by local tarballs
pub fn local_recipe(dir: &Path) -> Recipe {
    let source = make_tarball(
        dir,
        "bind-9.16.7.tar.gz",
        "bind-9.16.7",
        &[("configure", "#!/bin/sh\n")],
    );
    let ply = make_tarball(dir, "ply-3.11.tar.gz", "ply-3.11", &[("setup.py", "")]);

    let mut recipe = builtin_recipe().unwrap();
    recipe.source.url = file_url(&source);
    recipe.source.sha256 = bindcook::hash::sha256_file(&source).unwrap().parse().unwrap();
    recipe.resources[0].url = file_url(&ply);
    recipe.resources[0].sha256 = bindcook::hash::sha256_file(&ply).unwrap().parse().unwrap();
    recipe
}

/// Every dependency is found under `<opt>/<install name>`
pub struct OptResolver(pub PathBuf);

impl DependencyResolver for OptResolver {
    fn locate(&self, dep: &Dependency) -> Result<Option<PathBuf>> {
        Ok(Some(self.0.join(dep.install_name())))
    }
}

/// Records steps; `failing` makes every step of one phase exit non-zero
#[derive(Default)]
pub struct RecordingRunner {
    steps: Mutex<Vec<Step>>,
    fail_phase: Option<String>,
}

impl RecordingRunner {
    pub fn failing(phase: &str) -> Self {
        Self {
            fail_phase: Some(phase.to_string()),
            ..Self::default()
        }
    }

    pub fn phases(&self) -> Vec<String> {
        self.steps.lock().unwrap().iter().map(|s| s.phase.clone()).collect()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().unwrap().clone()
    }
}

impl StepRunner for RecordingRunner {
    fn run(&self, step: &Step) -> Result<StepOutput> {
        self.steps.lock().unwrap().push(step.clone());
        let program = step.program_name();

        if self.fail_phase.as_deref() == Some(step.phase.as_str()) {
            return Ok(StepOutput {
                code: Some(2),
                stdout: String::new(),
                stderr: format!("{}: error: {} phase failed", program, step.phase),
            });
        }

        let stdout = match program.as_str() {
            "python3" => "3.9\n".to_string(),
            "dig" => "DiG 9.16.7\n".to_string(),
            _ => String::new(),
        };
        if program == "rndc-confgen"
            && let Some(pos) = step.args.iter().position(|a| a == "-c")
        {
            fs::write(&step.args[pos + 1], "key \"rndc-key\" {};\n")?;
        }

        Ok(StepOutput {
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}

/// A kitchen rooted at `root` that never touches the host
pub fn scratch_kitchen(root: &Path, runner: Arc<RecordingRunner>, platform: Platform) -> Kitchen {
    scratch_kitchen_with(root, runner, platform)
}

/// Like [`scratch_kitchen`] with any step runner
pub fn scratch_kitchen_with(
    root: &Path,
    runner: Arc<dyn StepRunner>,
    platform: Platform,
) -> Kitchen {
    Kitchen::new(
        KitchenConfig::for_root(root),
        Arc::new(HttpFetcher::new(false).unwrap()),
        runner,
        Arc::new(OptResolver(root.join("opt"))),
        platform,
    )
}
