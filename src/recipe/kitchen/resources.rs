// src/recipe/kitchen/resources.rs

//! Vendored resource staging
//!
//! Resources are auxiliary source archives (for example a Python module the
//! build's tooling imports) installed into the package's private
//! `libexec/vendor` prefix with the runtime's own packaging mechanism.
//! Every archive is fetched and verified before any of them is installed.

use crate::error::{Error, Result};
use crate::recipe::format::{ResourceInstaller, ResourceSection};
use crate::recipe::kitchen::archive::{extract_archive, source_root};
use crate::recipe::kitchen::runner::{Step, StepRunner, run_checked};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads `setup.py` through setuptools even for plain distutils packages
pub const SETUPTOOLS_SHIM: &str = "import setuptools, tokenize\n__file__ = 'setup.py'\nexec(compile(getattr(tokenize, 'open', open)(__file__).read().replace('\\r\\n', '\\n'), __file__, 'exec'))";

/// Prints the interpreter's `major.minor`
const PYTHON_XY_SCRIPT: &str = "import sys; print('{}.{}'.format(*sys.version_info[:2]))";

/// A resource archive fetched and verified, ready to install
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub name: String,
    pub installer: ResourceInstaller,
    pub archive: PathBuf,
}

impl FetchedResource {
    pub fn new(resource: &ResourceSection, archive: PathBuf) -> Self {
        Self {
            name: resource.name.clone(),
            installer: resource.installer,
            archive,
        }
    }
}

/// Arguments after the interpreter for a `setup.py install` into `vendor`
pub fn setup_install_args(vendor: &Path) -> Vec<String> {
    vec![
        "-c".to_string(),
        SETUPTOOLS_SHIM.to_string(),
        "--no-user-cfg".to_string(),
        "install".to_string(),
        format!("--prefix={}", vendor.display()),
        format!("--install-scripts={}", vendor.join("bin").display()),
        "--single-version-externally-managed".to_string(),
        "--record=installed.txt".to_string(),
    ]
}

/// Ask `python` for its `X.Y` version
pub fn detect_python_xy(runner: &dyn StepRunner, python: &Path) -> Result<String> {
    let step = Step::new("detect", python).args(["-c", PYTHON_XY_SCRIPT]);
    let output = run_checked(runner, &step)?;
    let xy = output.stdout.trim();

    let valid = xy
        .split_once('.')
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        });
    if !valid {
        return Err(Error::ParseError(format!(
            "Unexpected python version output from {}: {:?}",
            python.display(),
            xy
        )));
    }

    debug!("{} is python {}", python.display(), xy);
    Ok(xy.to_string())
}

/// Where and how resources are installed
pub struct StagingPlan<'a> {
    /// Interpreter used by [`ResourceInstaller::Python`]
    pub python: &'a Path,
    /// Private install prefix
    pub vendor: &'a Path,
    /// Scratch directory for unpacked resources
    pub work_dir: &'a Path,
    /// Environment for every install step
    pub env: &'a [(String, String)],
}

/// Unpack and install every fetched resource, returning their names
pub fn install_all(
    runner: &dyn StepRunner,
    plan: &StagingPlan<'_>,
    resources: &[FetchedResource],
) -> Result<Vec<String>> {
    let mut staged = Vec::with_capacity(resources.len());

    for resource in resources {
        let unpack_dir = plan.work_dir.join(&resource.name);
        extract_archive(&resource.archive, &unpack_dir)?;
        let src = source_root(&unpack_dir)?;

        let step = match resource.installer {
            ResourceInstaller::Python => Step::new("resource", plan.python)
                .args(setup_install_args(plan.vendor))
                .current_dir(&src)
                .envs(plan.env),
        };

        info!("Staging resource {}", resource.name);
        run_checked(runner, &step)?;
        staged.push(resource.name.clone());
    }

    Ok(staged)
}

/// `PYTHONPATH` with `site_packages` placed in front of `existing`
pub fn prepend_path(site_packages: &Path, existing: Option<&str>) -> String {
    match existing.filter(|e| !e.is_empty()) {
        Some(rest) => format!("{}:{}", site_packages.display(), rest),
        None => site_packages.display().to_string(),
    }
}
