// src/recipe/kitchen/testutil.rs

//! Fixtures shared by kitchen unit tests

use crate::error::Result;
use crate::recipe::kitchen::runner::{Step, StepOutput, StepRunner};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Build a gzipped tarball `dir/name` with every file under `top/`
pub(crate) fn make_tarball(dir: &Path, name: &str, top: &str, files: &[(&str, &str)]) -> PathBuf {
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

/// `file://` URL for a local path
pub(crate) fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Records steps instead of running them
///
/// Steps succeed with empty output unless a program is scripted with
/// [`FakeRunner::stdout_for`] or made to fail with [`FakeRunner::fail_on`].
/// `rndc-confgen -c <path>` writes a key file so install can proceed.
#[derive(Default)]
pub(crate) struct FakeRunner {
    steps: Mutex<Vec<Step>>,
    fail_program: Option<String>,
    stdout: Vec<(String, String)>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self::default().stdout_for("python3", "3.9\n")
    }

    pub(crate) fn fail_on(mut self, program: &str) -> Self {
        self.fail_program = Some(program.to_string());
        self
    }

    pub(crate) fn stdout_for(mut self, program: &str, stdout: &str) -> Self {
        self.stdout.push((program.to_string(), stdout.to_string()));
        self
    }

    pub(crate) fn steps(&self) -> Vec<Step> {
        self.steps.lock().unwrap().clone()
    }

    pub(crate) fn phases(&self) -> Vec<String> {
        self.steps().into_iter().map(|s| s.phase).collect()
    }
}

impl StepRunner for FakeRunner {
    fn run(&self, step: &Step) -> Result<StepOutput> {
        self.steps.lock().unwrap().push(step.clone());
        let program = step.program_name();

        if self.fail_program.as_deref() == Some(program.as_str()) {
            return Ok(StepOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: format!("{} failed", program),
            });
        }

        if program == "rndc-confgen"
            && let Some(pos) = step.args.iter().position(|a| a == "-c")
            && let Some(key_path) = step.args.get(pos + 1)
        {
            fs::write(key_path, "key \"rndc-key\" {\n\talgorithm hmac-sha256;\n};\n")?;
        }

        let stdout = self
            .stdout
            .iter()
            .find(|(p, _)| *p == program)
            .map(|(_, s)| s.clone())
            .unwrap_or_default();

        Ok(StepOutput {
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}
