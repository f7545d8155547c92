// src/recipe/kitchen/runner.rs

//! External process execution for build steps
//!
//! Every external program the pipeline launches (configure, make, the key
//! generator, the resource installer, the smoke test binary) goes through a
//! [`StepRunner`]. The default [`SystemRunner`] spawns real processes and
//! blocks until they exit.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// One external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Phase name used in logs and errors
    pub phase: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Variables removed from the inherited environment
    pub env_remove: Vec<String>,
}

impl Step {
    pub fn new(phase: &str, program: impl Into<PathBuf>) -> Self {
        Self {
            phase: phase.to_string(),
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            env_remove: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn envs(mut self, env: &[(String, String)]) -> Self {
        self.env.extend(env.iter().cloned());
        self
    }

    pub fn env_removes(mut self, keys: &[String]) -> Self {
        self.env_remove.extend(keys.iter().cloned());
        self
    }

    /// Program file name, for matching in logs and fakes
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl StepOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands on behalf of the kitchen
pub trait StepRunner: Send + Sync {
    /// Run `step` to completion and capture its output
    ///
    /// Only failure to launch is an error here; a non-zero exit is reported
    /// through [`StepOutput::code`].
    fn run(&self, step: &Step) -> Result<StepOutput>;
}

/// Spawns real processes with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl StepRunner for SystemRunner {
    fn run(&self, step: &Step) -> Result<StepOutput> {
        debug!("Command: {}", step);

        let mut cmd = Command::new(&step.program);
        cmd.args(&step.args);
        for key in &step.env_remove {
            cmd.env_remove(key);
        }
        cmd.envs(step.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(cwd) = &step.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd
            .output()
            .map_err(|e| Error::IoError(format!("Failed to run {} phase: {}", step.phase, e)))?;

        Ok(StepOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Run a step and turn a non-zero exit into [`Error::BuildFailed`]
pub fn run_checked(runner: &dyn StepRunner, step: &Step) -> Result<StepOutput> {
    let output = runner.run(step)?;
    if !output.success() {
        return Err(Error::BuildFailed {
            phase: step.phase.clone(),
            code: output.code,
            stderr: output.stderr,
        });
    }
    Ok(output)
}
