// src/smoke.rs

//! Post-install smoke test
//!
//! Proves the installed client binary launches, then optionally resolves a
//! well-known name through it. The resolution probe needs network access and
//! can be switched off.

use crate::error::Result;
use crate::recipe::kitchen::context::InstallContext;
use crate::recipe::kitchen::runner::{Step, StepRunner, run_checked};
use crate::recipe::Recipe;
use tracing::info;

/// Outcome of a passing smoke test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmokeReport {
    /// Commands that ran, in order
    pub commands: Vec<String>,
    /// The network probe was not run
    pub probe_skipped: bool,
}

/// Build the command `argv` with its program resolved against the keg
fn keg_step(ctx: &InstallContext, argv: &[String]) -> Option<Step> {
    let (program, args) = argv.split_first()?;
    Some(Step::new("test", ctx.prefix.join(program)).args(args.iter().cloned()))
}

/// Run the smoke test; any non-zero exit fails it
pub fn run(
    runner: &dyn StepRunner,
    recipe: &Recipe,
    ctx: &InstallContext,
    probe: Option<&str>,
) -> Result<SmokeReport> {
    let mut report = SmokeReport::default();

    if let Some(step) = keg_step(ctx, &recipe.smoke.version_check) {
        info!("Testing: {}", step);
        run_checked(runner, &step)?;
        report.commands.push(step.to_string());
    }

    match (probe, keg_step(ctx, &recipe.smoke.resolve)) {
        (Some(name), Some(step)) => {
            let step = step.arg(name);
            info!("Testing: {}", step);
            run_checked(runner, &step)?;
            report.commands.push(step.to_string());
        }
        _ => {
            info!("Skipping name resolution probe");
            report.probe_skipped = true;
        }
    }

    Ok(report)
}
