// src/commands/build.rs

//! Build the tracked appliance and wait for the outcome.

use anyhow::{Result, bail};
use atelier::build::{BuildOptions, BuildOrchestrator, BuildOutcome};

use super::connect;

pub fn cmd_build(force: bool, version: Option<String>) -> Result<()> {
    let mut session = connect()?;
    let appliance = session.appliance()?;
    // a build against an appliance with open issues fails remotely with
    // far less context
    session.verify_status(&appliance, true)?;

    let orchestrator = BuildOrchestrator::new(session.api.as_ref(), session.prompter.as_ref());
    let outcome = orchestrator.run(
        &mut session.config,
        &appliance.id,
        BuildOptions { force, version },
    )?;

    match outcome {
        BuildOutcome::Succeeded { .. } => {
            println!("Appliance successfully built.");
            Ok(())
        }
        BuildOutcome::Ended { state, build_id } => {
            println!("Build {build_id} ended in state {state}.");
            bail!("the build did not finish")
        }
        BuildOutcome::Detached { build_id } => {
            println!("Leaving build {build_id} running on the server.");
            println!("Run 'atelier build' again to re-attach to it.");
            Ok(())
        }
    }
}
