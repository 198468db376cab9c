// src/commands/package.rs

//! Add and remove packages on the tracked appliance.

use anyhow::{Result, bail};
use atelier::resolver::{AddOutcome, PackageResolver};

use super::connect;

/// Add packages one by one, stopping at the first that cannot be added.
pub fn cmd_package_add(packages: &[String]) -> Result<()> {
    let session = connect()?;
    let appliance = session.appliance()?;
    let resolver = PackageResolver::new(session.api.as_ref(), session.prompter.as_ref());

    for name in packages {
        match resolver.add_package(&appliance, name)? {
            AddOutcome::Added => println!("Added '{name}'."),
            AddOutcome::AddedFromNewRepository { repo_id } => {
                println!("Added '{name}' from newly attached repository {repo_id}.");
            }
            AddOutcome::Declined => bail!("package '{name}' was not added"),
            AddOutcome::NoCompatibleRepository => bail!("package '{name}' could not be resolved"),
        }
    }

    // the adds already happened; report introduced issues without failing
    session.verify_status(&appliance, false)?;
    Ok(())
}

pub fn cmd_package_rm(packages: &[String]) -> Result<()> {
    let session = connect()?;
    let appliance = session.appliance()?;
    let resolver = PackageResolver::new(session.api.as_ref(), session.prompter.as_ref());

    for name in packages {
        resolver.rm_package(&appliance, name)?;
        println!("Removed '{name}'.");
    }

    session.verify_status(&appliance, false)?;
    Ok(())
}
