// src/commands/status.rs

//! Report the remote-reported state of the tracked appliance.

use anyhow::{Result, bail};

use super::connect;

pub fn cmd_status() -> Result<()> {
    let session = connect()?;
    let appliance = session.appliance()?;
    let status = session.verify_status(&appliance, false)?;
    if status.is_ok() {
        println!("Appliance state: ok");
        Ok(())
    } else {
        // the issues themselves were already printed
        bail!("{} issue(s) reported", status.issues.len())
    }
}
