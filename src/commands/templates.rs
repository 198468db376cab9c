// src/commands/templates.rs

//! List what the build service offers to start from.

use anyhow::Result;
use atelier::progress;
use atelier::resolver;

use super::connect;

pub fn cmd_templates() -> Result<()> {
    let session = connect()?;
    let templates =
        progress::with_spinner("Fetching templates", || session.api.list_templates())?;

    let mut lines: Vec<String> = templates
        .iter()
        .map(|t| format!("{} ({})", t.name, t.basesystem))
        .collect();
    lines.sort();
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

pub fn cmd_basesystems() -> Result<()> {
    let session = connect()?;
    let templates =
        progress::with_spinner("Fetching templates", || session.api.list_templates())?;

    for basesystem in resolver::basesystems(&templates) {
        println!("{basesystem}");
    }
    Ok(())
}
