// src/commands/info.rs

//! Show the tracked appliance and its builds.

use anyhow::Result;
use atelier::progress::{self, human_size};

use super::connect;

pub fn cmd_info() -> Result<()> {
    let session = connect()?;
    let appliance = session.appliance()?;
    let builds = progress::with_spinner("Fetching builds", || {
        session.api.list_builds(&appliance.id)
    })?;

    println!("Name: {}", appliance.name);
    if let Some(parent) = &appliance.parent {
        println!("Based on: {parent}");
    }
    println!("Base system: {}", appliance.basesystem);
    if builds.is_empty() {
        println!("No builds yet.");
    } else {
        println!("Builds:");
        for build in &builds {
            let version = build.version.as_deref().unwrap_or("-");
            let size = match build.size {
                Some(size) => format!(" ({})", human_size(size)),
                None => String::new(),
            };
            println!(
                "  - {} {} [{}]{}",
                build.image_type, version, build.state, size
            );
        }
    }
    println!("Edit URL: {}", appliance.edit_url);
    Ok(())
}
