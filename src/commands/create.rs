// src/commands/create.rs

//! Create an appliance from a template and start tracking it.

use anyhow::{Result, bail};
use atelier::config::keys;
use atelier::progress;
use atelier::prompt::{MenuChoice, Prompter};
use atelier::resolver;
use tracing::info;

use super::connect;

pub fn cmd_create(name: &str, template: &str, basesystem: Option<&str>, arch: &str) -> Result<()> {
    let mut session = connect()?;

    if let Some(tracked) = session.config.get(keys::APPLIANCE_ID) {
        let question = format!(
            "This directory already tracks appliance {tracked}. Replace it?"
        );
        if !session.prompter.ask_yes_no(&question)? {
            bail!("kept the existing appliance");
        }
    }

    let templates = progress::with_spinner("Fetching templates", || session.api.list_templates())?;
    if templates.is_empty() {
        bail!("the build service offers no templates");
    }

    let available = resolver::basesystems(&templates);
    let basesystem = match basesystem {
        Some(wanted) => match available.iter().find(|b| b.eq_ignore_ascii_case(wanted)) {
            Some(found) => found.clone(),
            None => bail!(
                "'{}' is not an offered base system (offered: {})",
                wanted,
                available.join(", ")
            ),
        },
        None => pick_default_basesystem(&available, session.prompter.as_ref())?,
    };

    let Some(matched) = resolver::resolve_template(&templates, template, &basesystem) else {
        eprintln!("Base system {basesystem} has no template matching '{template}'.");
        eprintln!("Available templates:");
        for t in resolver::templates_for_basesystem(&templates, &basesystem) {
            eprintln!("  - {}", t.name);
        }
        bail!("no matching template");
    };

    let appliance = progress::with_spinner("Creating the appliance", || {
        session.api.clone_appliance(&matched.id, name, arch)
    })?;
    session.config.set(keys::APPLIANCE_ID, &appliance.id)?;
    info!("Created appliance {} from template {}", appliance.id, matched.id);

    println!("Appliance successfully created:");
    println!("  {}", appliance.edit_url);
    Ok(())
}

/// The newest version-numbered base system, or an operator choice when
/// none of the offered names carries a version.
fn pick_default_basesystem(available: &[String], prompter: &dyn Prompter) -> Result<String> {
    let versioned: Vec<&String> = available.iter().filter(|b| looks_versioned(b)).collect();
    if let Some(newest) = versioned.last() {
        return Ok((*newest).clone());
    }
    match prompter.ask_menu("Offered base systems:", available, false)? {
        MenuChoice::Item(index) => Ok(available[index].clone()),
        _ => bail!("no base system selected"),
    }
}

/// A digit run, a dot, a digit run somewhere in the name ("11.4", "12.1SP1").
fn looks_versioned(basesystem: &str) -> bool {
    basesystem
        .as_bytes()
        .windows(3)
        .any(|w| w[0].is_ascii_digit() && w[1] == b'.' && w[2].is_ascii_digit())
}
