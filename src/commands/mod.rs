// src/commands/mod.rs

//! Command handlers for the atelier CLI
//!
//! Each handler owns one subcommand: open the config store, connect a
//! session, drive the library and translate outcomes into exit status.

mod build;
mod config;
mod create;
mod download;
mod info;
mod package;
mod status;
mod templates;

pub use build::cmd_build;
pub use config::{cmd_config_get, cmd_config_list, cmd_config_set};
pub use create::cmd_create;
pub use download::cmd_download;
pub use info::cmd_info;
pub use package::{cmd_package_add, cmd_package_rm};
pub use status::cmd_status;
pub use templates::{cmd_basesystems, cmd_templates};

use anyhow::Result;
use atelier::config::ConfigStore;
use atelier::prompt::TerminalPrompter;
use atelier::session::Session;

/// Open the default config store and connect an interactive session.
fn connect() -> Result<Session> {
    let config = ConfigStore::open()?;
    Ok(Session::connect(config, Box::new(TerminalPrompter::new()))?)
}
