// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands, ConfigCommands, PackageCommands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Create {
            name,
            template,
            basesystem,
            arch,
        }) => commands::cmd_create(&name, &template, basesystem.as_deref(), &arch),
        Some(Commands::Build { force, version }) => commands::cmd_build(force, version),
        Some(Commands::Download { dir }) => commands::cmd_download(&dir),
        Some(Commands::Package { command }) => match command {
            PackageCommands::Add { packages } => commands::cmd_package_add(&packages),
            PackageCommands::Rm { packages } => commands::cmd_package_rm(&packages),
        },
        Some(Commands::Status) => commands::cmd_status(),
        Some(Commands::Info) => commands::cmd_info(),
        Some(Commands::Templates) => commands::cmd_templates(),
        Some(Commands::Basesystems) => commands::cmd_basesystems(),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Get { key } => commands::cmd_config_get(&key),
            ConfigCommands::Set { key, value, local } => {
                commands::cmd_config_set(&key, &value, local)
            }
            ConfigCommands::List => commands::cmd_config_list(),
        },
        None => {
            println!("atelier v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'atelier --help' for usage information");
            Ok(())
        }
    }
}
