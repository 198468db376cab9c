// src/cli.rs

//! CLI definitions for the atelier client

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "atelier")]
#[command(version)]
#[command(about = "Client for a remote appliance build service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new appliance from a template
    Create {
        /// Name of the appliance to create
        name: String,

        /// Template to clone, matched as a case-insensitive substring
        #[arg(long, default_value = "JeOS")]
        template: String,

        /// Base system the template must target (default: newest offered)
        #[arg(long)]
        basesystem: Option<String>,

        /// Target architecture
        #[arg(long, default_value = "x86_64", value_parser = ["i686", "x86_64"])]
        arch: String,
    },

    /// Build the appliance and wait for the result
    Build {
        /// Overwrite an existing image with the same version
        #[arg(long)]
        force: bool,

        /// Version string for the new image
        #[arg(long)]
        version: Option<String>,
    },

    /// Download the artifacts of finished builds
    Download {
        /// Directory to place the artifacts in
        #[arg(long, default_value = ".")]
        dir: String,
    },

    /// Add or remove packages on the appliance
    Package {
        #[command(subcommand)]
        command: PackageCommands,
    },

    /// Check the appliance for unresolved issues
    Status,

    /// Show the appliance and its builds
    Info,

    /// List the templates offered by the build service
    Templates,

    /// List the base systems offered by the build service
    Basesystems,

    /// Read and write configuration values
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum PackageCommands {
    /// Add packages, resolving repositories when needed
    Add {
        /// Package names to add
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Remove packages
    Rm {
        /// Package names to remove
        #[arg(required = true)]
        packages: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print one configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to store
        value: String,

        /// Write to the project-local layer regardless of precedence
        #[arg(long)]
        local: bool,
    },

    /// List the merged configuration with each entry's origin layer
    List,
}
