// src/commands/config.rs

//! Read and write the layered configuration.

use anyhow::{Result, bail};
use atelier::config::ConfigStore;

pub fn cmd_config_get(key: &str) -> Result<()> {
    let config = ConfigStore::open()?;
    match config.get(key) {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => bail!("key '{key}' is not set"),
    }
}

pub fn cmd_config_set(key: &str, value: &str, local: bool) -> Result<()> {
    let mut config = if local {
        ConfigStore::open_local_only()?
    } else {
        ConfigStore::open()?
    };
    config.set(key, value)?;
    Ok(())
}

pub fn cmd_config_list() -> Result<()> {
    let config = ConfigStore::open()?;
    println!("# global: {}", config.global_path().display());
    println!("# local:  {}", config.local_path().display());
    for (key, value, layer) in config.entries() {
        println!("{key} = {value}  [{layer}]");
    }
    Ok(())
}
