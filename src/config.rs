// src/config.rs

//! Layered configuration store
//!
//! Two TOML documents back the store: a global layer under the user's home
//! directory and a local layer under the current project directory. Reads
//! resolve local-first. Writes pick their layer deterministically:
//!
//! 1. a store opened in local-only mode always writes the local layer
//! 2. a key already present locally is updated locally
//! 3. a key already present globally is updated globally
//! 4. a new credential key lands in the global layer
//! 5. any other new key lands in the local layer
//!
//! Every write persists the owning layer immediately; there is no separate
//! save step. Persistence is a plain file write, not a transaction: a
//! crash mid-write can leave a partial file, which the next load rejects
//! as malformed.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Well-known configuration keys.
pub mod keys {
    /// Build service account name.
    pub const USERNAME: &str = "username";
    /// API key paired with the account name.
    pub const API_KEY: &str = "api_key";
    /// Base URL of the build service API.
    pub const API_PATH: &str = "api_path";
    /// Appliance tracked by the current project directory.
    pub const APPLIANCE_ID: &str = "appliance_id";
    /// In-flight build job the client may re-attach to.
    pub const BUILD_ID: &str = "build_id";
}

/// Keys that default to the global layer when written for the first time.
const CREDENTIAL_KEYS: &[&str] = &[keys::USERNAME, keys::API_KEY, keys::API_PATH];

/// Directory holding a layer file, in the home and project directory alike.
const CONFIG_DIR: &str = ".atelier";
/// Layer file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// One persisted key-value document.
#[derive(Debug)]
struct ConfigLayer {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl ConfigLayer {
    /// Load a layer, creating the directory and an empty file when absent.
    ///
    /// This is the only place the store touches the filesystem layout, and
    /// it is idempotent. A file that exists but does not parse is fatal.
    fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::IoError(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
            fs::write(&path, "").map_err(|e| {
                Error::IoError(format!("failed to create {}: {e}", path.display()))
            })?;
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::IoError(format!("failed to read {}: {e}", path.display())))?;
        let values: BTreeMap<String, String> = toml::from_str(&text).map_err(|e| {
            Error::ConfigError(format!("malformed config file {}: {e}", path.display()))
        })?;
        Ok(Self { path, values })
    }

    fn persist(&self) -> Result<()> {
        let text = toml::to_string(&self.values).map_err(|e| {
            Error::ConfigError(format!("failed to serialize {}: {e}", self.path.display()))
        })?;
        fs::write(&self.path, text)
            .map_err(|e| Error::IoError(format!("failed to write {}: {e}", self.path.display())))
    }

    fn reload(&mut self) -> Result<()> {
        let fresh = Self::load(self.path.clone())?;
        self.values = fresh.values;
        Ok(())
    }
}

/// Layered key-value configuration with local-shadows-global reads.
#[derive(Debug)]
pub struct ConfigStore {
    global: ConfigLayer,
    local: ConfigLayer,
    local_only: bool,
}

impl ConfigStore {
    /// Open the store at the default locations: `~/.atelier/config.toml`
    /// and `./.atelier/config.toml`.
    pub fn open() -> Result<Self> {
        Self::open_mode(false)
    }

    /// Open in local-only mode: every write targets the local layer.
    pub fn open_local_only() -> Result<Self> {
        Self::open_mode(true)
    }

    fn open_mode(local_only: bool) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::ConfigError("cannot determine the home directory".to_string()))?;
        let global = home.join(CONFIG_DIR).join(CONFIG_FILE);
        let local = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);
        Self::open_at(global, local, local_only)
    }

    /// Open with explicit layer paths. Missing layer files are created.
    pub fn open_at(global_path: PathBuf, local_path: PathBuf, local_only: bool) -> Result<Self> {
        Ok(Self {
            global: ConfigLayer::load(global_path)?,
            local: ConfigLayer::load(local_path)?,
            local_only,
        })
    }

    /// Look up a key, local layer first.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.local
            .values
            .get(key)
            .or_else(|| self.global.values.get(key))
            .map(String::as_str)
    }

    /// True when the key resolves to a non-empty value.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_empty())
    }

    /// Set a key and persist the owning layer before returning.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let layer = if self.local_only || self.local.values.contains_key(key) {
            &mut self.local
        } else if self.global.values.contains_key(key) || CREDENTIAL_KEYS.contains(&key) {
            &mut self.global
        } else {
            &mut self.local
        };
        layer.values.insert(key.to_string(), value.to_string());
        layer.persist()?;
        debug!("stored {} in {}", key, layer.path.display());
        Ok(())
    }

    /// Remove a key from the nearest layer holding it and persist. Removing
    /// an absent key is a no-op.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.local.values.remove(key).is_some() {
            return self.local.persist();
        }
        if self.global.values.remove(key).is_some() {
            return self.global.persist();
        }
        Ok(())
    }

    /// Re-read both layers from disk, dropping any in-memory state that was
    /// never persisted.
    pub fn reload(&mut self) -> Result<()> {
        self.local.reload()?;
        self.global.reload()
    }

    /// Merged entries with their origin layer; local shadows global.
    pub fn entries(&self) -> Vec<(String, String, &'static str)> {
        let mut merged: BTreeMap<String, (String, &'static str)> = BTreeMap::new();
        for (key, value) in &self.global.values {
            merged.insert(key.clone(), (value.clone(), "global"));
        }
        for (key, value) in &self.local.values {
            merged.insert(key.clone(), (value.clone(), "local"));
        }
        merged
            .into_iter()
            .map(|(key, (value, layer))| (key, value, layer))
            .collect()
    }

    pub fn global_path(&self) -> &Path {
        &self.global.path
    }

    pub fn local_path(&self) -> &Path {
        &self.local.path
    }
}
