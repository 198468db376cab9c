// src/session.rs

//! Connected client session
//!
//! Bundles what a command needs to act on the build service: the layered
//! config store, an authenticated API client and the operator prompter.
//! Construction performs the credential bootstrap: missing keys are
//! prompted for and stored, then the connection is probed. Rejected
//! credentials loop through re-prompt and retry until the service accepts
//! or the operator gives up.

use crate::api::{Credentials, StudioApi, StudioClient};
use crate::config::{ConfigStore, keys};
use crate::error::{Error, Result};
use crate::model::{Appliance, ApplianceStatus};
use crate::progress;
use crate::prompt::Prompter;
use tracing::{debug, info};

pub struct Session {
    pub config: ConfigStore,
    pub api: Box<dyn StudioApi>,
    pub prompter: Box<dyn Prompter>,
}

impl Session {
    /// Connect to the build service, bootstrapping credentials as needed.
    pub fn connect(config: ConfigStore, prompter: Box<dyn Prompter>) -> Result<Self> {
        Self::connect_with(config, prompter, |credentials| {
            StudioClient::new(credentials).map(|client| Box::new(client) as Box<dyn StudioApi>)
        })
    }

    /// Like [`Session::connect`], with the API construction pluggable.
    pub fn connect_with(
        mut config: ConfigStore,
        prompter: Box<dyn Prompter>,
        mut make_api: impl FnMut(Credentials) -> Result<Box<dyn StudioApi>>,
    ) -> Result<Self> {
        if !(config.has(keys::USERNAME) && config.has(keys::API_KEY) && config.has(keys::API_PATH))
        {
            println!("Please enter your build service credentials.");
            prompt_credentials(&mut config, prompter.as_ref())?;
        }
        loop {
            let api = make_api(credentials_from(&config)?)?;
            match progress::with_spinner("Contacting the build service", || {
                api.check_credentials()
            }) {
                Ok(()) => {
                    info!(
                        "Authenticated against {}",
                        config.get(keys::API_PATH).unwrap_or_default()
                    );
                    return Ok(Self {
                        config,
                        api,
                        prompter,
                    });
                }
                Err(Error::Unauthorized) => {
                    println!("The build service rejected the credentials.");
                    if prompter.ask_yes_no("Re-enter your credentials and try again?")? {
                        prompt_credentials(&mut config, prompter.as_ref())?;
                    } else {
                        return Err(Error::Aborted("credential check declined".to_string()));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Assemble a session from existing parts, skipping the bootstrap.
    pub fn with_parts(
        config: ConfigStore,
        api: Box<dyn StudioApi>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            config,
            api,
            prompter,
        }
    }

    /// The appliance id tracked by this project directory.
    pub fn appliance_id(&self) -> Result<String> {
        self.config
            .get(keys::APPLIANCE_ID)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::ConfigError(
                    "no appliance is tracked here; run 'atelier create' first".to_string(),
                )
            })
    }

    /// Fetch a fresh snapshot of the tracked appliance.
    pub fn appliance(&self) -> Result<Appliance> {
        let id = self.appliance_id()?;
        self.api.find_appliance(&id)?.ok_or_else(|| {
            Error::NotFoundError(format!("appliance {id} no longer exists on the server"))
        })
    }

    /// Check the appliance for remote-reported issues.
    ///
    /// Issues are printed together with the page where they can be fixed.
    /// With `fatal` set the check errors out; otherwise the caller gets
    /// the status back and decides.
    pub fn verify_status(&self, appliance: &Appliance, fatal: bool) -> Result<ApplianceStatus> {
        let status = self.api.appliance_status(&appliance.id)?;
        if status.is_ok() {
            debug!("Appliance {} status ok", appliance.id);
            return Ok(status);
        }

        println!("The appliance reports unresolved issues:");
        for issue in &status.issues {
            println!("  - {issue}");
        }
        println!("Resolve them at {}", appliance.edit_url);
        if fatal {
            return Err(Error::ApplianceNotReady(format!(
                "{} issue(s) reported for appliance {}",
                status.issues.len(),
                appliance.id
            )));
        }
        Ok(status)
    }
}

/// Read the three credential keys into an API credential set.
fn credentials_from(config: &ConfigStore) -> Result<Credentials> {
    let fetch = |key: &str| -> Result<String> {
        config
            .get(key)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::ConfigError(format!("missing credential '{key}'")))
    };
    Ok(Credentials {
        username: fetch(keys::USERNAME)?,
        api_key: fetch(keys::API_KEY)?,
        api_path: fetch(keys::API_PATH)?,
    })
}

/// Prompt for every credential key and store each one as it arrives.
fn prompt_credentials(config: &mut ConfigStore, prompter: &dyn Prompter) -> Result<()> {
    let username = prompter.ask_nonempty("Username:")?;
    config.set(keys::USERNAME, &username)?;
    let api_key = prompter.ask_nonempty("API key:")?;
    config.set(keys::API_KEY, &api_key)?;
    let api_path = prompter.ask_nonempty("API base URL:")?;
    config.set(keys::API_PATH, &api_path)?;
    Ok(())
}
