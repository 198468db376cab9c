// src/build.rs

//! Build lifecycle orchestration
//!
//! Drives one appliance build from submission to a terminal state:
//! negotiate version conflicts at submission, sit out the server queue,
//! poll a running build with a percent bar, and classify the terminal
//! state. The id of an in-flight job is tracked in the local config layer
//! so an interrupted client can re-attach instead of submitting a
//! duplicate job.
//!
//! Callers are expected to verify the appliance status before running an
//! orchestration; a build submitted against a broken appliance fails
//! remotely with far less context.

use crate::api::StudioApi;
use crate::config::{ConfigStore, keys};
use crate::error::{Error, Result};
use crate::model::{Build, BuildRequest, BuildState};
use crate::progress;
use crate::prompt::Prompter;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Image format requested for every build.
pub const DEFAULT_IMAGE_TYPE: &str = "oem";

/// Delay between two polls of a live build job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How an orchestration run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The build reached `finished`.
    Succeeded { build_id: String },
    /// The build ended in `error`, `failed` or `cancelled`.
    Ended { build_id: String, state: BuildState },
    /// The operator chose not to wait; the remote job keeps running.
    Detached { build_id: String },
}

impl BuildOutcome {
    /// Success means exactly one thing: the terminal state was `finished`.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded { .. })
    }
}

/// Options for one orchestration run.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Overwrite an existing image with the same version without asking.
    pub force: bool,
    /// Explicit image version to request.
    pub version: Option<String>,
}

/// Drives a remote build from submission to a terminal state.
pub struct BuildOrchestrator<'a> {
    api: &'a dyn StudioApi,
    prompter: &'a dyn Prompter,
    poll_interval: Duration,
    show_progress: bool,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(api: &'a dyn StudioApi, prompter: &'a dyn Prompter) -> Self {
        Self {
            api,
            prompter,
            poll_interval: DEFAULT_POLL_INTERVAL,
            show_progress: true,
        }
    }

    /// Override the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Disable the percent bar, for scripted runs.
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Run the full lifecycle for an appliance.
    ///
    /// Re-attaches to the tracked build when one is still live on the
    /// server; otherwise submits a new job and tracks its id. The tracked
    /// id is cleared again on every terminal outcome, but kept when the
    /// operator detaches from a queued job.
    pub fn run(
        &self,
        config: &mut ConfigStore,
        appliance_id: &str,
        options: BuildOptions,
    ) -> Result<BuildOutcome> {
        let build_id = match self.reattach_target(config)? {
            Some(id) => id,
            None => {
                let build = self.submit(appliance_id, options)?;
                config.set(keys::BUILD_ID, &build.id)?;
                build.id
            }
        };

        let outcome = self.wait(&build_id)?;
        if !matches!(outcome, BuildOutcome::Detached { .. }) {
            config.remove(keys::BUILD_ID)?;
        }
        Ok(outcome)
    }

    /// The tracked build id, provided that job is still live remotely.
    ///
    /// A tracked id whose job already ended, or that the server no longer
    /// knows, is stale: it is dropped and a fresh submission happens.
    fn reattach_target(&self, config: &mut ConfigStore) -> Result<Option<String>> {
        let Some(build_id) = config.get(keys::BUILD_ID).map(str::to_string) else {
            return Ok(None);
        };
        match self.api.reload_build(&build_id) {
            Ok(progress) if progress.state.is_live() => {
                println!("Re-attaching to build {build_id} ({}).", progress.state);
                Ok(Some(build_id))
            }
            Ok(progress) => {
                debug!(
                    "Tracked build {} already ended in {}; submitting a new one",
                    build_id, progress.state
                );
                config.remove(keys::BUILD_ID)?;
                Ok(None)
            }
            Err(Error::NotFoundError(_)) => {
                warn!("Tracked build {} no longer exists on the server", build_id);
                config.remove(keys::BUILD_ID)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Submit the build, negotiating "version already exists" answers.
    ///
    /// Accepting the overwrite resubmits with force; declining asks for a
    /// fresh non-empty version and resubmits with that. The negotiation
    /// repeats until the service accepts or the operator walks away.
    fn submit(&self, appliance_id: &str, options: BuildOptions) -> Result<Build> {
        let mut request = BuildRequest {
            image_type: DEFAULT_IMAGE_TYPE.to_string(),
            force: options.force,
            version: options.version,
        };
        loop {
            match self.api.create_build(appliance_id, &request) {
                Ok(build) => {
                    info!("Build {} submitted for appliance {}", build.id, appliance_id);
                    return Ok(build);
                }
                Err(Error::VersionConflict { version }) => {
                    println!("An image with version {version} already exists.");
                    if self.prompter.ask_yes_no("Overwrite the existing image?")? {
                        request.force = true;
                    } else {
                        let fresh = self.prompter.ask_nonempty("New version:")?;
                        request.force = false;
                        request.version = Some(fresh);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll the job until it leaves the live states.
    fn wait(&self, build_id: &str) -> Result<BuildOutcome> {
        let mut progress = self.api.reload_build(build_id)?;

        if progress.state == BuildState::Queued {
            println!("The build job is queued and keeps running on the server if you exit now.");
            if !self.prompter.ask_yes_no("Wait for the build to start?")? {
                return Ok(BuildOutcome::Detached {
                    build_id: build_id.to_string(),
                });
            }
            while progress.state == BuildState::Queued {
                std::thread::sleep(self.poll_interval);
                progress = self.api.reload_build(build_id)?;
            }
        }

        let bar = (self.show_progress && progress.state == BuildState::Building)
            .then(|| progress::build_bar("Building"));
        while progress.state == BuildState::Building {
            if let Some(bar) = &bar {
                bar.set_position(u64::from(progress.percent.min(100)));
            }
            std::thread::sleep(self.poll_interval);
            progress = match self.api.reload_build(build_id) {
                Ok(fresh) => fresh,
                Err(e) => {
                    if let Some(bar) = &bar {
                        bar.abandon_with_message("Building [failed]");
                    }
                    return Err(e);
                }
            };
        }
        if let Some(bar) = bar {
            match progress.state {
                BuildState::Finished => bar.finish_with_message("Building [done]"),
                state => bar.abandon_with_message(format!("Building [{state}]")),
            }
        }

        info!("Build {} ended in state {}", build_id, progress.state);
        match progress.state {
            BuildState::Finished => Ok(BuildOutcome::Succeeded {
                build_id: build_id.to_string(),
            }),
            state => Ok(BuildOutcome::Ended {
                build_id: build_id.to_string(),
                state,
            }),
        }
    }
}
