// src/model.rs

//! Value types mirroring the build service's resources
//!
//! Everything here is a plain snapshot decoded from a response. State is
//! re-fetched explicitly through the API when freshness matters; nothing
//! reloads itself behind the caller's back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An OS template offered by the build service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub basesystem: String,
}

/// An appliance: one build target owned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appliance {
    pub id: String,
    pub name: String,
    pub basesystem: String,
    /// Template the appliance was cloned from, when the service reports it.
    #[serde(default)]
    pub parent: Option<String>,
    /// Web page for manual edits, shown whenever issues need human help.
    pub edit_url: String,
}

/// Remote-reported appliance health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplianceStatus {
    pub state: String,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl ApplianceStatus {
    pub fn is_ok(&self) -> bool {
        self.state == "ok"
    }
}

/// One hit from a software search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCandidate {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub repo_id: String,
    pub repo_name: String,
    /// Base system the providing repository targets.
    pub basesystem: String,
}

/// Lifecycle state of a build job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Queued,
    Building,
    Finished,
    Error,
    Failed,
    Cancelled,
}

impl BuildState {
    /// True while the job is still held or running on the server.
    pub fn is_live(&self) -> bool {
        matches!(self, BuildState::Queued | BuildState::Building)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_live()
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildState::Queued => "queued",
            BuildState::Building => "building",
            BuildState::Finished => "finished",
            BuildState::Error => "error",
            BuildState::Failed => "failed",
            BuildState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One image build belonging to an appliance.
///
/// `download_url` and `checksum` are only present once the build finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub id: String,
    pub state: BuildState,
    #[serde(default)]
    pub version: Option<String>,
    pub image_type: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Polled progress of a single build job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProgress {
    pub state: BuildState,
    /// Percent complete; only meaningful while the state is `building`.
    #[serde(default)]
    pub percent: u32,
}

/// Parameters for one build submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRequest {
    pub image_type: String,
    /// Overwrite an existing image carrying the same version.
    pub force: bool,
    pub version: Option<String>,
}

/// Everything needed to fetch and verify one artifact. Discarded as soon
/// as the local file is written and verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub filename: String,
    pub size: u64,
    pub checksum: String,
}

impl DownloadTarget {
    /// Extract the artifact fields of a finished build, if it has any.
    pub fn from_build(build: &Build) -> Option<Self> {
        let url = build.download_url.clone()?;
        let checksum = build.checksum.clone()?;
        let filename = match url.rsplit('/').next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("build-{}", build.id),
        };
        Some(Self {
            url,
            filename,
            size: build.size.unwrap_or(0),
            checksum,
        })
    }
}
