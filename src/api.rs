// src/api.rs

//! Remote build service API
//!
//! [`StudioApi`] is the contract the command flows depend on; [`StudioClient`]
//! is the reqwest-backed implementation. Calls are synchronous and every
//! request carries an explicit timeout. Reads are idempotent and retried on
//! transport failure with a linear backoff; mutations are submitted exactly
//! once and never retried.

use crate::error::{Error, Result};
use crate::model::{
    Appliance, ApplianceStatus, Build, BuildProgress, BuildRequest, PackageCandidate, Template,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// Default timeout for API requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum attempts for idempotent read calls
const MAX_RETRIES: u32 = 3;
/// Base retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Everything the client needs to speak to one build service account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
    pub api_path: String,
}

/// Operations the build service offers.
pub trait StudioApi {
    /// Probe the service with the configured credentials.
    fn check_credentials(&self) -> Result<()>;

    /// All templates the service offers.
    fn list_templates(&self) -> Result<Vec<Template>>;

    /// Clone a template into a new appliance.
    fn clone_appliance(&self, template_id: &str, name: &str, arch: &str) -> Result<Appliance>;

    /// Fetch one appliance, `None` when the id is unknown to the service.
    fn find_appliance(&self, appliance_id: &str) -> Result<Option<Appliance>>;

    /// Search for software, either in the appliance's attached
    /// repositories or across every repository the service knows.
    fn search_software(
        &self,
        appliance_id: &str,
        name: &str,
        all_repos: bool,
    ) -> Result<Vec<PackageCandidate>>;

    /// Attach a repository to an appliance.
    fn add_repository(&self, appliance_id: &str, repo_id: &str) -> Result<()>;

    /// Add a package by name.
    fn add_package(&self, appliance_id: &str, name: &str) -> Result<()>;

    /// Remove a package by name.
    fn remove_package(&self, appliance_id: &str, name: &str) -> Result<()>;

    /// Remote-reported appliance health.
    fn appliance_status(&self, appliance_id: &str) -> Result<ApplianceStatus>;

    /// Submit a build job. A version collision surfaces as
    /// [`Error::VersionConflict`] carrying the colliding version.
    fn create_build(&self, appliance_id: &str, request: &BuildRequest) -> Result<Build>;

    /// Re-read the state of a single build job.
    fn reload_build(&self, build_id: &str) -> Result<BuildProgress>;

    /// Every build belonging to an appliance, finished or not.
    fn list_builds(&self, appliance_id: &str) -> Result<Vec<Build>>;
}

/// HTTP implementation of [`StudioApi`].
pub struct StudioClient {
    client: Client,
    credentials: Credentials,
}

impl StudioClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        let base = self.credentials.api_path.trim_end_matches('/');
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.api_key))
    }

    /// GET with bounded retry on transport failure.
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = self.url(path);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let sent = self.authed(self.client.get(&url).query(query)).send();
            match sent {
                Ok(response) => return check_status(response, &url),
                Err(e) => {
                    if attempt >= MAX_RETRIES {
                        return Err(Error::ApiError(format!(
                            "GET {url} failed after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("GET {} attempt {} failed: {}, retrying...", url, attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)));
                }
            }
        }
    }

    fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.get(path, query)?;
        decode_json(response, path)
    }

    /// Issue a mutation exactly once.
    fn send_once(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = self
            .authed(request)
            .send()
            .map_err(|e| Error::ApiError(format!("request to {url} failed: {e}")))?;
        check_status(response, url)
    }

    fn post(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = self.url(path);
        self.send_once(self.client.post(&url).query(query), &url)
    }

    fn delete(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        self.send_once(self.client.delete(&url), &url)
    }
}

impl StudioApi for StudioClient {
    fn check_credentials(&self) -> Result<()> {
        self.get("version", &[]).map(|_| ())
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        self.get_json("templates", &[])
    }

    fn clone_appliance(&self, template_id: &str, name: &str, arch: &str) -> Result<Appliance> {
        info!("Cloning template {} into appliance '{}'", template_id, name);
        let response = self.post(
            "appliances",
            &[("clone_from", template_id), ("name", name), ("arch", arch)],
        )?;
        decode_json(response, "appliances")
    }

    fn find_appliance(&self, appliance_id: &str) -> Result<Option<Appliance>> {
        match self.get_json(&format!("appliances/{appliance_id}"), &[]) {
            Ok(appliance) => Ok(Some(appliance)),
            Err(Error::NotFoundError(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn search_software(
        &self,
        appliance_id: &str,
        name: &str,
        all_repos: bool,
    ) -> Result<Vec<PackageCandidate>> {
        let all = if all_repos { "true" } else { "false" };
        self.get_json(
            &format!("appliances/{appliance_id}/software/search"),
            &[("q", name), ("all_repos", all)],
        )
    }

    fn add_repository(&self, appliance_id: &str, repo_id: &str) -> Result<()> {
        info!("Attaching repository {} to appliance {}", repo_id, appliance_id);
        self.post(
            &format!("appliances/{appliance_id}/repositories"),
            &[("repo_id", repo_id)],
        )
        .map(|_| ())
    }

    fn add_package(&self, appliance_id: &str, name: &str) -> Result<()> {
        info!("Adding package {} to appliance {}", name, appliance_id);
        self.post(
            &format!("appliances/{appliance_id}/packages"),
            &[("name", name)],
        )
        .map(|_| ())
    }

    fn remove_package(&self, appliance_id: &str, name: &str) -> Result<()> {
        info!("Removing package {} from appliance {}", name, appliance_id);
        self.delete(&format!("appliances/{appliance_id}/packages/{name}"))
            .map(|_| ())
    }

    fn appliance_status(&self, appliance_id: &str) -> Result<ApplianceStatus> {
        self.get_json(&format!("appliances/{appliance_id}/status"), &[])
    }

    fn create_build(&self, appliance_id: &str, request: &BuildRequest) -> Result<Build> {
        let mut query: Vec<(&str, &str)> = vec![
            ("appliance_id", appliance_id),
            ("image_type", &request.image_type),
        ];
        if request.force {
            query.push(("force", "true"));
        }
        if let Some(version) = &request.version {
            query.push(("version", version));
        }

        info!("Submitting build for appliance {}", appliance_id);
        let url = self.url("builds");
        let response = self
            .authed(self.client.post(&url).query(&query))
            .send()
            .map_err(|e| Error::ApiError(format!("request to {url} failed: {e}")))?;

        // A version collision is a negotiable answer, not a plain failure.
        if response.status() == StatusCode::CONFLICT {
            let conflict: VersionConflictBody = response
                .json()
                .map_err(|e| Error::ParseError(format!("invalid conflict response: {e}")))?;
            return Err(Error::VersionConflict {
                version: conflict.version,
            });
        }
        let response = check_status(response, &url)?;
        decode_json(response, "builds")
    }

    fn reload_build(&self, build_id: &str) -> Result<BuildProgress> {
        self.get_json(&format!("builds/{build_id}"), &[])
    }

    fn list_builds(&self, appliance_id: &str) -> Result<Vec<Build>> {
        self.get_json(&format!("appliances/{appliance_id}/builds"), &[])
    }
}

/// 409 payload for a build whose version already exists.
#[derive(Debug, Deserialize)]
struct VersionConflictBody {
    version: String,
}

/// Map an HTTP status onto the crate error taxonomy.
fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
        StatusCode::NOT_FOUND => Err(Error::NotFoundError(format!("{url} returned 404"))),
        _ => {
            let reason = body_excerpt(response);
            Err(Error::ApiError(format!("HTTP {status} from {url}: {reason}")))
        }
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(response: Response, context: &str) -> Result<T> {
    response
        .json()
        .map_err(|e| Error::ParseError(format!("invalid response from {context}: {e}")))
}

/// First characters of an error body, for context in surfaced errors.
fn body_excerpt(response: Response) -> String {
    match response.text() {
        Ok(text) if !text.trim().is_empty() => text.chars().take(200).collect(),
        _ => "<no body>".to_string(),
    }
}
