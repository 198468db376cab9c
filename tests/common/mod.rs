// tests/common/mod.rs

//! Shared fixtures: a scriptable in-memory build service.

use atelier::api::StudioApi;
use atelier::model::{
    Appliance, ApplianceStatus, Build, BuildProgress, BuildRequest, PackageCandidate, Template,
};
use atelier::{Error, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Scriptable state behind a [`MockStudio`]. Kept behind `Rc` so a test
/// can stage calls and inspect the journal while the mock itself is owned
/// by a session.
#[derive(Default)]
pub struct MockState {
    pub templates: RefCell<Vec<Template>>,
    pub appliance: RefCell<Option<Appliance>>,
    pub status: RefCell<Option<ApplianceStatus>>,
    pub attached_hits: RefCell<Vec<PackageCandidate>>,
    pub all_hits: RefCell<Vec<PackageCandidate>>,
    pub builds: RefCell<Vec<Build>>,
    pub create_results: RefCell<VecDeque<Result<Build>>>,
    pub reloads: RefCell<VecDeque<Result<BuildProgress>>>,
    pub submissions: RefCell<Vec<BuildRequest>>,
    /// Credential probes to reject before accepting.
    pub unauthorized_checks: RefCell<u32>,
    /// Every call, in order, one formatted entry each.
    pub journal: RefCell<Vec<String>>,
}

/// In-memory stand-in for the build service.
#[derive(Clone, Default)]
pub struct MockStudio {
    pub state: Rc<MockState>,
}

impl MockStudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appliance(self, appliance: Appliance) -> Self {
        *self.state.appliance.borrow_mut() = Some(appliance);
        self
    }

    pub fn with_status(self, status: ApplianceStatus) -> Self {
        *self.state.status.borrow_mut() = Some(status);
        self
    }

    pub fn with_templates(self, templates: Vec<Template>) -> Self {
        *self.state.templates.borrow_mut() = templates;
        self
    }

    pub fn with_builds(self, builds: Vec<Build>) -> Self {
        *self.state.builds.borrow_mut() = builds;
        self
    }

    pub fn stage_attached_hit(&self, hit: PackageCandidate) {
        self.state.attached_hits.borrow_mut().push(hit);
    }

    pub fn stage_all_hit(&self, hit: PackageCandidate) {
        self.state.all_hits.borrow_mut().push(hit);
    }

    pub fn stage_create(&self, result: Result<Build>) {
        self.state.create_results.borrow_mut().push_back(result);
    }

    pub fn stage_reload(&self, progress: BuildProgress) {
        self.state.reloads.borrow_mut().push_back(Ok(progress));
    }

    pub fn reject_credentials_times(&self, count: u32) {
        *self.state.unauthorized_checks.borrow_mut() = count;
    }

    pub fn journal(&self) -> Vec<String> {
        self.state.journal.borrow().clone()
    }

    /// Journal entries that changed remote state.
    pub fn mutations(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|entry| {
                entry.starts_with("clone_appliance")
                    || entry.starts_with("add_repository")
                    || entry.starts_with("add_package")
                    || entry.starts_with("remove_package")
                    || entry.starts_with("create_build")
            })
            .collect()
    }

    fn record(&self, entry: String) {
        self.state.journal.borrow_mut().push(entry);
    }
}

impl StudioApi for MockStudio {
    fn check_credentials(&self) -> Result<()> {
        self.record("check_credentials".to_string());
        let mut rejections = self.state.unauthorized_checks.borrow_mut();
        if *rejections > 0 {
            *rejections -= 1;
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        self.record("list_templates".to_string());
        Ok(self.state.templates.borrow().clone())
    }

    fn clone_appliance(&self, template_id: &str, name: &str, arch: &str) -> Result<Appliance> {
        self.record(format!("clone_appliance:{template_id}:{name}:{arch}"));
        self.state
            .appliance
            .borrow()
            .clone()
            .ok_or_else(|| Error::ApiError("no appliance staged".to_string()))
    }

    fn find_appliance(&self, appliance_id: &str) -> Result<Option<Appliance>> {
        self.record(format!("find_appliance:{appliance_id}"));
        Ok(self
            .state
            .appliance
            .borrow()
            .clone()
            .filter(|a| a.id == appliance_id))
    }

    fn search_software(
        &self,
        _appliance_id: &str,
        name: &str,
        all_repos: bool,
    ) -> Result<Vec<PackageCandidate>> {
        self.record(format!("search_software:{name}:all={all_repos}"));
        let hits = if all_repos {
            self.state.all_hits.borrow()
        } else {
            self.state.attached_hits.borrow()
        };
        Ok(hits.clone())
    }

    fn add_repository(&self, _appliance_id: &str, repo_id: &str) -> Result<()> {
        self.record(format!("add_repository:{repo_id}"));
        Ok(())
    }

    fn add_package(&self, _appliance_id: &str, name: &str) -> Result<()> {
        self.record(format!("add_package:{name}"));
        Ok(())
    }

    fn remove_package(&self, _appliance_id: &str, name: &str) -> Result<()> {
        self.record(format!("remove_package:{name}"));
        Ok(())
    }

    fn appliance_status(&self, appliance_id: &str) -> Result<ApplianceStatus> {
        self.record(format!("appliance_status:{appliance_id}"));
        self.state
            .status
            .borrow()
            .clone()
            .ok_or_else(|| Error::ApiError("no status staged".to_string()))
    }

    fn create_build(&self, appliance_id: &str, request: &BuildRequest) -> Result<Build> {
        self.record(format!("create_build:{appliance_id}"));
        self.state.submissions.borrow_mut().push(request.clone());
        self.state
            .create_results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected create_build"))
    }

    fn reload_build(&self, build_id: &str) -> Result<BuildProgress> {
        self.record(format!("reload_build:{build_id}"));
        self.state
            .reloads
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected reload_build"))
    }

    fn list_builds(&self, appliance_id: &str) -> Result<Vec<Build>> {
        self.record(format!("list_builds:{appliance_id}"));
        Ok(self.state.builds.borrow().clone())
    }
}

pub fn template(id: &str, name: &str, basesystem: &str) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        basesystem: basesystem.to_string(),
    }
}

pub fn appliance(id: &str, basesystem: &str) -> Appliance {
    Appliance {
        id: id.to_string(),
        name: "webapp".to_string(),
        basesystem: basesystem.to_string(),
        parent: Some("JeOS".to_string()),
        edit_url: format!("https://studio.example.com/appliances/{id}/edit"),
    }
}

pub fn ok_status() -> ApplianceStatus {
    ApplianceStatus {
        state: "ok".to_string(),
        issues: Vec::new(),
    }
}

pub fn broken_status(issues: &[&str]) -> ApplianceStatus {
    ApplianceStatus {
        state: "bad".to_string(),
        issues: issues.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn candidate(name: &str, repo_id: &str, basesystem: &str) -> PackageCandidate {
    PackageCandidate {
        name: name.to_string(),
        version: Some("1.0".to_string()),
        repo_id: repo_id.to_string(),
        repo_name: format!("repo {repo_id}"),
        basesystem: basesystem.to_string(),
    }
}

pub fn finished_build(id: &str, url: &str, body: &[u8]) -> Build {
    Build {
        id: id.to_string(),
        state: atelier::model::BuildState::Finished,
        version: Some("0.0.1".to_string()),
        image_type: "oem".to_string(),
        download_url: Some(url.to_string()),
        checksum: Some(atelier::hash::sha256_hex(body)),
        size: Some(body.len() as u64),
    }
}
