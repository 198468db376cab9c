// tests/workflow.rs

//! End-to-end flows against the in-memory build service: package
//! resolution, credential bootstrap, build orchestration and artifact
//! download, driven through scripted prompts.

mod common;

use atelier::api::StudioApi;
use atelier::build::{BuildOptions, BuildOrchestrator};
use atelier::config::{ConfigStore, keys};
use atelier::download::{ArtifactFetcher, Downloader};
use atelier::model::{Build, BuildProgress, BuildState, DownloadTarget};
use atelier::prompt::ScriptedPrompter;
use atelier::resolver::{self, AddOutcome, PackageResolver};
use atelier::session::Session;
use atelier::{Error, Result};
use common::{
    MockStudio, appliance, broken_status, candidate, finished_build, ok_status, template,
};
use indicatif::ProgressBar;
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> ConfigStore {
    ConfigStore::open_at(
        dir.path().join("home/.atelier/config.toml"),
        dir.path().join("project/.atelier/config.toml"),
        false,
    )
    .unwrap()
}

/// Fetcher double writing staged bytes instead of hitting the network.
struct StagedFetcher {
    bodies: Vec<(String, Vec<u8>)>,
    fetched: RefCell<Vec<String>>,
}

impl StagedFetcher {
    fn new(bodies: &[(&str, &[u8])]) -> Self {
        Self {
            bodies: bodies
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_vec()))
                .collect(),
            fetched: RefCell::new(Vec::new()),
        }
    }
}

impl ArtifactFetcher for StagedFetcher {
    fn fetch(
        &self,
        target: &DownloadTarget,
        dest: &Path,
        _bar: Option<&ProgressBar>,
    ) -> Result<u64> {
        self.fetched.borrow_mut().push(target.url.clone());
        let (_, body) = self
            .bodies
            .iter()
            .find(|(url, _)| url == &target.url)
            .unwrap_or_else(|| panic!("unexpected fetch of {}", target.url));
        std::fs::write(dest, body).unwrap();
        Ok(body.len() as u64)
    }
}

#[test]
fn adding_a_present_package_asks_nothing() {
    let studio = MockStudio::new();
    studio.stage_attached_hit(candidate("vim", "r-base", "12.1"));
    let prompter = ScriptedPrompter::new(Vec::<String>::new());
    let resolver = PackageResolver::new(&studio, &prompter);

    let outcome = resolver
        .add_package(&appliance("a-1", "12.1"), "vim")
        .unwrap();
    assert_eq!(outcome, AddOutcome::Added);
    assert_eq!(studio.mutations(), vec!["add_package:vim"]);
}

#[test]
fn declining_the_broadened_search_mutates_nothing() {
    let studio = MockStudio::new();
    let prompter = ScriptedPrompter::new(["n"]);
    let resolver = PackageResolver::new(&studio, &prompter);

    let outcome = resolver
        .add_package(&appliance("a-1", "12.1"), "vim")
        .unwrap();
    assert_eq!(outcome, AddOutcome::Declined);
    assert!(studio.mutations().is_empty());
    // only the narrow search ran
    assert_eq!(studio.journal(), vec!["search_software:vim:all=false"]);
}

#[test]
fn broadened_add_attaches_the_repository_before_the_package() {
    let studio = MockStudio::new();
    studio.stage_all_hit(candidate("vim", "r-one", "12.1"));
    studio.stage_all_hit(candidate("vim", "r-wrong", "11.4"));
    studio.stage_all_hit(candidate("vim", "r-two", "12.1"));
    // accept the broadened search, then pick the second compatible repo
    let prompter = ScriptedPrompter::new(["y", "2"]);
    let resolver = PackageResolver::new(&studio, &prompter);

    let outcome = resolver
        .add_package(&appliance("a-1", "12.1"), "vim")
        .unwrap();
    assert_eq!(
        outcome,
        AddOutcome::AddedFromNewRepository {
            repo_id: "r-two".to_string()
        }
    );
    assert_eq!(
        studio.mutations(),
        vec!["add_repository:r-two", "add_package:vim"]
    );
    assert_eq!(prompter.remaining(), 0);
}

#[test]
fn backing_out_of_the_repository_menu_mutates_nothing() {
    let studio = MockStudio::new();
    studio.stage_all_hit(candidate("vim", "r-one", "12.1"));
    // accept the broadened search, then take the "none of them" escape
    let prompter = ScriptedPrompter::new(["y", "2"]);
    let resolver = PackageResolver::new(&studio, &prompter);

    let outcome = resolver
        .add_package(&appliance("a-1", "12.1"), "vim")
        .unwrap();
    assert_eq!(outcome, AddOutcome::Declined);
    assert!(studio.mutations().is_empty());
}

#[test]
fn incompatible_repositories_leave_the_package_unresolved() {
    let studio = MockStudio::new();
    studio.stage_all_hit(candidate("vim", "r-other", "11.4"));
    let prompter = ScriptedPrompter::new(["y"]);
    let resolver = PackageResolver::new(&studio, &prompter);

    let outcome = resolver
        .add_package(&appliance("a-1", "12.1"), "vim")
        .unwrap();
    assert_eq!(outcome, AddOutcome::NoCompatibleRepository);
    assert!(studio.mutations().is_empty());
}

#[test]
fn template_resolution_feeds_the_clone_call() {
    let studio = MockStudio::new()
        .with_templates(vec![
            template("t-server", "Server", "12.1"),
            template("t-jeos-old", "JeOS base", "11.4"),
            template("t-jeos", "JeOS base", "12.1"),
        ])
        .with_appliance(appliance("a-9", "12.1"));

    let templates = studio.list_templates().unwrap();
    let chosen = resolver::resolve_template(&templates, "jeos", "12.1").unwrap();
    let created = studio
        .clone_appliance(&chosen.id, "webapp", "x86_64")
        .unwrap();

    assert_eq!(created.id, "a-9");
    assert_eq!(
        studio.mutations(),
        vec!["clone_appliance:t-jeos:webapp:x86_64"]
    );
}

#[test]
fn only_finished_builds_offer_artifacts() {
    let studio = MockStudio::new().with_builds(vec![
        finished_build("b-1", "https://files.example.com/b1.oem.tar.gz", b"one"),
        Build {
            id: "b-2".to_string(),
            state: BuildState::Building,
            version: Some("0.0.2".to_string()),
            image_type: "oem".to_string(),
            download_url: None,
            checksum: None,
            size: None,
        },
    ]);

    let builds = studio.list_builds("a-1").unwrap();
    let downloadable: Vec<&Build> = builds
        .iter()
        .filter(|b| DownloadTarget::from_build(b).is_some())
        .collect();
    assert_eq!(downloadable.len(), 1);
    assert_eq!(downloadable[0].id, "b-1");
}

#[test]
fn conflict_queue_and_download_round_trip() {
    let work = TempDir::new().unwrap();
    let mut config = config_in(&work);
    let studio = MockStudio::new();

    // first submission collides, the forced resubmission is accepted
    studio.stage_create(Err(Error::VersionConflict {
        version: "0.0.1".to_string(),
    }));
    studio.stage_create(Ok(Build {
        id: "b-1".to_string(),
        state: BuildState::Queued,
        version: Some("0.0.1".to_string()),
        image_type: "oem".to_string(),
        download_url: None,
        checksum: None,
        size: None,
    }));
    studio.stage_reload(BuildProgress {
        state: BuildState::Queued,
        percent: 0,
    });
    studio.stage_reload(BuildProgress {
        state: BuildState::Building,
        percent: 40,
    });
    studio.stage_reload(BuildProgress {
        state: BuildState::Finished,
        percent: 100,
    });

    // overwrite the existing image, then wait out the queue
    let prompter = ScriptedPrompter::new(["y", "y"]);
    let orchestrator = BuildOrchestrator::new(&studio, &prompter)
        .with_poll_interval(Duration::from_millis(0))
        .without_progress();
    let outcome = orchestrator
        .run(&mut config, "a-1", BuildOptions::default())
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(config.get(keys::BUILD_ID), None);

    let submissions = studio.state.submissions.borrow();
    assert_eq!(submissions.len(), 2);
    assert!(submissions[1].force);
    drop(submissions);

    // three finished artifacts, operator takes all of them
    let bodies: Vec<(&str, &[u8])> = vec![
        ("https://files.example.com/b1.oem.tar.gz", b"first image"),
        ("https://files.example.com/b2.oem.tar.gz", b"second image"),
        ("https://files.example.com/b3.oem.tar.gz", b"third image"),
    ];
    let builds: Vec<Build> = bodies
        .iter()
        .enumerate()
        .map(|(i, (url, body))| finished_build(&format!("b-{}", i + 1), url, body))
        .collect();

    let fetcher = StagedFetcher::new(&bodies);
    let prompter = ScriptedPrompter::new(["4"]);
    let dest = work.path().join("images");
    std::fs::create_dir_all(&dest).unwrap();
    let downloader = Downloader::new(&fetcher, &prompter, &dest).without_progress();

    let selected = downloader.select(&builds).unwrap();
    assert_eq!(selected.len(), 3);
    let fetched = downloader.download_all(&selected).unwrap();
    assert_eq!(fetched.len(), 3);

    // exactly three transfers, in listed order, all verified on disk
    assert_eq!(
        *fetcher.fetched.borrow(),
        vec![
            "https://files.example.com/b1.oem.tar.gz".to_string(),
            "https://files.example.com/b2.oem.tar.gz".to_string(),
            "https://files.example.com/b3.oem.tar.gz".to_string(),
        ]
    );
    assert_eq!(
        std::fs::read(dest.join("b2.oem.tar.gz")).unwrap(),
        b"second image"
    );
}

#[test]
fn missing_credentials_are_prompted_and_stored_globally() {
    let work = TempDir::new().unwrap();
    let config = config_in(&work);
    let studio = MockStudio::new();
    let factory_studio = studio.clone();
    let prompter = ScriptedPrompter::new(["someone", "secret", "https://studio.example.com/api"]);

    let session = Session::connect_with(config, Box::new(prompter), move |credentials| {
        assert_eq!(credentials.username, "someone");
        Ok(Box::new(factory_studio.clone()) as Box<dyn StudioApi>)
    })
    .unwrap();

    assert_eq!(session.config.get(keys::USERNAME), Some("someone"));
    assert_eq!(studio.journal(), vec!["check_credentials"]);
    let global = std::fs::read_to_string(session.config.global_path()).unwrap();
    assert!(global.contains("someone"));
    assert!(global.contains("secret"));
}

#[test]
fn rejected_credentials_reprompt_until_accepted() {
    let work = TempDir::new().unwrap();
    let mut config = config_in(&work);
    config.set(keys::USERNAME, "stale").unwrap();
    config.set(keys::API_KEY, "stale-key").unwrap();
    config.set(keys::API_PATH, "https://studio.example.com/api").unwrap();

    let studio = MockStudio::new();
    studio.reject_credentials_times(1);
    let factory_studio = studio.clone();
    let prompter = ScriptedPrompter::new([
        "y",
        "fresh",
        "fresh-key",
        "https://studio.example.com/api",
    ]);

    let session = Session::connect_with(config, Box::new(prompter), move |_| {
        Ok(Box::new(factory_studio.clone()) as Box<dyn StudioApi>)
    })
    .unwrap();

    assert_eq!(session.config.get(keys::USERNAME), Some("fresh"));
    assert_eq!(
        studio.journal(),
        vec!["check_credentials", "check_credentials"]
    );
}

#[test]
fn declining_the_credential_retry_aborts() {
    let work = TempDir::new().unwrap();
    let mut config = config_in(&work);
    config.set(keys::USERNAME, "stale").unwrap();
    config.set(keys::API_KEY, "stale-key").unwrap();
    config.set(keys::API_PATH, "https://studio.example.com/api").unwrap();

    let studio = MockStudio::new();
    studio.reject_credentials_times(1);
    let factory_studio = studio.clone();
    let prompter = ScriptedPrompter::new(["n"]);

    let result = Session::connect_with(config, Box::new(prompter), move |_| {
        Ok(Box::new(factory_studio.clone()) as Box<dyn StudioApi>)
    });
    assert!(matches!(result, Err(Error::Aborted(_))));
}

#[test]
fn a_broken_appliance_blocks_the_build_precondition() {
    let work = TempDir::new().unwrap();
    let config = config_in(&work);
    let target = appliance("a-1", "12.1");
    let studio = MockStudio::new()
        .with_appliance(target.clone())
        .with_status(broken_status(&["unresolved dependency: libfoo"]));
    let prompter = ScriptedPrompter::new(Vec::<String>::new());

    let session = Session::with_parts(config, Box::new(studio.clone()), Box::new(prompter));
    let err = session.verify_status(&target, true).unwrap_err();
    assert!(matches!(err, Error::ApplianceNotReady(_)));
    assert!(studio.mutations().is_empty());
}

#[test]
fn a_healthy_appliance_passes_the_build_precondition() {
    let work = TempDir::new().unwrap();
    let config = config_in(&work);
    let target = appliance("a-1", "12.1");
    let studio = MockStudio::new()
        .with_appliance(target.clone())
        .with_status(ok_status());
    let prompter = ScriptedPrompter::new(Vec::<String>::new());

    let session = Session::with_parts(config, Box::new(studio), Box::new(prompter));
    let status = session.verify_status(&target, true).unwrap();
    assert!(status.is_ok());
}

#[test]
fn the_tracked_appliance_is_fetched_fresh() {
    let work = TempDir::new().unwrap();
    let mut config = config_in(&work);
    config.set(keys::APPLIANCE_ID, "a-1").unwrap();
    let studio = MockStudio::new().with_appliance(appliance("a-1", "12.1"));
    let prompter = ScriptedPrompter::new(Vec::<String>::new());

    let session = Session::with_parts(config, Box::new(studio), Box::new(prompter));
    let fetched = session.appliance().unwrap();
    assert_eq!(fetched.id, "a-1");
    assert_eq!(fetched.basesystem, "12.1");
}

#[test]
fn a_vanished_appliance_is_an_error_not_a_panic() {
    let work = TempDir::new().unwrap();
    let mut config = config_in(&work);
    config.set(keys::APPLIANCE_ID, "a-gone").unwrap();
    let studio = MockStudio::new().with_appliance(appliance("a-1", "12.1"));
    let prompter = ScriptedPrompter::new(Vec::<String>::new());

    let session = Session::with_parts(config, Box::new(studio), Box::new(prompter));
    assert!(matches!(
        session.appliance(),
        Err(Error::NotFoundError(_))
    ));
}

#[test]
fn an_untracked_directory_refuses_appliance_commands() {
    let work = TempDir::new().unwrap();
    let config = config_in(&work);
    let studio = MockStudio::new();
    let prompter = ScriptedPrompter::new(Vec::<String>::new());

    let session = Session::with_parts(config, Box::new(studio), Box::new(prompter));
    assert!(matches!(
        session.appliance_id(),
        Err(Error::ConfigError(_))
    ));
}
