// src/commands/download.rs

//! Download the artifacts of finished builds.

use anyhow::Result;
use atelier::download::{Downloader, HttpFetcher};
use atelier::model::{Build, BuildState};
use atelier::progress;

use super::connect;

pub fn cmd_download(dir: &str) -> Result<()> {
    let session = connect()?;
    let appliance = session.appliance()?;
    let builds = progress::with_spinner("Fetching builds", || {
        session.api.list_builds(&appliance.id)
    })?;
    let finished: Vec<Build> = builds
        .into_iter()
        .filter(|b| b.state == BuildState::Finished && b.download_url.is_some())
        .collect();

    let fetcher = HttpFetcher::new()?;
    let downloader = Downloader::new(&fetcher, session.prompter.as_ref(), dir);
    let selected = downloader.select(&finished)?;
    if selected.is_empty() {
        return Ok(());
    }

    let fetched = downloader.download_all(&selected)?;
    for path in &fetched {
        println!("Downloaded {}", path.display());
    }
    Ok(())
}
