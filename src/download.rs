// src/download.rs

//! Artifact download and verification
//!
//! Finished builds publish a download URL, an expected size and a sha256
//! checksum. Selection asks the operator which artifacts to fetch, the
//! transfer streams to disk in fixed-size chunks behind a byte bar, and
//! every file is verified against its checksum before it counts as
//! downloaded. A checksum mismatch is fatal and aborts the rest of the
//! batch; nothing skips-and-continues silently.

use crate::error::{Error, Result};
use crate::hash;
use crate::model::{Build, DownloadTarget};
use crate::progress;
use crate::prompt::{MenuChoice, Prompter};
use indicatif::ProgressBar;
use reqwest::blocking::Client;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;
/// Connect timeout for artifact transfers
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Total timeout for one artifact transfer. Wider than the API timeout;
/// images run into gigabytes.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(3600);

/// Transfer seam: fetch one artifact to a local path.
pub trait ArtifactFetcher {
    /// Stream the artifact to `dest`, returning the byte count written.
    fn fetch(&self, target: &DownloadTarget, dest: &Path, bar: Option<&ProgressBar>)
    -> Result<u64>;
}

/// HTTP implementation of [`ArtifactFetcher`].
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TRANSFER_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch(
        &self,
        target: &DownloadTarget,
        dest: &Path,
        bar: Option<&ProgressBar>,
    ) -> Result<u64> {
        info!("Downloading {} to {}", target.url, dest.display());
        let response = self
            .client
            .get(&target.url)
            .send()
            .map_err(|e| Error::DownloadError(format!("failed to fetch {}: {e}", target.url)))?;
        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                target.url
            )));
        }

        let mut file = File::create(dest)
            .map_err(|e| Error::IoError(format!("failed to create {}: {e}", dest.display())))?;
        stream_to_file(response, &mut file, bar)
    }
}

/// Stream a response body to a file in fixed-size chunks.
fn stream_to_file(
    mut response: reqwest::blocking::Response,
    file: &mut File,
    bar: Option<&ProgressBar>,
) -> Result<u64> {
    let mut written: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];
    loop {
        let read = response
            .read(&mut buffer)
            .map_err(|e| Error::DownloadError(format!("failed to read response: {e}")))?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .map_err(|e| Error::IoError(format!("failed to write data: {e}")))?;
        written += read as u64;
        if let Some(bar) = bar {
            bar.set_position(written);
        }
    }
    Ok(written)
}

/// Batch downloader for the artifacts of finished builds.
pub struct Downloader<'a> {
    fetcher: &'a dyn ArtifactFetcher,
    prompter: &'a dyn Prompter,
    dest_dir: PathBuf,
    show_progress: bool,
}

impl<'a> Downloader<'a> {
    pub fn new(
        fetcher: &'a dyn ArtifactFetcher,
        prompter: &'a dyn Prompter,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            prompter,
            dest_dir: dest_dir.into(),
            show_progress: true,
        }
    }

    /// Disable the byte bars, for scripted runs.
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Ask which of the available artifacts to fetch.
    ///
    /// A single artifact is selected without asking. An empty list reports
    /// and selects nothing. Several artifacts become a numbered menu with
    /// an "all of them" entry and a "none of them" escape.
    pub fn select<'b>(&self, builds: &'b [Build]) -> Result<Vec<&'b Build>> {
        match builds.len() {
            0 => {
                println!("No builds available for download.");
                Ok(Vec::new())
            }
            1 => Ok(vec![&builds[0]]),
            _ => {
                let entries: Vec<String> = builds.iter().map(describe_build).collect();
                match self.prompter.ask_menu("Available builds:", &entries, true)? {
                    MenuChoice::Item(index) => Ok(vec![&builds[index]]),
                    MenuChoice::All => Ok(builds.iter().collect()),
                    MenuChoice::None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Download the selected artifacts in order, verifying each checksum.
    ///
    /// Returns the paths written so far. A declined overwrite ends the
    /// whole operation; a failed transfer or checksum mismatch aborts the
    /// remaining batch with an error.
    pub fn download_all(&self, selected: &[&Build]) -> Result<Vec<PathBuf>> {
        let mut fetched = Vec::new();
        for build in selected {
            let target = DownloadTarget::from_build(build).ok_or_else(|| {
                Error::DownloadError(format!("build {} has no downloadable artifact", build.id))
            })?;
            let dest = self.dest_dir.join(&target.filename);
            if dest.exists() {
                let question = format!("{} already exists. Overwrite?", target.filename);
                if !self.prompter.ask_yes_no(&question)? {
                    println!("Download cancelled.");
                    return Ok(fetched);
                }
            }
            self.fetch_one(&target, &dest)?;
            fetched.push(dest);
        }
        Ok(fetched)
    }

    fn fetch_one(&self, target: &DownloadTarget, dest: &Path) -> Result<()> {
        let bar = self
            .show_progress
            .then(|| progress::download_bar(target.size, &target.filename));
        let result = self.fetcher.fetch(target, dest, bar.as_ref());
        match &result {
            Ok(bytes) => {
                if let Some(bar) = &bar {
                    bar.finish_with_message(format!("{} [done]", target.filename));
                }
                info!("Downloaded {} bytes to {}", bytes, dest.display());
            }
            Err(e) => {
                if let Some(bar) = &bar {
                    bar.abandon_with_message(format!("{} [failed]", target.filename));
                }
                warn!("Download of {} failed: {}", target.url, e);
            }
        }
        result?;

        if let Err(e) = hash::verify_file_sha256(dest, &target.checksum) {
            // a file that failed verification must not stay on disk
            let _ = std::fs::remove_file(dest);
            return Err(Error::ChecksumMismatch {
                expected: e.expected,
                actual: e.actual,
            });
        }
        info!("Checksum verified for {}", dest.display());
        Ok(())
    }
}

fn describe_build(build: &Build) -> String {
    let version = build.version.as_deref().unwrap_or("-");
    match build.size {
        Some(size) => format!(
            "{} {} ({})",
            build.image_type,
            version,
            progress::human_size(size)
        ),
        None => format!("{} {}", build.image_type, version),
    }
}
