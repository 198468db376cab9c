// src/progress.rs

//! Progress reporting for remote calls, builds and downloads
//!
//! Every long-running step shows something: one-shot remote calls get a
//! spinner, running builds a percent bar, artifact transfers a byte bar.
//! Bars render to stderr and disappear cleanly on non-terminals.

use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Tick interval for spinners attached to remote calls.
const SPINNER_TICK: Duration = Duration::from_millis(120);

/// Spinner for a one-shot remote call of unknown duration.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(SPINNER_TICK);
    pb
}

/// Run a closure under a spinner.
///
/// The spinner is stopped on both the success and the error path before
/// the result is handed back.
pub fn with_spinner<T>(message: &str, call: impl FnOnce() -> Result<T>) -> Result<T> {
    let pb = spinner(message);
    let result = call();
    match &result {
        Ok(_) => pb.finish_with_message(format!("{message} [done]")),
        Err(_) => pb.abandon_with_message(format!("{message} [failed]")),
    }
    result
}

/// Byte-styled bar for one artifact transfer.
pub fn download_bar(size: u64, name: &str) -> ProgressBar {
    let pb = ProgressBar::new(size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(name.to_string());
    pb
}

/// Percent bar for a running build.
pub fn build_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}%")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Render a byte count the way an operator reads it.
pub fn human_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

    let size = bytes as f64;
    if size < KIB {
        format!("{bytes} B")
    } else if size < MIB {
        format!("{:.1} KB", size / KIB)
    } else if size < GIB {
        format!("{:.1} MB", size / MIB)
    } else {
        format!("{:.1} GB", size / GIB)
    }
}
