// src/error.rs

//! Error types for the atelier client
//!
//! One crate-level [`Error`] enum with a [`Result`] alias. Remote failures
//! keep the service-reported reason in the message so the operator can act
//! on it without digging through logs.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Client construction failed before any remote call was made.
    #[error("initialization error: {0}")]
    InitError(String),

    /// A persisted configuration layer is unreadable or malformed.
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// I/O failure with added path context.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The build service rejected the supplied credentials.
    #[error("the build service rejected the supplied credentials")]
    Unauthorized,

    /// The build service answered with an error status.
    #[error("service error: {0}")]
    ApiError(String),

    /// A response body could not be decoded.
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("not found: {0}")]
    NotFoundError(String),

    /// An image with this version already exists for the appliance.
    #[error("an image with version {version} already exists")]
    VersionConflict { version: String },

    /// The appliance reports unresolved issues that block a build.
    #[error("appliance not ready: {0}")]
    ApplianceNotReady(String),

    #[error("download failed: {0}")]
    DownloadError(String),

    /// Downloaded bytes do not match the published checksum.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// The operator walked away from a prompt or ran out of answers.
    #[error("aborted: {0}")]
    Aborted(String),
}
