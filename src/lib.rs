// src/lib.rs

//! atelier - command-line client for a remote appliance build service
//!
//! The crate drives the whole appliance lifecycle from a project
//! directory: create an appliance from a template, shape its package
//! list, run builds and fetch the verified images.
//!
//! - [`config`]: layered global/local configuration store
//! - [`api`]: the build service contract and its HTTP client
//! - [`resolver`]: template matching and package/repository resolution
//! - [`build`]: submission, conflict negotiation and state polling
//! - [`download`]: artifact selection, transfer and verification
//! - [`session`]: credential bootstrap tying the pieces together
//! - [`prompt`]: operator interaction behind a testable trait

pub mod api;
pub mod build;
pub mod config;
pub mod download;
mod error;
pub mod hash;
pub mod model;
pub mod progress;
pub mod prompt;
pub mod resolver;
pub mod session;

pub use error::{Error, Result};
