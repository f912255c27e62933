//! Omnibus Docker packager library.
//!
//! This crate stages an omnibus project's install tree, renders a Dockerfile
//! describing it, and runs the image tool under fakeroot to produce a
//! `<name>_<version>-<iteration>_<arch>.tar.gz` artefact. It is used by the
//! `omnibus-docker` CLI binary and can be driven programmatically.
//!
//! # Modules
//!
//! - [`builder`] - Image build command assembly and execution
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Package metadata and tool configuration
//! - [`descriptor`] - Dockerfile rendering
//! - [`error`] - Error types
//! - [`executor`] - External command seam
//! - [`naming`] - Identifier normalisation and artefact naming
//! - [`output`] - Dry-run and progress formatting
//! - [`pipeline`] - Packaging state machine
//! - [`platform`] - Host platform detection
//! - [`project`] - Project descriptor loading
//! - [`stager`] - File staging

pub mod builder;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod project;
pub mod stager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
