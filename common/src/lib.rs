//! Identifier normalisation for the omnibus Docker packager.
//!
//! Package names, versions and host architectures arrive from the surrounding
//! build system in whatever form the project chose. The functions here map
//! them onto the strict vocabularies used in package filenames and image
//! references. Normalisation always succeeds; results record whether the
//! input was altered so callers can warn about silent renames.
//!
//! # Modules
//!
//! - [`grammar`] - Allow-list grammars and run-collapsing substitution
//! - [`normalise`] - Package-name and version normalisation
//! - [`architecture`] - Typed host architecture table
//! - [`image_tag`] - Image references derived from package identity

pub mod architecture;
pub mod grammar;
pub mod image_tag;
pub mod normalise;

pub use architecture::{Architecture, CpuFamily, PlatformFamily, PlatformInfo};
pub use grammar::Grammar;
pub use image_tag::{ImageTag, ImageTagError};
pub use normalise::{
    Field, Normalised, Rule, VersionNormalisation, normalise_package_name, normalise_version,
};
