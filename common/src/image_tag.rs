//! Image references for the intermediate build image.
//!
//! The image is tagged after the package it produces, so concurrent builds of
//! different packages never overwrite each other's image. Package names and
//! versions are re-normalised into the narrower reference grammar of the image
//! tool: `+` and `~` are legal in package versions but not in image tags.

use crate::grammar::{IMAGE_REPOSITORY, IMAGE_TAG};
use std::fmt;
use thiserror::Error;

/// Maximum length of the tag component of an image reference.
pub const MAX_TAG_LENGTH: usize = 128;

const FALLBACK_REPOSITORY: &str = "unnamed";
const FALLBACK_TAG: &str = "latest";

/// Errors raised when validating an explicitly configured image tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageTagError {
    /// The configured tag was empty.
    #[error("image tag must not be empty")]
    Empty,

    /// The configured tag contained whitespace, which the image tool rejects.
    #[error("image tag \"{value}\" must not contain whitespace")]
    Whitespace {
        /// The rejected tag.
        value: String,
    },
}

/// A fully formed `<repository>:<tag>` image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageTag(String);

impl ImageTag {
    /// Derive an image reference from a normalised package name and version.
    ///
    /// # Examples
    ///
    /// ```
    /// use omnibus_docker_common::image_tag::ImageTag;
    ///
    /// let tag = ImageTag::for_package("myapp", "12.0.0~rc.6");
    /// assert_eq!(tag.as_str(), "myapp:12.0.0_rc.6");
    /// ```
    #[must_use]
    pub fn for_package(name: &str, version: &str) -> Self {
        Self(format!(
            "{}:{}",
            repository_component(name),
            tag_component(version)
        ))
    }

    /// Accept an explicitly configured image reference.
    ///
    /// # Errors
    ///
    /// Returns [`ImageTagError`] if the value is empty or contains whitespace.
    pub fn literal(value: &str) -> Result<Self, ImageTagError> {
        if value.is_empty() {
            return Err(ImageTagError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ImageTagError::Whitespace {
                value: value.to_owned(),
            });
        }
        Ok(Self(value.to_owned()))
    }

    /// The reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Collapse `name` into one reference path component.
///
/// Components start and end with an alphanumeric, and alphanumeric runs are
/// joined by `.`, `_`, `__` or one or more `-`. Any other separator run is
/// reduced to its first character.
fn repository_component(name: &str) -> String {
    let collapsed = IMAGE_REPOSITORY.collapse(&name.to_lowercase());
    let mut component = String::with_capacity(collapsed.len());
    let mut separators = String::new();

    for c in collapsed.chars() {
        if c.is_ascii_alphanumeric() {
            if !component.is_empty() {
                component.push_str(joining_separator(&separators));
            }
            separators.clear();
            component.push(c);
        } else {
            separators.push(c);
        }
    }

    if component.is_empty() {
        FALLBACK_REPOSITORY.to_owned()
    } else {
        component
    }
}

fn joining_separator(run: &str) -> &str {
    if matches!(run, "." | "_" | "__") || run.chars().all(|c| c == '-') {
        run
    } else {
        run.get(..1).unwrap_or_default()
    }
}

fn tag_component(version: &str) -> String {
    let mut tag = IMAGE_TAG.collapse(version);
    if tag.starts_with(['.', '-']) {
        tag.insert(0, '_');
    }
    if tag.is_empty() {
        return FALLBACK_TAG.to_owned();
    }
    // The tag grammar is ASCII-only, so truncating on a byte index is safe.
    tag.truncate(MAX_TAG_LENGTH);
    tag
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
