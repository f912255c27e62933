//! Project descriptor supplied by the surrounding build system.
//!
//! The descriptor is read once from a TOML manifest and treated as immutable
//! for the rest of the build.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Deserializer};
use std::fs;

/// Identity and layout of the project being packaged.
///
/// # Examples
///
/// ```
/// use omnibus_docker_packager::project::ProjectDescriptor;
///
/// let project = ProjectDescriptor::from_toml_str(
///     r#"
///     package_name = "myapp"
///     build_version = "1.2.3"
///     build_iteration = 1
///     install_dir = "/opt/myapp"
///     "#,
///     "project.toml",
/// )?;
/// assert_eq!(project.build_iteration, "1");
/// # Ok::<(), omnibus_docker_packager::error::PackagerError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDescriptor {
    /// Raw package name, normalised before use.
    pub package_name: String,
    /// Raw build version, normalised before use.
    pub build_version: String,
    /// Build iteration, passed through unmodified.
    #[serde(deserialize_with = "string_or_integer")]
    pub build_iteration: String,
    /// Directory the project installs into.
    pub install_dir: Utf8PathBuf,
    /// Additional files to include in the staged tree.
    #[serde(default)]
    pub extra_files: Vec<Utf8PathBuf>,
}

impl ProjectDescriptor {
    /// Load a project descriptor from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigRead`] if the file cannot be read, or
    /// any error from [`ProjectDescriptor::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| PackagerError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&source, path.as_str())
    }

    /// Parse and validate a project descriptor from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidConfig`] if the TOML is malformed or
    /// missing required keys, and [`PackagerError::InvalidValue`] if a
    /// required identifier is empty.
    pub fn from_toml_str(source: &str, origin: &str) -> Result<Self> {
        let project: Self = toml::from_str(source).map_err(|e| PackagerError::InvalidConfig {
            origin: origin.to_owned(),
            reason: e.message().to_owned(),
        })?;
        project.validate()?;
        Ok(project)
    }

    /// Reject descriptors whose identifiers would produce malformed names.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidValue`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("package_name", self.package_name.as_str()),
            ("build_version", self.build_version.as_str()),
            ("build_iteration", self.build_iteration.as_str()),
            ("install_dir", self.install_dir.as_str()),
        ];

        match fields.into_iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(PackagerError::InvalidValue {
                field: field.to_owned(),
                expected: "a non-empty string",
                found: "an empty string".to_owned(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Iteration {
    Text(String),
    Number(u64),
}

fn string_or_integer<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Iteration::deserialize(deserializer)? {
        Iteration::Text(text) => text,
        Iteration::Number(number) => number.to_string(),
    })
}
