//! Packager configuration.
//!
//! Package metadata (vendor, license, priority, section) and the build tool
//! settings are gathered into one [`PackagerConfig`] constructed per build and
//! passed by reference into the pipeline. Defaults are plain constants; there
//! is no shared mutable state between builds.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::warn;
use std::fmt;
use std::fs;

/// Default package vendor.
pub const DEFAULT_VENDOR: &str = "Omnibus <omnibus@getchef.com>";
/// Default package license.
pub const DEFAULT_LICENSE: &str = "unknown";
/// Default package priority.
pub const DEFAULT_PRIORITY: &str = "extra";
/// Default package section.
pub const DEFAULT_SECTION: &str = "misc";
/// Default image build tool.
pub const DEFAULT_IMAGE_TOOL: &str = "docker";
/// Default privilege wrapper.
pub const DEFAULT_PRIVILEGE_WRAPPER: &str = "fakeroot";

const EXPECTED_STRING: &str = "a string";

/// The metadata settings exposed to projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    /// Package vendor / maintainer.
    Vendor,
    /// Package license.
    License,
    /// Package priority.
    Priority,
    /// Package section.
    Section,
}

impl MetadataField {
    /// All metadata fields in declaration order.
    pub const ALL: [Self; 4] = [Self::Vendor, Self::License, Self::Priority, Self::Section];

    /// The configuration key for this field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::License => "license",
            Self::Priority => "priority",
            Self::Section => "section",
        }
    }

    /// Look up a field by configuration key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Descriptive package metadata written into the build descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    vendor: String,
    license: String,
    priority: String,
    section: String,
}

impl Default for PackageMetadata {
    fn default() -> Self {
        Self {
            vendor: DEFAULT_VENDOR.to_owned(),
            license: DEFAULT_LICENSE.to_owned(),
            priority: DEFAULT_PRIORITY.to_owned(),
            section: DEFAULT_SECTION.to_owned(),
        }
    }
}

impl PackageMetadata {
    /// The package vendor.
    #[must_use]
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// The package license.
    #[must_use]
    pub fn license(&self) -> &str {
        &self.license
    }

    /// The package priority.
    #[must_use]
    pub fn priority(&self) -> &str {
        &self.priority
    }

    /// The package section.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Return the value of `field`.
    #[must_use]
    pub fn get(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Vendor => &self.vendor,
            MetadataField::License => &self.license,
            MetadataField::Priority => &self.priority,
            MetadataField::Section => &self.section,
        }
    }

    /// Replace the value of `field` with an already-typed string.
    pub fn set_str(&mut self, field: MetadataField, value: impl Into<String>) {
        let slot = match field {
            MetadataField::Vendor => &mut self.vendor,
            MetadataField::License => &mut self.license,
            MetadataField::Priority => &mut self.priority,
            MetadataField::Section => &mut self.section,
        };
        *slot = value.into();
    }

    /// Replace the value of `field` from an untyped configuration value.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidValue`] if `value` is not a string.
    pub fn set(&mut self, field: MetadataField, value: &toml::Value) -> Result<()> {
        let text = expect_string(field.key(), value)?;
        self.set_str(field, text);
        Ok(())
    }
}

/// Complete configuration for one packaging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagerConfig {
    /// Descriptive package metadata.
    pub metadata: PackageMetadata,
    /// Image build tool invoked under the privilege wrapper.
    pub image_tool: String,
    /// Wrapper that normalises file ownership in the produced artefact.
    pub privilege_wrapper: String,
    /// Explicit image reference; derived from the package identity when unset.
    pub image_tag: Option<String>,
    /// Descriptor template; the bundled template is used when unset.
    pub template: Option<Utf8PathBuf>,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            metadata: PackageMetadata::default(),
            image_tool: DEFAULT_IMAGE_TOOL.to_owned(),
            privilege_wrapper: DEFAULT_PRIVILEGE_WRAPPER.to_owned(),
            image_tag: None,
            template: None,
        }
    }
}

impl PackagerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigRead`] if the file cannot be read, or
    /// any error from [`PackagerConfig::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| PackagerError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&source, path.as_str())
    }

    /// Parse configuration from TOML source.
    ///
    /// Recognised keys must hold strings. Unknown keys are ignored with a
    /// warning so that newer configuration files still load.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidConfig`] for malformed TOML and
    /// [`PackagerError::InvalidValue`] for non-string values.
    ///
    /// # Examples
    ///
    /// ```
    /// use omnibus_docker_packager::config::PackagerConfig;
    ///
    /// let config = PackagerConfig::from_toml_str("license = \"Apache-2.0\"", "inline")?;
    /// assert_eq!(config.metadata.license(), "Apache-2.0");
    /// assert_eq!(config.metadata.section(), "misc");
    /// # Ok::<(), omnibus_docker_packager::error::PackagerError>(())
    /// ```
    pub fn from_toml_str(source: &str, origin: &str) -> Result<Self> {
        let table: toml::Table = source.parse().map_err(|e: toml::de::Error| {
            PackagerError::InvalidConfig {
                origin: origin.to_owned(),
                reason: e.message().to_owned(),
            }
        })?;

        let mut config = Self::default();
        for (key, value) in &table {
            config.apply(key, value, origin)?;
        }
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &toml::Value, origin: &str) -> Result<()> {
        if let Some(field) = MetadataField::from_key(key) {
            return self.metadata.set(field, value);
        }

        match key {
            "image_tool" => self.image_tool = non_empty_string(key, value)?,
            "privilege_wrapper" => self.privilege_wrapper = non_empty_string(key, value)?,
            "image_tag" => self.image_tag = Some(non_empty_string(key, value)?),
            "template" => self.template = Some(Utf8PathBuf::from(non_empty_string(key, value)?)),
            unknown => warn!("ignoring unknown setting `{unknown}` in {origin}"),
        }
        Ok(())
    }
}

fn expect_string<'a>(field: &str, value: &'a toml::Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| PackagerError::InvalidValue {
        field: field.to_owned(),
        expected: EXPECTED_STRING,
        found: value.type_str().to_owned(),
    })
}

fn non_empty_string(field: &str, value: &toml::Value) -> Result<String> {
    let text = expect_string(field, value)?;
    if text.is_empty() {
        return Err(PackagerError::InvalidValue {
            field: field.to_owned(),
            expected: "a non-empty string",
            found: "an empty string".to_owned(),
        });
    }
    Ok(text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_documented_values() {
        let config = PackagerConfig::default();
        assert_eq!(config.metadata.vendor(), "Omnibus <omnibus@getchef.com>");
        assert_eq!(config.metadata.license(), "unknown");
        assert_eq!(config.metadata.priority(), "extra");
        assert_eq!(config.metadata.section(), "misc");
        assert_eq!(config.image_tool, "docker");
        assert_eq!(config.privilege_wrapper, "fakeroot");
        assert!(config.image_tag.is_none());
        assert!(config.template.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let source = concat!(
            "vendor = \"Example <ops@example.com>\"\n",
            "priority = \"optional\"\n",
            "image_tool = \"podman\"\n",
            "template = \"recipes/Dockerfile.tera\"\n",
        );
        let config = PackagerConfig::from_toml_str(source, "test").expect("valid config");
        assert_eq!(config.metadata.vendor(), "Example <ops@example.com>");
        assert_eq!(config.metadata.priority(), "optional");
        assert_eq!(config.metadata.license(), "unknown");
        assert_eq!(config.image_tool, "podman");
        assert_eq!(
            config.template,
            Some(Utf8PathBuf::from("recipes/Dockerfile.tera"))
        );
    }

    #[rstest]
    #[case::integer("vendor = 42", "vendor", "integer")]
    #[case::boolean("license = true", "license", "boolean")]
    #[case::array("priority = [\"a\"]", "priority", "array")]
    #[case::table("section = { name = \"x\" }", "section", "table")]
    fn non_string_metadata_is_rejected(
        #[case] source: &str,
        #[case] field: &str,
        #[case] found: &str,
    ) {
        let err = PackagerConfig::from_toml_str(source, "test").expect_err("should fail");
        assert!(
            matches!(
                &err,
                PackagerError::InvalidValue { field: f, found: t, .. } if f == field && t == found
            ),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn empty_image_tool_is_rejected() {
        let err = PackagerConfig::from_toml_str("image_tool = \"\"", "test").expect_err("fails");
        assert!(matches!(err, PackagerError::InvalidValue { .. }));
    }

    #[test]
    fn malformed_toml_reports_origin() {
        let err = PackagerConfig::from_toml_str("vendor = ", "omnibus-docker.toml")
            .expect_err("should fail");
        assert!(err.to_string().contains("omnibus-docker.toml"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = PackagerConfig::from_toml_str("maintainer_email = \"x\"", "test")
            .expect("unknown keys tolerated");
        assert_eq!(config, PackagerConfig::default());
    }

    #[test]
    fn set_accepts_strings_only() {
        let mut metadata = PackageMetadata::default();
        metadata
            .set(MetadataField::Section, &toml::Value::String("utils".to_owned()))
            .expect("string accepted");
        assert_eq!(metadata.get(MetadataField::Section), "utils");

        let err = metadata
            .set(MetadataField::Section, &toml::Value::Float(1.5))
            .expect_err("float rejected");
        assert!(err.to_string().contains("section"));
        assert_eq!(metadata.section(), "utils");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PackagerConfig::load(Utf8Path::new("/nonexistent/omnibus-docker.toml"))
            .expect_err("should fail");
        assert!(matches!(err, PackagerError::ConfigRead { .. }));
    }
}
