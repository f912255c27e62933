//! Package identity and artefact naming.
//!
//! Resolves the raw project identifiers into their normalised forms, warns
//! about every substitution, and assembles the artefact filename
//! `<name>_<version>-<iteration>_<arch>.tar.gz`.

use crate::project::ProjectDescriptor;
use log::warn;
use omnibus_docker_common::{
    Architecture, ImageTag, Normalised, PlatformInfo, normalise_package_name, normalise_version,
};
use serde::Serialize;
use std::fmt;

/// The fixed file extension for artefact archives.
pub const ARTEFACT_EXTENSION: &str = ".tar.gz";

/// Log target for normalisation warnings.
pub const NORMALISATION_LOG_TARGET: &str = "omnibus_docker::normalise";

/// Normalised identifiers for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    name: String,
    version: String,
    iteration: String,
    architecture: Architecture,
}

impl PackageIdentity {
    /// Normalise the project's identifiers for the given host.
    ///
    /// Emits one warning per normalisation pass that altered its input. The
    /// iteration is passed through unmodified.
    #[must_use]
    pub fn resolve(project: &ProjectDescriptor, platform: &PlatformInfo) -> Self {
        let name = normalise_package_name(&project.package_name);
        report(&name);

        let version = normalise_version(&project.build_version);
        version.passes().for_each(report);

        Self {
            name: name.into_value(),
            version: version.into_value(),
            iteration: project.build_iteration.clone(),
            architecture: platform.architecture(),
        }
    }

    /// Normalised package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalised version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Build iteration, as supplied.
    #[must_use]
    pub fn iteration(&self) -> &str {
        &self.iteration
    }

    /// Target architecture.
    #[must_use]
    pub const fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// The artefact filename for this identity.
    #[must_use]
    pub fn artefact_name(&self) -> ArtefactName {
        ArtefactName::new(self)
    }

    /// Image reference derived from the package name and version.
    #[must_use]
    pub fn image_tag(&self) -> ImageTag {
        ImageTag::for_package(&self.name, &self.version)
    }
}

/// Emit the warning for a normalisation pass that changed its input.
fn report(result: &Normalised) {
    if let Some(rule) = result.rule() {
        warn!(
            target: NORMALISATION_LOG_TARGET,
            "{field} `{original}` converted to `{converted}`: {rule}",
            field = result.field(),
            original = result.original(),
            converted = result.value(),
        );
    }
}

/// A fully-qualified artefact archive name.
///
/// # Examples
///
/// ```
/// use omnibus_docker_common::PlatformInfo;
/// use omnibus_docker_packager::naming::PackageIdentity;
/// use omnibus_docker_packager::project::ProjectDescriptor;
///
/// let project = ProjectDescriptor {
///     package_name: "myapp".to_owned(),
///     build_version: "1.2.3".to_owned(),
///     build_iteration: "1".to_owned(),
///     install_dir: "/opt/myapp".into(),
///     extra_files: Vec::new(),
/// };
/// let identity = PackageIdentity::resolve(&project, &PlatformInfo::new("x86_64", "ubuntu"));
/// assert_eq!(identity.artefact_name().filename(), "myapp_1.2.3-1_amd64.tar.gz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct ArtefactName {
    name: String,
    version: String,
    iteration: String,
    architecture: String,
}

impl ArtefactName {
    /// Build an artefact name from a resolved identity.
    #[must_use]
    pub fn new(identity: &PackageIdentity) -> Self {
        Self {
            name: identity.name.clone(),
            version: identity.version.clone(),
            iteration: identity.iteration.clone(),
            architecture: identity.architecture.to_string(),
        }
    }

    /// Return the filename as a string without consuming the value.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArtefactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}-{}_{}{ARTEFACT_EXTENSION}",
            self.name, self.version, self.iteration, self.architecture
        )
    }
}

impl From<ArtefactName> for String {
    fn from(name: ArtefactName) -> Self {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn project() -> ProjectDescriptor {
        ProjectDescriptor {
            package_name: "myapp".to_owned(),
            build_version: "1.2.3".to_owned(),
            build_iteration: "1".to_owned(),
            install_dir: "/opt/myapp".into(),
            extra_files: Vec::new(),
        }
    }

    #[fixture]
    fn x86_64() -> PlatformInfo {
        PlatformInfo::new("x86_64", "ubuntu")
    }

    #[rstest]
    fn filename_matches_documented_format(project: ProjectDescriptor, x86_64: PlatformInfo) {
        let identity = PackageIdentity::resolve(&project, &x86_64);
        assert_eq!(
            identity.artefact_name().filename(),
            "myapp_1.2.3-1_amd64.tar.gz"
        );
    }

    #[rstest]
    fn identifiers_are_normalised(mut project: ProjectDescriptor, x86_64: PlatformInfo) {
        project.package_name = "My_Cool_App!!".to_owned();
        project.build_version = "12.0.0-rc.6".to_owned();

        let identity = PackageIdentity::resolve(&project, &x86_64);

        assert_eq!(
            identity.artefact_name().to_string(),
            "my-cool-app-_12.0.0~rc.6-1_amd64.tar.gz"
        );
    }

    #[rstest]
    fn iteration_is_passed_through(mut project: ProjectDescriptor, x86_64: PlatformInfo) {
        project.build_iteration = "1 beta/2".to_owned();
        let identity = PackageIdentity::resolve(&project, &x86_64);
        assert_eq!(identity.iteration(), "1 beta/2");
        assert!(identity.artefact_name().filename().contains("-1 beta/2_"));
    }

    #[rstest]
    #[case::raspbian("armv6l", "raspbian", "armhf")]
    #[case::ubuntu_arm("armv6l", "ubuntu", "armv6l")]
    #[case::ppc("ppc64", "rhel", "ppc64")]
    fn architecture_lands_in_filename(
        project: ProjectDescriptor,
        #[case] machine: &str,
        #[case] platform: &str,
        #[case] arch: &str,
    ) {
        let identity = PackageIdentity::resolve(&project, &PlatformInfo::new(machine, platform));
        assert!(
            identity
                .artefact_name()
                .filename()
                .ends_with(&format!("_{arch}.tar.gz"))
        );
    }

    #[rstest]
    fn name_reflects_current_descriptor(mut project: ProjectDescriptor, x86_64: PlatformInfo) {
        let before = PackageIdentity::resolve(&project, &x86_64).artefact_name();
        project.build_iteration = "2".to_owned();
        let after = PackageIdentity::resolve(&project, &x86_64).artefact_name();
        assert_ne!(before, after);
        assert_eq!(after.filename(), "myapp_1.2.3-2_amd64.tar.gz");
    }

    #[rstest]
    fn image_tag_follows_identity(mut project: ProjectDescriptor, x86_64: PlatformInfo) {
        project.build_version = "1.0-rc1".to_owned();
        let identity = PackageIdentity::resolve(&project, &x86_64);
        assert_eq!(identity.image_tag().as_str(), "myapp:1.0_rc1");
    }
}
