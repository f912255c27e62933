//! Image build orchestration.
//!
//! The artefact is produced by running the image tool under the privilege
//! wrapper from the output directory, with stdout redirected into the
//! artefact file:
//!
//! ```text
//! fakeroot docker build -t <tag> <staging>/Dockerfile > <artefact>
//! ```

use crate::config::PackagerConfig;
use crate::descriptor::DESCRIPTOR_FILENAME;
use crate::error::{PackagerError, Result};
use crate::executor::{CommandExecutor, Invocation};
use crate::naming::ArtefactName;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use omnibus_docker_common::ImageTag;

/// Builds the artefact through a [`CommandExecutor`].
pub struct ArtefactBuilder<'a> {
    executor: &'a dyn CommandExecutor,
    image_tool: &'a str,
    privilege_wrapper: &'a str,
}

impl<'a> ArtefactBuilder<'a> {
    /// Create a builder using the tools named in `config`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, config: &'a PackagerConfig) -> Self {
        Self {
            executor,
            image_tool: &config.image_tool,
            privilege_wrapper: &config.privilege_wrapper,
        }
    }

    /// Assemble the build command without running it.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use omnibus_docker_common::{ImageTag, PlatformInfo};
    /// use omnibus_docker_packager::builder::ArtefactBuilder;
    /// use omnibus_docker_packager::config::PackagerConfig;
    /// use omnibus_docker_packager::executor::SystemCommandExecutor;
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
    /// let config = PackagerConfig::default();
    /// let builder = ArtefactBuilder::new(&SystemCommandExecutor, &config);
    ///
    /// let invocation = builder.invocation(
    ///     Utf8Path::new("/stage"),
    ///     Utf8Path::new("/pkg"),
    ///     &identity.artefact_name(),
    ///     &identity.image_tag(),
    /// );
    /// assert_eq!(
    ///     invocation.command_line(),
    ///     "fakeroot docker build -t myapp:1.2.3 /stage/Dockerfile > myapp_1.2.3-1_amd64.tar.gz",
    /// );
    /// ```
    #[must_use]
    pub fn invocation(
        &self,
        staging_root: &Utf8Path,
        output_dir: &Utf8Path,
        artefact: &ArtefactName,
        tag: &ImageTag,
    ) -> Invocation {
        let descriptor = staging_root.join(DESCRIPTOR_FILENAME);
        let args = vec![
            self.image_tool.to_owned(),
            "build".to_owned(),
            "-t".to_owned(),
            tag.to_string(),
            descriptor.into_string(),
        ];
        Invocation::new(self.privilege_wrapper, args, output_dir, artefact.filename())
    }

    /// Run the build and return the path of the produced artefact.
    ///
    /// The call blocks until the tool exits. A partially written artefact is
    /// left in place on failure.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Spawn`] if the tool cannot be started and
    /// [`PackagerError::BuildFailed`] if it exits with a non-zero status.
    pub fn build(&self, invocation: &Invocation) -> Result<Utf8PathBuf> {
        let command = invocation.command_line();
        info!("building artefact in {}", invocation.current_dir());
        debug!("running `{command}`");

        let output = self.executor.run_redirected(invocation)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PackagerError::BuildFailed {
                command,
                status: output.status.to_string(),
                output: stderr.trim_end().to_owned(),
            });
        }

        Ok(invocation.stdout_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MockCommandExecutor;
    use crate::naming::PackageIdentity;
    use crate::project::ProjectDescriptor;
    use crate::test_utils::{failure_output, success_output};
    use omnibus_docker_common::PlatformInfo;
    use rstest::{fixture, rstest};

    #[fixture]
    fn identity() -> PackageIdentity {
        let project = ProjectDescriptor {
            package_name: "myapp".to_owned(),
            build_version: "1.2.3".to_owned(),
            build_iteration: "1".to_owned(),
            install_dir: "/opt/myapp".into(),
            extra_files: Vec::new(),
        };
        PackageIdentity::resolve(&project, &PlatformInfo::new("x86_64", "ubuntu"))
    }

    fn invocation_for(
        builder: &ArtefactBuilder<'_>,
        identity: &PackageIdentity,
    ) -> Invocation {
        builder.invocation(
            Utf8Path::new("/stage"),
            Utf8Path::new("/pkg"),
            &identity.artefact_name(),
            &identity.image_tag(),
        )
    }

    #[rstest]
    fn invocation_runs_from_output_dir(identity: PackageIdentity) {
        let executor = MockCommandExecutor::new();
        let config = PackagerConfig::default();
        let builder = ArtefactBuilder::new(&executor, &config);

        let invocation = invocation_for(&builder, &identity);

        assert_eq!(invocation.program(), "fakeroot");
        assert_eq!(
            invocation.args(),
            ["docker", "build", "-t", "myapp:1.2.3", "/stage/Dockerfile"]
        );
        assert_eq!(invocation.current_dir(), Utf8Path::new("/pkg"));
        assert_eq!(invocation.stdout_file(), "myapp_1.2.3-1_amd64.tar.gz");
    }

    #[rstest]
    fn configured_tools_are_used(identity: PackageIdentity) {
        let executor = MockCommandExecutor::new();
        let config = PackagerConfig {
            image_tool: "podman".to_owned(),
            privilege_wrapper: "sudo".to_owned(),
            ..PackagerConfig::default()
        };
        let builder = ArtefactBuilder::new(&executor, &config);

        let invocation = invocation_for(&builder, &identity);

        assert!(invocation.command_line().starts_with("sudo podman build -t "));
    }

    #[rstest]
    fn successful_build_returns_artefact_path(identity: PackageIdentity) {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_redirected()
            .withf(|invocation| invocation.program() == "fakeroot")
            .times(1)
            .returning(|_| Ok(success_output()));
        let config = PackagerConfig::default();
        let builder = ArtefactBuilder::new(&executor, &config);

        let path = builder
            .build(&invocation_for(&builder, &identity))
            .expect("build succeeds");

        assert_eq!(path, Utf8PathBuf::from("/pkg/myapp_1.2.3-1_amd64.tar.gz"));
    }

    #[rstest]
    fn non_zero_exit_reports_command_and_stderr(identity: PackageIdentity) {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_redirected()
            .returning(|_| Ok(failure_output("Cannot connect to the Docker daemon\n")));
        let config = PackagerConfig::default();
        let builder = ArtefactBuilder::new(&executor, &config);

        let err = builder
            .build(&invocation_for(&builder, &identity))
            .expect_err("build fails");

        let message = err.to_string();
        assert!(matches!(err, PackagerError::BuildFailed { .. }));
        assert!(message.contains(
            "fakeroot docker build -t myapp:1.2.3 /stage/Dockerfile > myapp_1.2.3-1_amd64.tar.gz"
        ));
        assert!(message.contains("Cannot connect to the Docker daemon"));
    }

    #[rstest]
    fn spawn_errors_propagate(identity: PackageIdentity) {
        let mut executor = MockCommandExecutor::new();
        executor.expect_run_redirected().returning(|invocation| {
            Err(PackagerError::Spawn {
                command: invocation.command_line(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });
        let config = PackagerConfig::default();
        let builder = ArtefactBuilder::new(&executor, &config);

        let err = builder
            .build(&invocation_for(&builder, &identity))
            .expect_err("spawn fails");

        assert!(matches!(err, PackagerError::Spawn { .. }));
    }
}
