//! Packaging pipeline orchestration.
//!
//! Coordinates identity resolution, staging, descriptor rendering and the
//! image build. Each step either advances the [`BuildState`] or moves it to
//! [`BuildState::Failed`]; there are no retries.

use crate::builder::ArtefactBuilder;
use crate::config::PackagerConfig;
use crate::descriptor::{DESCRIPTOR_FILENAME, DescriptorContext, TemplateSource, render_descriptor};
use crate::error::Result;
use crate::executor::{CommandExecutor, Invocation};
use crate::naming::{ArtefactName, PackageIdentity};
use crate::project::ProjectDescriptor;
use crate::stager::{Stager, relative_to_root};
use camino::Utf8PathBuf;
use log::info;
use omnibus_docker_common::{ImageTag, PlatformInfo};
use serde::Serialize;
use std::fmt;
use std::fs;

/// Progress of a single packaging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    /// Nothing has been done yet.
    Pending,
    /// The install tree and extra files are in the staging directory.
    Staged,
    /// The descriptor has been written.
    DescriptorRendered,
    /// The image tool exited successfully.
    ArtefactBuilt,
    /// A step failed; the artefact must not be used.
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Staged => "staged",
            Self::DescriptorRendered => "descriptor rendered",
            Self::ArtefactBuilt => "artefact built",
            Self::Failed => "failed",
        })
    }
}

/// Inputs for one packaging run.
#[derive(Debug, Clone)]
pub struct PackageRequest {
    /// Project being packaged.
    pub project: ProjectDescriptor,
    /// Host the artefact targets.
    pub platform: PlatformInfo,
    /// Scratch directory holding the build context.
    pub staging_dir: Utf8PathBuf,
    /// Directory receiving the artefact.
    pub output_dir: Utf8PathBuf,
}

/// Everything a packaging run will do, computed without side effects.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// Artefact filename.
    pub artefact_name: ArtefactName,
    /// Image reference passed to the image tool.
    pub image_tag: String,
    /// Target architecture.
    pub architecture: String,
    /// Staging directory.
    pub staging_dir: Utf8PathBuf,
    /// Output directory.
    pub output_dir: Utf8PathBuf,
    /// Where the descriptor will be written.
    pub descriptor_path: Utf8PathBuf,
    /// Where the artefact will be written.
    pub artefact_path: Utf8PathBuf,
    /// Shell rendering of the build command.
    pub command_line: String,
    /// Extra files to stage.
    pub extra_files: Vec<Utf8PathBuf>,
    #[serde(skip)]
    identity: PackageIdentity,
    #[serde(skip)]
    invocation: Invocation,
}

impl BuildPlan {
    /// Normalised identity the plan was derived from.
    #[must_use]
    pub const fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    /// The build command.
    #[must_use]
    pub const fn invocation(&self) -> &Invocation {
        &self.invocation
    }
}

/// Result of a successful packaging run.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    /// The plan that was executed.
    pub plan: BuildPlan,
    /// Staged extra files, relative to the staging directory.
    pub staged_files: Vec<Utf8PathBuf>,
}

impl PackageOutcome {
    /// Path of the produced artefact.
    #[must_use]
    pub const fn artefact_path(&self) -> &Utf8PathBuf {
        &self.plan.artefact_path
    }
}

/// Drives a packaging run and tracks its [`BuildState`].
pub struct Packager<'a> {
    config: &'a PackagerConfig,
    executor: &'a dyn CommandExecutor,
    state: BuildState,
}

impl<'a> Packager<'a> {
    /// Create a packager in the [`BuildState::Pending`] state.
    #[must_use]
    pub const fn new(config: &'a PackagerConfig, executor: &'a dyn CommandExecutor) -> Self {
        Self {
            config,
            executor,
            state: BuildState::Pending,
        }
    }

    /// Current state of the most recent run.
    #[must_use]
    pub const fn state(&self) -> BuildState {
        self.state
    }

    /// Compute the artefact name, image tag and build command.
    ///
    /// Logs a warning for every identifier that normalisation altered.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PackagerError::ImageTag`] if a configured image
    /// tag is invalid.
    pub fn plan(&self, request: &PackageRequest) -> Result<BuildPlan> {
        let identity = PackageIdentity::resolve(&request.project, &request.platform);
        let artefact_name = identity.artefact_name();
        let image_tag = match &self.config.image_tag {
            Some(literal) => ImageTag::literal(literal)?,
            None => identity.image_tag(),
        };

        let invocation = ArtefactBuilder::new(self.executor, self.config).invocation(
            &request.staging_dir,
            &request.output_dir,
            &artefact_name,
            &image_tag,
        );

        Ok(BuildPlan {
            image_tag: image_tag.to_string(),
            architecture: identity.architecture().to_string(),
            staging_dir: request.staging_dir.clone(),
            output_dir: request.output_dir.clone(),
            descriptor_path: request.staging_dir.join(DESCRIPTOR_FILENAME),
            artefact_path: invocation.stdout_path(),
            command_line: invocation.command_line(),
            extra_files: request.project.extra_files.clone(),
            artefact_name,
            identity,
            invocation,
        })
    }

    /// Stage, render and build the artefact.
    ///
    /// On error the state becomes [`BuildState::Failed`] and the error is
    /// returned; a partially written artefact is not removed.
    ///
    /// # Errors
    ///
    /// Returns the first staging, rendering or build error encountered.
    pub fn package(&mut self, request: &PackageRequest) -> Result<PackageOutcome> {
        self.state = BuildState::Pending;
        let result = self.run(request);
        if result.is_err() {
            self.advance(BuildState::Failed);
        }
        result
    }

    fn run(&mut self, request: &PackageRequest) -> Result<PackageOutcome> {
        let plan = self.plan(request)?;

        let stager = Stager::new(request.staging_dir.clone());
        stager.prepare()?;
        stager.stage_install_dir(&request.project.install_dir)?;
        let staged_files = stager.stage_extra_files(&request.project.extra_files)?;
        self.advance(BuildState::Staged);

        let context = self.descriptor_context(request, &plan, &staged_files)?;
        let template = TemplateSource::from_option(self.config.template.as_deref());
        render_descriptor(template, &context, &request.staging_dir)?;
        self.advance(BuildState::DescriptorRendered);

        fs::create_dir_all(&request.output_dir)?;
        ArtefactBuilder::new(self.executor, self.config).build(plan.invocation())?;
        self.advance(BuildState::ArtefactBuilt);

        info!("artefact written to {}", plan.artefact_path);
        Ok(PackageOutcome { plan, staged_files })
    }

    fn descriptor_context(
        &self,
        request: &PackageRequest,
        plan: &BuildPlan,
        staged_files: &[Utf8PathBuf],
    ) -> Result<DescriptorContext> {
        let identity = plan.identity();
        let metadata = &self.config.metadata;
        Ok(DescriptorContext {
            package_name: identity.name().to_owned(),
            version: identity.version().to_owned(),
            iteration: identity.iteration().to_owned(),
            architecture: plan.architecture.clone(),
            install_dir: request.project.install_dir.clone(),
            install_root: relative_to_root(&request.project.install_dir)?,
            extra_files: staged_files.to_vec(),
            vendor: metadata.vendor().to_owned(),
            license: metadata.license().to_owned(),
            priority: metadata.priority().to_owned(),
            section: metadata.section().to_owned(),
            image_tag: plan.image_tag.clone(),
            artefact_name: plan.artefact_name.filename(),
        })
    }

    fn advance(&mut self, next: BuildState) {
        info!("packaging state: {} -> {next}", self.state);
        self.state = next;
    }
}
