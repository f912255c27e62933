//! CLI argument definitions for the omnibus Docker packager.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary focused on orchestration.

use crate::config::{MetadataField, PackagerConfig};
use crate::error::Result;
use crate::platform::PlatformOverrides;
use crate::project::ProjectDescriptor;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Package an omnibus project install tree as a Docker image archive.
#[derive(Parser, Debug)]
#[command(name = "omnibus-docker")]
#[command(version, about)]
#[command(long_about = concat!(
    "Package an omnibus project install tree as a Docker image archive.\n\n",
    "The project's install directory and extra files are staged, a Dockerfile is ",
    "rendered into the staging directory, and the image tool is run under ",
    "fakeroot with its output written to <name>_<version>-<iteration>_<arch>.tar.gz ",
    "in the output directory.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build an artefact:\n",
    "    $ omnibus-docker build --project project.toml --output-dir pkg\n\n",
    "  Preview the build command as JSON:\n",
    "    $ omnibus-docker build --project project.toml --dry-run --json\n\n",
    "  Print the artefact filename for a Raspberry Pi host:\n",
    "    $ omnibus-docker name --project project.toml --machine armv6l --platform raspbian\n\n",
    "Set RUST_LOG to control log verbosity (default: info).",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output (errors and warnings still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Stage the project and build the artefact.
    Build(BuildArgs),

    /// Print the artefact filename without building.
    Name(ProjectArgs),
}

/// Arguments shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project descriptor (TOML).
    #[arg(short, long, value_name = "FILE")]
    pub project: Utf8PathBuf,

    /// Packager configuration (TOML).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Additional file to stage (can be repeated).
    #[arg(long = "extra-file", value_name = "FILE")]
    pub extra_files: Vec<Utf8PathBuf>,

    /// Override the detected kernel machine (e.g. armv6l).
    #[arg(long, value_name = "MACHINE")]
    pub machine: Option<String>,

    /// Override the detected platform name (e.g. raspbian).
    #[arg(long, value_name = "NAME")]
    pub platform: Option<String>,

    /// Package vendor.
    #[arg(long, value_name = "VENDOR")]
    pub vendor: Option<String>,

    /// Package license.
    #[arg(long, value_name = "LICENSE")]
    pub license: Option<String>,

    /// Package priority.
    #[arg(long, value_name = "PRIORITY")]
    pub priority: Option<String>,

    /// Package section.
    #[arg(long, value_name = "SECTION")]
    pub section: Option<String>,
}

/// Arguments for the build command.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Project, configuration and platform selection.
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Directory holding the build context.
    #[arg(long, value_name = "DIR", default_value = "staging")]
    pub staging_dir: Utf8PathBuf,

    /// Directory receiving the artefact.
    #[arg(short, long, value_name = "DIR", default_value = "pkg")]
    pub output_dir: Utf8PathBuf,

    /// Dockerfile template overriding the configured or bundled one.
    #[arg(long, value_name = "FILE")]
    pub template: Option<Utf8PathBuf>,

    /// Show the build plan and exit without building.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the dry-run plan as JSON.
    #[arg(long, requires = "dry_run")]
    pub json: bool,
}

impl Default for BuildArgs {
    /// Creates `BuildArgs` with the same defaults the parser applies.
    fn default() -> Self {
        Self {
            project: ProjectArgs::default(),
            staging_dir: Utf8PathBuf::from("staging"),
            output_dir: Utf8PathBuf::from("pkg"),
            template: None,
            dry_run: false,
            json: false,
        }
    }
}

impl ProjectArgs {
    /// Load the configuration file, if any, and apply metadata overrides.
    ///
    /// # Errors
    ///
    /// Returns any error from [`PackagerConfig::load`].
    ///
    /// # Examples
    ///
    /// ```
    /// use omnibus_docker_packager::cli::ProjectArgs;
    ///
    /// let args = ProjectArgs {
    ///     license: Some("MIT".to_owned()),
    ///     ..ProjectArgs::default()
    /// };
    /// let config = args.load_config()?;
    /// assert_eq!(config.metadata.license(), "MIT");
    /// assert_eq!(config.metadata.priority(), "extra");
    /// # Ok::<(), omnibus_docker_packager::error::PackagerError>(())
    /// ```
    pub fn load_config(&self) -> Result<PackagerConfig> {
        let mut config = match &self.config {
            Some(path) => PackagerConfig::load(path)?,
            None => PackagerConfig::default(),
        };

        let overrides = [
            (MetadataField::Vendor, &self.vendor),
            (MetadataField::License, &self.license),
            (MetadataField::Priority, &self.priority),
            (MetadataField::Section, &self.section),
        ];
        for (field, value) in overrides
            .into_iter()
            .filter_map(|(field, value)| value.as_deref().map(|value| (field, value)))
        {
            config.metadata.set_str(field, value);
        }
        Ok(config)
    }

    /// Load the project descriptor and append any `--extra-file` entries.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ProjectDescriptor::load`].
    pub fn load_project(&self) -> Result<ProjectDescriptor> {
        let mut project = ProjectDescriptor::load(&self.project)?;
        project.extra_files.extend(self.extra_files.iter().cloned());
        Ok(project)
    }

    /// Platform values supplied on the command line.
    #[must_use]
    pub fn platform_overrides(&self) -> PlatformOverrides {
        PlatformOverrides {
            machine: self.machine.clone(),
            platform: self.platform.clone(),
        }
    }
}

impl BuildArgs {
    /// Load configuration, letting `--template` win over the file.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ProjectArgs::load_config`].
    pub fn load_config(&self) -> Result<PackagerConfig> {
        let mut config = self.project.load_config()?;
        if let Some(template) = &self.template {
            config.template = Some(template.clone());
        }
        Ok(config)
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
