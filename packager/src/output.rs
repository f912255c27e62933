//! Output formatting for the packager CLI.

use crate::error::{PackagerError, Result};
use crate::pipeline::{BuildPlan, PackageOutcome};
use std::fmt::Write as _;
use std::io::Write;

/// Format a build plan for dry-run output.
///
/// # Example
///
/// ```
/// use omnibus_docker_common::PlatformInfo;
/// use omnibus_docker_packager::config::PackagerConfig;
/// use omnibus_docker_packager::executor::SystemCommandExecutor;
/// use omnibus_docker_packager::output::dry_run_text;
/// use omnibus_docker_packager::pipeline::{PackageRequest, Packager};
/// use omnibus_docker_packager::project::ProjectDescriptor;
///
/// let request = PackageRequest {
///     project: ProjectDescriptor {
///         package_name: "myapp".to_owned(),
///         build_version: "1.2.3".to_owned(),
///         build_iteration: "1".to_owned(),
///         install_dir: "/opt/myapp".into(),
///         extra_files: Vec::new(),
///     },
///     platform: PlatformInfo::new("x86_64", "ubuntu"),
///     staging_dir: "/stage".into(),
///     output_dir: "/pkg".into(),
/// };
/// let config = PackagerConfig::default();
/// let plan = Packager::new(&config, &SystemCommandExecutor).plan(&request)?;
///
/// let text = dry_run_text(&plan);
/// assert!(text.contains("Dry run"));
/// assert!(text.contains("myapp_1.2.3-1_amd64.tar.gz"));
/// # Ok::<(), omnibus_docker_packager::error::PackagerError>(())
/// ```
#[must_use]
pub fn dry_run_text(plan: &BuildPlan) -> String {
    let mut text = String::from("Dry run - no files will be modified\n\n");
    let _ = writeln!(text, "Artefact: {}", plan.artefact_name);
    let _ = writeln!(text, "Architecture: {}", plan.architecture);
    let _ = writeln!(text, "Image tag: {}", plan.image_tag);
    let _ = writeln!(text, "Staging directory: {}", plan.staging_dir);
    let _ = writeln!(text, "Output directory: {}", plan.output_dir);
    let _ = writeln!(text, "Descriptor: {}", plan.descriptor_path);
    let _ = writeln!(text, "Command: {}", plan.command_line);

    if !plan.extra_files.is_empty() {
        text.push_str("\nExtra files:\n");
        for file in &plan.extra_files {
            let _ = writeln!(text, "  - {file}");
        }
    }
    text
}

/// Serialise a build plan as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PackagerError::Io`] if serialisation fails.
pub fn dry_run_json(plan: &BuildPlan) -> Result<String> {
    serde_json::to_string_pretty(plan).map_err(|e| PackagerError::Io(e.into()))
}

/// Format a success message after packaging.
#[must_use]
pub fn success_message(outcome: &PackageOutcome) -> String {
    format!("Packaged {}", outcome.artefact_path())
}

/// Write a line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort; nothing sensible to do if stderr is gone.
    }
}
